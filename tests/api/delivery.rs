use crate::helper::{spawn_app, TestApp};
use serde_json::{json, Value};

async fn ready_delivery_order(app: &TestApp, customer_token: &str) -> String {
    let placed = app.place_order(customer_token, "DELIVERY").await;
    let order_id = placed["order"]["id"].as_str().unwrap().to_string();
    let kitchen_token = app.login(&app.kitchen).await;
    for next in ["IN_PREP", "READY"] {
        let response = app
            .put(
                &app.kitchen,
                &kitchen_token,
                &format!("/api/orders/{}/status", order_id),
                json!({"status": next}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }
    order_id
}

async fn order_status(app: &TestApp, customer_token: &str, order_id: &str) -> Value {
    let body: Value = app
        .get(&app.customer, customer_token, &format!("/api/orders/{}", order_id))
        .await
        .json()
        .await
        .unwrap();
    body["order"]["status"].clone()
}

#[tokio::test]
async fn driver_progress_is_mirrored_onto_the_order() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let order_id = ready_delivery_order(&app, &customer_token).await;

    let manager_token = app.login(&app.manager).await;
    let assigned = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": order_id, "driver_id": app.driver.id}),
        )
        .await;
    assert_eq!(assigned.status().as_u16(), 201);
    let assigned: Value = assigned.json().await.unwrap();
    assert_eq!(assigned["assignment"]["status"], "PENDING");
    let path = format!(
        "/api/deliveries/{}/status",
        assigned["assignment"]["id"].as_str().unwrap()
    );

    let second = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": order_id, "driver_id": app.driver.id}),
        )
        .await;
    assert_eq!(second.status().as_u16(), 409);

    let driver_token = app.login(&app.driver).await;
    let jobs: Value = app
        .get(&app.driver, &driver_token, "/api/deliveries")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(jobs["deliveries"][0]["order_id"], order_id.as_str());
    assert!(jobs["deliveries"][0]["order_code"]
        .as_str()
        .unwrap()
        .starts_with("ORD-"));
    assert_eq!(jobs["deliveries"][0]["delivery_address"], "12 Avenue Kennedy, Yaounde");

    for next in ["ACCEPTED", "PICKED_UP"] {
        let response = app
            .put(&app.driver, &driver_token, &path, json!({"status": next}))
            .await;
        assert_eq!(response.status().as_u16(), 200, "moving to {}", next);
    }
    assert_eq!(order_status(&app, &customer_token, &order_id).await, "READY");

    let dispatched = app
        .put(&app.driver, &driver_token, &path, json!({"status": "OUT_FOR_DELIVERY"}))
        .await;
    assert_eq!(dispatched.status().as_u16(), 200);
    assert_eq!(
        order_status(&app, &customer_token, &order_id).await,
        "OUT_FOR_DELIVERY"
    );

    let delivered = app
        .put(&app.driver, &driver_token, &path, json!({"status": "DELIVERED"}))
        .await;
    assert_eq!(delivered.status().as_u16(), 200);
    let body: Value = delivered.json().await.unwrap();
    assert!(body["assignment"]["accepted_at"].is_string());
    assert!(body["assignment"]["picked_up_at"].is_string());
    assert!(body["assignment"]["delivered_at"].is_string());
    assert_eq!(order_status(&app, &customer_token, &order_id).await, "DELIVERED");
    app.cleanup().await;
}

#[tokio::test]
async fn dispatching_before_the_kitchen_is_done_rolls_back() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let placed = app.place_order(&customer_token, "DELIVERY").await;
    let order_id = placed["order"]["id"].as_str().unwrap().to_string();

    let manager_token = app.login(&app.manager).await;
    let assigned: Value = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": order_id, "driver_id": app.driver.id}),
        )
        .await
        .json()
        .await
        .unwrap();
    let path = format!(
        "/api/deliveries/{}/status",
        assigned["assignment"]["id"].as_str().unwrap()
    );

    let driver_token = app.login(&app.driver).await;
    for next in ["ACCEPTED", "PICKED_UP"] {
        app.put(&app.driver, &driver_token, &path, json!({"status": next}))
            .await;
    }
    let early = app
        .put(&app.driver, &driver_token, &path, json!({"status": "OUT_FOR_DELIVERY"}))
        .await;
    assert_eq!(early.status().as_u16(), 409);

    let jobs: Value = app
        .get(&app.driver, &driver_token, "/api/deliveries")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(jobs["deliveries"][0]["status"], "PICKED_UP");
    assert_eq!(order_status(&app, &customer_token, &order_id).await, "RECEIVED");
    app.cleanup().await;
}

#[tokio::test]
async fn assignment_rules_are_enforced() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let manager_token = app.login(&app.manager).await;

    let pickup = app.place_order(&customer_token, "PREORDER").await;
    let not_delivery = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": pickup["order"]["id"], "driver_id": app.driver.id}),
        )
        .await;
    assert_eq!(not_delivery.status().as_u16(), 400);

    let delivery = app.place_order(&customer_token, "DELIVERY").await;
    let not_a_driver = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": delivery["order"]["id"], "driver_id": app.kitchen.id}),
        )
        .await;
    assert_eq!(not_a_driver.status().as_u16(), 400);

    let kitchen_token = app.login(&app.kitchen).await;
    let kitchen_assigns = app
        .post(
            &app.kitchen,
            &kitchen_token,
            "/api/deliveries",
            json!({"order_id": delivery["order"]["id"], "driver_id": app.driver.id}),
        )
        .await;
    assert_eq!(kitchen_assigns.status().as_u16(), 403);

    let assigned: Value = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": delivery["order"]["id"], "driver_id": app.driver.id}),
        )
        .await
        .json()
        .await
        .unwrap();
    let hijack = app
        .put(
            &app.kitchen,
            &kitchen_token,
            &format!(
                "/api/deliveries/{}/status",
                assigned["assignment"]["id"].as_str().unwrap()
            ),
            json!({"status": "ACCEPTED"}),
        )
        .await;
    assert_eq!(hijack.status().as_u16(), 403);
    app.cleanup().await;
}

#[tokio::test]
async fn declined_assignment_frees_the_order_for_another_driver() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let order_id = ready_delivery_order(&app, &customer_token).await;
    let manager_token = app.login(&app.manager).await;
    let body = json!({"order_id": order_id, "driver_id": app.driver.id});

    let assigned: Value = app
        .post(&app.manager, &manager_token, "/api/deliveries", body.clone())
        .await
        .json()
        .await
        .unwrap();
    let driver_token = app.login(&app.driver).await;
    let declined = app
        .put(
            &app.driver,
            &driver_token,
            &format!(
                "/api/deliveries/{}/status",
                assigned["assignment"]["id"].as_str().unwrap()
            ),
            json!({"status": "DECLINED"}),
        )
        .await;
    assert_eq!(declined.status().as_u16(), 200);

    let reassigned = app
        .post(&app.manager, &manager_token, "/api/deliveries", body)
        .await;
    assert_eq!(reassigned.status().as_u16(), 201);
    app.cleanup().await;
}

#[tokio::test]
async fn only_drivers_toggle_availability() {
    let app = spawn_app().await;
    let driver_token = app.login(&app.driver).await;
    let response = app
        .put(
            &app.driver,
            &driver_token,
            "/api/deliveries/availability",
            json!({"is_available": false}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["is_available"], false);

    let kitchen_token = app.login(&app.kitchen).await;
    let kitchen = app
        .put(
            &app.kitchen,
            &kitchen_token,
            "/api/deliveries/availability",
            json!({"is_available": false}),
        )
        .await;
    assert_eq!(kitchen.status().as_u16(), 403);
    app.cleanup().await;
}

#[tokio::test]
async fn floor_staff_cannot_report_progress_that_belongs_to_the_driver() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let order_id = ready_delivery_order(&app, &customer_token).await;
    let manager_token = app.login(&app.manager).await;
    let assigned: Value = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": order_id, "driver_id": app.driver.id}),
        )
        .await
        .json()
        .await
        .unwrap();
    let delivery_path = format!(
        "/api/deliveries/{}/status",
        assigned["assignment"]["id"].as_str().unwrap()
    );
    let order_path = format!("/api/orders/{}/status", order_id);

    let dispatched_by_manager = app
        .put(&app.manager, &manager_token, &order_path, json!({"status": "OUT_FOR_DELIVERY"}))
        .await;
    assert_eq!(dispatched_by_manager.status().as_u16(), 409);

    let driver_token = app.login(&app.driver).await;
    for next in ["ACCEPTED", "PICKED_UP", "OUT_FOR_DELIVERY"] {
        let response = app
            .put(&app.driver, &driver_token, &delivery_path, json!({"status": next}))
            .await;
        assert_eq!(response.status().as_u16(), 200, "moving to {}", next);
    }
    let delivered_by_manager = app
        .put(&app.manager, &manager_token, &order_path, json!({"status": "DELIVERED"}))
        .await;
    assert_eq!(delivered_by_manager.status().as_u16(), 409);

    let delivered = app
        .put(&app.driver, &driver_token, &delivery_path, json!({"status": "DELIVERED"}))
        .await;
    assert_eq!(delivered.status().as_u16(), 200);
    assert_eq!(order_status(&app, &customer_token, &order_id).await, "DELIVERED");
    app.cleanup().await;
}

#[tokio::test]
async fn cancelling_an_order_withdraws_its_assignment() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let placed = app.place_order(&customer_token, "DELIVERY").await;
    let order_id = placed["order"]["id"].as_str().unwrap().to_string();
    let manager_token = app.login(&app.manager).await;
    let assigned: Value = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": order_id, "driver_id": app.driver.id}),
        )
        .await
        .json()
        .await
        .unwrap();

    let cancelled = app
        .put(
            &app.customer,
            &customer_token,
            &format!("/api/orders/{}/status", order_id),
            json!({"status": "CANCELLED"}),
        )
        .await;
    assert_eq!(cancelled.status().as_u16(), 200);

    let driver_token = app.login(&app.driver).await;
    let jobs: Value = app
        .get(&app.driver, &driver_token, "/api/deliveries")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(jobs["deliveries"][0]["status"], "CANCELLED");

    let accepted = app
        .put(
            &app.driver,
            &driver_token,
            &format!(
                "/api/deliveries/{}/status",
                assigned["assignment"]["id"].as_str().unwrap()
            ),
            json!({"status": "ACCEPTED"}),
        )
        .await;
    assert_eq!(accepted.status().as_u16(), 409);

    let reassigned = app
        .post(
            &app.manager,
            &manager_token,
            "/api/deliveries",
            json!({"order_id": order_id, "driver_id": app.driver.id}),
        )
        .await;
    assert_eq!(reassigned.status().as_u16(), 409);
    app.cleanup().await;
}
