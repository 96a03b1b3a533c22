use crate::helper::spawn_app;
use serde_json::{json, Value};

#[tokio::test]
async fn admin_manages_restaurants_and_others_cannot() {
    let app = spawn_app().await;
    let token = app.login(&app.admin).await;

    let created = app
        .post(
            &app.admin,
            &token,
            "/api/admin/restaurants",
            json!({"name": "Le Boukarou", "town_city": "Yaounde", "phone": "+237 222 000 111"}),
        )
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let new_id = created["restaurant"]["id"].as_str().unwrap().to_string();

    let all: Value = app
        .get(&app.admin, &token, "/api/admin/restaurants")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all["restaurants"].as_array().unwrap().len(), 2);

    let manager_token = app.login(&app.manager).await;
    let forbidden = app
        .get(&app.manager, &manager_token, "/api/admin/restaurants")
        .await;
    assert_eq!(forbidden.status().as_u16(), 403);

    let renamed = app
        .put(
            &app.admin,
            &token,
            &format!("/api/admin/restaurants/{}", new_id),
            json!({"name": "Le Boukarou II"}),
        )
        .await;
    assert_eq!(renamed.status().as_u16(), 200);
    let renamed: Value = renamed.json().await.unwrap();
    assert_eq!(renamed["restaurant"]["name"], "Le Boukarou II");
    app.cleanup().await;
}

#[tokio::test]
async fn deactivated_restaurant_disappears_from_public_listing() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let public: Value = client
        .get(app.url("/restaurants"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["restaurants"].as_array().unwrap().len(), 1);

    let token = app.login(&app.admin).await;
    let toggled = app
        .put(
            &app.admin,
            &token,
            &format!("/api/admin/restaurants/{}/active", app.restaurant_id),
            json!({"is_active": false}),
        )
        .await;
    assert_eq!(toggled.status().as_u16(), 200);

    let public: Value = client
        .get(app.url("/restaurants"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(public["restaurants"].as_array().unwrap().is_empty());
    let menu = client
        .get(app.url(&format!("/restaurants/{}/menu", app.restaurant_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(menu.status().as_u16(), 404);
    app.cleanup().await;
}

#[tokio::test]
async fn appointing_a_manager_promotes_the_user_once() {
    let app = spawn_app().await;
    let token = app.login(&app.admin).await;
    let path = format!("/api/admin/restaurants/{}/managers", app.restaurant_id);

    let appointed = app
        .post(&app.admin, &token, &path, json!({"user_id": app.customer.id}))
        .await;
    assert_eq!(appointed.status().as_u16(), 201);
    let body: Value = appointed.json().await.unwrap();
    assert_eq!(body["employment"]["staff_role"], "MANAGER");
    assert_eq!(body["employment"]["status"], "ACTIVE");

    let again = app
        .post(&app.admin, &token, &path, json!({"user_id": app.customer.id}))
        .await;
    assert_eq!(again.status().as_u16(), 409);

    let users: Value = app
        .get(&app.admin, &token, "/api/admin/users")
        .await
        .json()
        .await
        .unwrap();
    let promoted = users["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == app.customer.id.to_string().as_str())
        .unwrap();
    assert_eq!(promoted["role"], "MANAGER");
    app.cleanup().await;
}

#[tokio::test]
async fn admin_cannot_demote_themselves() {
    let app = spawn_app().await;
    let token = app.login(&app.admin).await;
    let response = app
        .put(
            &app.admin,
            &token,
            &format!("/api/admin/users/{}/role", app.admin.id),
            json!({"role": "CUSTOMER"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let promote = app
        .put(
            &app.admin,
            &token,
            &format!("/api/admin/users/{}/role", app.kitchen.id),
            json!({"role": "MANAGER"}),
        )
        .await;
    assert_eq!(promote.status().as_u16(), 200);
    app.cleanup().await;
}

#[tokio::test]
async fn appointed_manager_acts_with_the_token_they_already_hold() {
    let app = spawn_app().await;
    let customer_token = app.login(&app.customer).await;
    let tables = format!("/api/restaurants/{}/tables", app.restaurant_id);
    let before = app.get(&app.customer, &customer_token, &tables).await;
    assert_eq!(before.status().as_u16(), 403);

    let admin_token = app.login(&app.admin).await;
    let appointed = app
        .post(
            &app.admin,
            &admin_token,
            &format!("/api/admin/restaurants/{}/managers", app.restaurant_id),
            json!({"user_id": app.customer.id}),
        )
        .await;
    assert_eq!(appointed.status().as_u16(), 201);

    let after = app.get(&app.customer, &customer_token, &tables).await;
    assert_eq!(after.status().as_u16(), 200);
    let created = app
        .post(
            &app.customer,
            &customer_token,
            &tables,
            json!({"table_number": "T9", "capacity": 2}),
        )
        .await;
    assert_eq!(created.status().as_u16(), 201);
    app.cleanup().await;
}

#[tokio::test]
async fn demotion_revokes_admin_rights_immediately() {
    let app = spawn_app().await;
    let admin_token = app.login(&app.admin).await;
    let kitchen_token = app.login(&app.kitchen).await;
    let role_path = format!("/api/admin/users/{}/role", app.kitchen.id);

    let promoted = app
        .put(&app.admin, &admin_token, &role_path, json!({"role": "ADMIN"}))
        .await;
    assert_eq!(promoted.status().as_u16(), 200);
    let as_admin = app
        .get(&app.kitchen, &kitchen_token, "/api/admin/users")
        .await;
    assert_eq!(as_admin.status().as_u16(), 200);

    let demoted = app
        .put(&app.admin, &admin_token, &role_path, json!({"role": "STAFF"}))
        .await;
    assert_eq!(demoted.status().as_u16(), 200);
    let as_staff = app
        .get(&app.kitchen, &kitchen_token, "/api/admin/users")
        .await;
    assert_eq!(as_staff.status().as_u16(), 403);
    app.cleanup().await;
}
