use crate::helper::spawn_app;
use serde_json::{json, Value};

#[tokio::test]
async fn manager_hires_staff_who_can_then_log_in() {
    let app = spawn_app().await;
    let token = app.login(&app.manager).await;
    let path = format!("/api/restaurants/{}/staff", app.restaurant_id);
    let body = json!({
        "name": "Ekane Server",
        "email": "ekane@servesoft.test",
        "password": "serve-the-tables",
        "staff_role": "SERVER",
    });

    let hired = app.post(&app.manager, &token, &path, body.clone()).await;
    assert_eq!(hired.status().as_u16(), 201);
    let hired: Value = hired.json().await.unwrap();
    assert_eq!(hired["staff"]["user"]["role"], "STAFF");
    assert_eq!(hired["staff"]["employment"]["staff_role"], "SERVER");

    let duplicate = app.post(&app.manager, &token, &path, body).await;
    assert_eq!(duplicate.status().as_u16(), 409);

    let roster: Value = app
        .get(&app.manager, &token, &path)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(roster["staff"].as_array().unwrap().len(), 4);

    let client = reqwest::Client::new();
    let login = client
        .post(app.url("/auth/login"))
        .json(&json!({"email": "ekane@servesoft.test", "password": "serve-the-tables"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);
    app.cleanup().await;
}

#[tokio::test]
async fn managers_are_not_hired_through_the_staff_route() {
    let app = spawn_app().await;
    let token = app.login(&app.manager).await;
    let response = app
        .post(
            &app.manager,
            &token,
            &format!("/api/restaurants/{}/staff", app.restaurant_id),
            json!({
                "name": "Would Be Boss",
                "email": "boss@servesoft.test",
                "password": "ambitious-one",
                "staff_role": "MANAGER",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
    app.cleanup().await;
}

#[tokio::test]
async fn deactivated_staff_lose_restaurant_access() {
    let app = spawn_app().await;
    let manager_token = app.login(&app.manager).await;
    let kitchen_token = app.login(&app.kitchen).await;
    let tables = format!("/api/restaurants/{}/tables", app.restaurant_id);
    assert_eq!(
        app.get(&app.kitchen, &kitchen_token, &tables)
            .await
            .status()
            .as_u16(),
        200
    );

    let roster: Value = app
        .get(
            &app.manager,
            &manager_token,
            &format!("/api/restaurants/{}/staff", app.restaurant_id),
        )
        .await
        .json()
        .await
        .unwrap();
    let employment_id = roster["staff"]
        .as_array()
        .unwrap()
        .iter()
        .find(|member| member["user"]["id"] == app.kitchen.id.to_string().as_str())
        .map(|member| member["employment"]["id"].as_str().unwrap().to_string())
        .unwrap();

    let deactivated = app
        .put(
            &app.manager,
            &manager_token,
            &format!("/api/staff/{}/status", employment_id),
            json!({"status": "INACTIVE"}),
        )
        .await;
    assert_eq!(deactivated.status().as_u16(), 200);

    assert_eq!(
        app.get(&app.kitchen, &kitchen_token, &tables)
            .await
            .status()
            .as_u16(),
        403
    );

    let toggled_back = app
        .put(
            &app.manager,
            &manager_token,
            &format!("/api/staff/{}/status", employment_id),
            json!({}),
        )
        .await;
    let body: Value = toggled_back.json().await.unwrap();
    assert_eq!(body["employment"]["status"], "ACTIVE");
    app.cleanup().await;
}

#[tokio::test]
async fn manager_curates_the_menu_customers_see() {
    let app = spawn_app().await;
    let token = app.login(&app.manager).await;

    let created = app
        .post(
            &app.manager,
            &token,
            &format!("/api/restaurants/{}/menu", app.restaurant_id),
            json!({"name": "Ndole", "description": "Bitterleaf stew", "price": 3500}),
        )
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let ndole_id = created["item"]["id"].as_str().unwrap().to_string();

    let negative = app
        .post(
            &app.manager,
            &token,
            &format!("/api/restaurants/{}/menu", app.restaurant_id),
            json!({"name": "Free money", "price": -1}),
        )
        .await;
    assert_eq!(negative.status().as_u16(), 400);

    let hidden = app
        .put(
            &app.manager,
            &token,
            &format!("/api/menu/{}/availability", app.jollof_id),
            json!({"is_available": false}),
        )
        .await;
    assert_eq!(hidden.status().as_u16(), 200);

    let public: Value = reqwest::Client::new()
        .get(app.url(&format!("/restaurants/{}/menu", app.restaurant_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = public["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Fried Plantain", "Ndole"]);

    let staff_view: Value = app
        .get(
            &app.manager,
            &token,
            &format!("/api/restaurants/{}/menu", app.restaurant_id),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(staff_view["items"].as_array().unwrap().len(), 3);

    let repriced = app
        .put(
            &app.manager,
            &token,
            &format!("/api/menu/{}", ndole_id),
            json!({"name": "Ndole", "price": 4000}),
        )
        .await;
    let repriced: Value = repriced.json().await.unwrap();
    assert_eq!(repriced["item"]["price"], 4000);
    app.cleanup().await;
}
