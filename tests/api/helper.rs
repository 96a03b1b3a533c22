use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use dotenv::dotenv;
use once_cell::sync::Lazy;
use reqwest::Response;
use serde_json::Value;
use servesoft::config::configuration::Settings;
use servesoft::db::{build_pool, create_database, run_migrations, PgPool};
use servesoft::db_models::{NewMenuItem, NewRestaurant};
use servesoft::domain::{EmploymentStatus, Role, StaffRole, TableState};
use servesoft::routes::auth::auth::{insert_user, ValidRegistration};
use servesoft::schema::{dining_tables, employment_records, menu_items, restaurants};
use servesoft::startup::Application;
use servesoft::telemetry::{get_subscriber, init_subscriber};
use servesoft::validations::credentials::Password;
use servesoft::validations::name_email::{PersonName, PhoneNumber, UserEmail};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    dotenv().ok();
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // The sink is part of the subscriber type, so each branch builds its own.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub const JOLLOF_PRICE: i64 = 2500;
pub const PLANTAIN_PRICE: i64 = 1000;

/// A seeded account with its own cookie jar, so every user keeps a separate session.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub api_client: reqwest::Client,
}

impl TestUser {
    async fn store(conn: &mut diesel_async::AsyncPgConnection, name: &str, role: Role) -> Self {
        let email = format!(
            "{}-{}@servesoft.test",
            name.to_lowercase(),
            Uuid::new_v4().simple()
        );
        let password = Uuid::new_v4().to_string();
        let registration = ValidRegistration {
            name: PersonName::parse(name.to_string()).unwrap(),
            email: UserEmail::parse(email.clone()).unwrap(),
            password: Password::parse(password.clone()).unwrap(),
            phone: Some(PhoneNumber::parse("+237 670000000".to_string()).unwrap()),
        };
        let profile = insert_user(conn, registration, role)
            .await
            .expect("Failed to seed user");
        Self {
            id: profile.id,
            email,
            password,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .unwrap(),
        }
    }
}

pub struct TestApp {
    pub port: u16,
    pub address: String,
    pub db_pool: PgPool,
    pub database_name: String,
    pub maintenance_url: String,
    pub restaurant_id: Uuid,
    pub table_id: Uuid,
    pub jollof_id: Uuid,
    pub plantain_id: Uuid,
    pub admin: TestUser,
    pub manager: TestUser,
    pub kitchen: TestUser,
    pub driver: TestUser,
    pub customer: TestUser,
}

pub async fn spawn_app() -> TestApp {
    // To Ensure that the tracing stack is only initialized once
    Lazy::force(&TRACING);

    let mut settings = Settings::new().expect("Failed to load configuration");
    let database_name = Uuid::new_v4().to_string();
    let maintenance_url = settings.database.test_url.clone();
    create_database(&maintenance_url, &database_name).await;
    let database_url = format!("{}/{}", maintenance_url, database_name);
    run_migrations(&database_url)
        .await
        .expect("Could not run migrations");

    settings.database.url = database_url.clone();
    settings.application.port = 0;
    settings.application.secure_cookies = false;
    let pool = build_pool(&database_url, 8, settings.database.acquire_timeout_secs);

    let application = Application::build(settings, pool.clone())
        .await
        .expect("Failed to build application");
    let port = application.port();
    let address = format!("http://127.0.0.1:{}", port);
    let _ = tokio::spawn(application.run_until_stopped());

    let mut conn = pool.get().await.expect("Failed to get db connection");
    let restaurant_id = Uuid::new_v4();
    diesel::insert_into(restaurants::table)
        .values(&NewRestaurant {
            id: restaurant_id,
            name: "Chez Mama",
            description: Some("Home cooking"),
            phone: None,
            address: Some("Rue de la Joie"),
            town_city: Some("Douala"),
            is_active: true,
        })
        .execute(&mut conn)
        .await
        .expect("Failed to seed restaurant");

    let jollof_id = Uuid::new_v4();
    let plantain_id = Uuid::new_v4();
    for (id, name, price) in [
        (jollof_id, "Jollof Rice", JOLLOF_PRICE),
        (plantain_id, "Fried Plantain", PLANTAIN_PRICE),
    ] {
        diesel::insert_into(menu_items::table)
            .values(&NewMenuItem {
                id,
                restaurant_id,
                name,
                description: None,
                price,
                image_url: None,
                is_available: true,
            })
            .execute(&mut conn)
            .await
            .expect("Failed to seed menu");
    }

    let table_id = Uuid::new_v4();
    diesel::insert_into(dining_tables::table)
        .values((
            dining_tables::id.eq(table_id),
            dining_tables::restaurant_id.eq(restaurant_id),
            dining_tables::table_number.eq("T1"),
            dining_tables::capacity.eq(4),
            dining_tables::state.eq(TableState::Free),
        ))
        .execute(&mut conn)
        .await
        .expect("Failed to seed table");

    let admin = TestUser::store(&mut conn, "Admin", Role::Admin).await;
    let manager = TestUser::store(&mut conn, "Manager", Role::Manager).await;
    let kitchen = TestUser::store(&mut conn, "Kitchen", Role::Staff).await;
    let driver = TestUser::store(&mut conn, "Driver", Role::Staff).await;
    let customer = TestUser::store(&mut conn, "Customer", Role::Customer).await;
    for (user_id, staff_role) in [
        (manager.id, StaffRole::Manager),
        (kitchen.id, StaffRole::Kitchen),
        (driver.id, StaffRole::Driver),
    ] {
        diesel::insert_into(employment_records::table)
            .values((
                employment_records::id.eq(Uuid::new_v4()),
                employment_records::user_id.eq(user_id),
                employment_records::restaurant_id.eq(restaurant_id),
                employment_records::staff_role.eq(staff_role),
                employment_records::status.eq(EmploymentStatus::Active),
            ))
            .execute(&mut conn)
            .await
            .expect("Failed to seed employment");
    }
    drop(conn);

    TestApp {
        port,
        address,
        db_pool: pool,
        database_name,
        maintenance_url,
        restaurant_id,
        table_id,
        jollof_id,
        plantain_id,
        admin,
        manager,
        kitchen,
        driver,
        customer,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Logs `user` in on their own client and returns the bearer token.
    pub async fn login(&self, user: &TestUser) -> String {
        let response = user
            .api_client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "email": user.email,
                "password": user.password,
            }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"]
            .as_str()
            .expect("Token not found")
            .to_string()
    }

    pub async fn get(&self, user: &TestUser, token: &str, path: &str) -> Response {
        user.api_client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post(&self, user: &TestUser, token: &str, path: &str, body: Value) -> Response {
        user.api_client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put(&self, user: &TestUser, token: &str, path: &str, body: Value) -> Response {
        user.api_client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete(&self, user: &TestUser, token: &str, path: &str) -> Response {
        user.api_client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Fills the customer's cart and places an order of `order_type`.
    pub async fn place_order(&self, token: &str, order_type: &str) -> Value {
        let added = self
            .post(
                &self.customer,
                token,
                "/api/cart/items",
                serde_json::json!({"menu_item_id": self.jollof_id, "quantity": 2}),
            )
            .await;
        assert_eq!(added.status().as_u16(), 200);
        let added = self
            .post(
                &self.customer,
                token,
                "/api/cart/items",
                serde_json::json!({"menu_item_id": self.plantain_id, "quantity": 1}),
            )
            .await;
        assert_eq!(added.status().as_u16(), 200);

        let body = match order_type {
            "TABLE" => serde_json::json!({"order_type": "TABLE", "table_id": self.table_id}),
            "DELIVERY" => serde_json::json!({
                "order_type": "DELIVERY",
                "delivery_address": "12 Avenue Kennedy, Yaounde",
            }),
            other => serde_json::json!({"order_type": other}),
        };
        let response = self.post(&self.customer, token, "/api/orders", body).await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    /// Seeds another active restaurant with one dish and returns `(restaurant_id, dish_id)`.
    pub async fn seed_second_restaurant(&self) -> (Uuid, Uuid) {
        let mut conn = self.db_pool.get().await.expect("Failed to get db connection");
        let restaurant_id = Uuid::new_v4();
        diesel::insert_into(restaurants::table)
            .values(&NewRestaurant {
                id: restaurant_id,
                name: "Grill du Port",
                description: None,
                phone: None,
                address: None,
                town_city: Some("Limbe"),
                is_active: true,
            })
            .execute(&mut conn)
            .await
            .expect("Failed to seed restaurant");
        let dish_id = Uuid::new_v4();
        diesel::insert_into(menu_items::table)
            .values(&NewMenuItem {
                id: dish_id,
                restaurant_id,
                name: "Grilled Fish",
                description: None,
                price: 4000,
                image_url: None,
                is_available: true,
            })
            .execute(&mut conn)
            .await
            .expect("Failed to seed menu");
        (restaurant_id, dish_id)
    }

    pub async fn cleanup(self) {
        self.db_pool.close();
        servesoft::db::drop_database(&self.maintenance_url, &self.database_name).await;
    }
}
