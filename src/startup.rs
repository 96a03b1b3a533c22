use crate::config::configuration::Settings;
use crate::db::PgPool;
use crate::errors::custom::CustomError;
use crate::middleware::jwt_auth_middleware;
use crate::routes::{
    admin::admin::{
        appoint_manager, create_restaurant, list_all_restaurants, list_users,
        set_restaurant_active, update_restaurant, update_role,
    },
    auth::auth::{login, logout, register},
    cart::cart::{add_item, clear_cart, remove_item, update_item, view_cart},
    delivery::delivery::{
        assign_delivery, list_my_deliveries, set_availability as set_driver_availability,
        update_delivery_status,
    },
    health_check::health_check,
    menu::menu::{create_menu_item, list_menu, set_availability, update_menu_item},
    order::order::{
        get_order, list_my_orders, list_restaurant_orders, place_order, update_order_status,
    },
    reservation::reservation::{
        create_reservation, list_my_reservations, list_restaurant_reservations,
        update_reservation_status,
    },
    restaurant::restaurant::{browse_menu, get_restaurant, list_restaurants},
    staff::staff::{hire_staff, list_staff, update_employment_status},
    table::table::{create_table, list_tables, update_table_state},
    users::users::{update_profile, view_profile},
};
use actix_session::storage::RedisSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{dev::Server, web, App, HttpServer};
use actix_web_lab::middleware::from_fn;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

/******************************************/
// Initializing Redis connection
/******************************************/
pub async fn init_redis(redis_uri: &str) -> Result<RedisSessionStore, std::io::Error> {
    RedisSessionStore::new(redis_uri).await.map_err(|e| {
        tracing::error!(error = ?e, "Failed to create Redis session store");
        std::io::Error::new(std::io::ErrorKind::Other, "Redis connection failed")
    })
}

/**************************************************************/
// Application State re reuse the same code in main and tests
/***************************************************************/
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Port 0 binds a random free port, which `port()` then reports.
    pub async fn build(settings: Settings, pool: PgPool) -> Result<Self, std::io::Error> {
        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let actual_port = listener.local_addr()?.port();

        let server = run_server(listener, pool, settings).await?;
        Ok(Self {
            port: actual_port,
            server,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/******************************************/
// Running Server
/******************************************/
pub async fn run_server(
    listener: TcpListener,
    pool: PgPool,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let redis_store = init_redis(&settings.redis.uri).await?;
    let secret_key = Key::generate();
    let secure_cookies = settings.application.secure_cookies;
    let pool = web::Data::new(pool);
    let jwt = web::Data::new(settings.jwt);
    let pricing = web::Data::new(settings.pricing);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(redis_store.clone(), secret_key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .wrap(TracingLogger::default())
            .app_data(pool.clone())
            .app_data(jwt.clone())
            .app_data(pricing.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                CustomError::ValidationError(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                CustomError::ValidationError(err.to_string()).into()
            }))
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/restaurants", web::get().to(list_restaurants))
            .route("/restaurants/{id}", web::get().to(get_restaurant))
            .route("/restaurants/{id}/menu", web::get().to(browse_menu))
            .service(
                web::scope("/api")
                    .wrap(from_fn(jwt_auth_middleware))
                    .route("/auth/logout", web::post().to(logout))
                    .route("/profile", web::get().to(view_profile))
                    .route("/profile", web::put().to(update_profile))
                    // cart
                    .route("/cart", web::get().to(view_cart))
                    .route("/cart", web::delete().to(clear_cart))
                    .route("/cart/items", web::post().to(add_item))
                    .route("/cart/items/{id}", web::put().to(update_item))
                    .route("/cart/items/{id}", web::delete().to(remove_item))
                    // orders
                    .route("/orders", web::post().to(place_order))
                    .route("/orders", web::get().to(list_my_orders))
                    .route("/orders/{id}", web::get().to(get_order))
                    .route("/orders/{id}/status", web::put().to(update_order_status))
                    // restaurant back office
                    .route("/restaurants/{id}/menu", web::get().to(list_menu))
                    .route("/restaurants/{id}/menu", web::post().to(create_menu_item))
                    .route("/restaurants/{id}/orders", web::get().to(list_restaurant_orders))
                    .route("/restaurants/{id}/tables", web::get().to(list_tables))
                    .route("/restaurants/{id}/tables", web::post().to(create_table))
                    .route(
                        "/restaurants/{id}/reservations",
                        web::get().to(list_restaurant_reservations),
                    )
                    .route("/restaurants/{id}/staff", web::get().to(list_staff))
                    .route("/restaurants/{id}/staff", web::post().to(hire_staff))
                    .route("/menu/{id}", web::put().to(update_menu_item))
                    .route("/menu/{id}/availability", web::put().to(set_availability))
                    .route("/tables/{id}/state", web::put().to(update_table_state))
                    .route("/staff/{id}/status", web::put().to(update_employment_status))
                    // reservations
                    .route("/reservations", web::post().to(create_reservation))
                    .route("/reservations", web::get().to(list_my_reservations))
                    .route(
                        "/reservations/{id}/status",
                        web::put().to(update_reservation_status),
                    )
                    // deliveries
                    .route("/deliveries", web::post().to(assign_delivery))
                    .route("/deliveries", web::get().to(list_my_deliveries))
                    .route(
                        "/deliveries/availability",
                        web::put().to(set_driver_availability),
                    )
                    .route(
                        "/deliveries/{id}/status",
                        web::put().to(update_delivery_status),
                    )
                    // admin
                    .route("/admin/users", web::get().to(list_users))
                    .route("/admin/users/{id}/role", web::put().to(update_role))
                    .route("/admin/restaurants", web::get().to(list_all_restaurants))
                    .route("/admin/restaurants", web::post().to(create_restaurant))
                    .route("/admin/restaurants/{id}", web::put().to(update_restaurant))
                    .route(
                        "/admin/restaurants/{id}/active",
                        web::put().to(set_restaurant_active),
                    )
                    .route(
                        "/admin/restaurants/{id}/managers",
                        web::post().to(appoint_manager),
                    ),
            )
    })
    .listen(listener)?
    .run();
    Ok(server)
}
