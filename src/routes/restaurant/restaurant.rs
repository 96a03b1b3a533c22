use crate::db::PgPool;
use crate::db_models::{MenuItem, Restaurant};
use crate::errors::custom::CustomError;
use crate::schema::{menu_items, restaurants};
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

/// Customers only ever see restaurants that are switched on.
pub async fn find_active_restaurant(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
) -> Result<Restaurant, CustomError> {
    restaurants::table
        .find(restaurant_id)
        .filter(restaurants::is_active.eq(true))
        .select(Restaurant::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Restaurant not found".to_string()))
}

/******************************************/
// Listing Active Restaurants
/******************************************/
/**
 * @route   GET /restaurants
 * @access  Public
 */
#[instrument(name = "List active restaurants", skip(pool))]
pub async fn list_restaurants(pool: web::Data<PgPool>) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let rows = restaurants::table
        .filter(restaurants::is_active.eq(true))
        .order(restaurants::name.asc())
        .select(Restaurant::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "restaurants": rows})))
}

/******************************************/
// Viewing One Restaurant
/******************************************/
/**
 * @route   GET /restaurants/{id}
 * @access  Public
 */
#[instrument(name = "Get restaurant", skip(pool))]
pub async fn get_restaurant(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let restaurant = find_active_restaurant(&mut conn, restaurant_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "restaurant": restaurant})))
}

/******************************************/
// Browsing a Restaurant Menu
/******************************************/
/**
 * @route   GET /restaurants/{id}/menu
 * @access  Public
 */
#[instrument(name = "Browse menu", skip(pool))]
pub async fn browse_menu(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let restaurant = find_active_restaurant(&mut conn, restaurant_id.into_inner()).await?;
    let items = menu_items::table
        .filter(menu_items::restaurant_id.eq(restaurant.id))
        .filter(menu_items::is_available.eq(true))
        .order(menu_items::name.asc())
        .select(MenuItem::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "restaurant": restaurant,
        "items": items,
    })))
}
