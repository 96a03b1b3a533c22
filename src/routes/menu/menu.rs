use crate::db::PgPool;
use crate::db_models::{MenuItem, NewMenuItem};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::{ensure_restaurant_access, ANY_STAFF, MANAGEMENT};
use crate::schema::menu_items;
use crate::validations::name_email::PersonName;
use crate::validations::quantities::Price;
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct MenuItemBody {
    name: String,
    description: Option<String>,
    price: i64,
    image_url: Option<String>,
}

impl MenuItemBody {
    pub fn validate(self) -> Result<(PersonName, Price, Option<String>, Option<String>), String> {
        let name = PersonName::parse(self.name)?;
        let price = Price::parse(self.price)?;
        let description = self.description.filter(|d| !d.trim().is_empty());
        let image_url = self.image_url.filter(|u| !u.trim().is_empty());
        Ok((name, price, description, image_url))
    }
}

#[derive(Deserialize)]
pub struct AvailabilityBody {
    pub is_available: bool,
}

async fn find_menu_item(
    conn: &mut AsyncPgConnection,
    item_id: Uuid,
) -> Result<MenuItem, CustomError> {
    menu_items::table
        .find(item_id)
        .select(MenuItem::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Menu item not found".to_string()))
}

/******************************************/
// Listing the Full Menu for Staff
/******************************************/
/**
 * @route   GET /api/restaurants/{id}/menu
 * @access  JWT Protected, restaurant staff
 */
#[instrument(name = "List menu for staff", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_menu(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, ANY_STAFF).await?;
    let items = menu_items::table
        .filter(menu_items::restaurant_id.eq(restaurant_id))
        .order(menu_items::name.asc())
        .select(MenuItem::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "items": items})))
}

/******************************************/
// Adding a Menu Item
/******************************************/
/**
 * @route   POST /api/restaurants/{id}/menu
 * @access  JWT Protected, manager
 */
#[instrument(name = "Create menu item", skip(pool, req_item, user), fields(user_id = %user.id))]
pub async fn create_menu_item(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    req_item: web::Json<MenuItemBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let (name, price, description, image_url) = req_item
        .into_inner()
        .validate()
        .map_err(CustomError::ValidationError)?;
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, MANAGEMENT).await?;

    let item = diesel::insert_into(menu_items::table)
        .values(&NewMenuItem {
            id: Uuid::new_v4(),
            restaurant_id,
            name: name.as_ref(),
            description: description.as_deref(),
            price: price.get(),
            image_url: image_url.as_deref(),
            is_available: true,
        })
        .returning(MenuItem::as_returning())
        .get_result(&mut conn)
        .await?;
    Ok(HttpResponse::Created().json(json!({"success": true, "item": item})))
}

/******************************************/
// Updating a Menu Item
/******************************************/
/**
 * @route   PUT /api/menu/{item_id}
 * @access  JWT Protected, manager
 */
#[instrument(name = "Update menu item", skip(pool, req_item, user), fields(user_id = %user.id))]
pub async fn update_menu_item(
    pool: web::Data<PgPool>,
    item_id: web::Path<Uuid>,
    req_item: web::Json<MenuItemBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let (name, price, description, image_url) = req_item
        .into_inner()
        .validate()
        .map_err(CustomError::ValidationError)?;
    let mut conn = pool.get().await?;
    let existing = find_menu_item(&mut conn, item_id.into_inner()).await?;
    ensure_restaurant_access(&mut conn, &user, existing.restaurant_id, MANAGEMENT).await?;

    let item = diesel::update(menu_items::table.find(existing.id))
        .set((
            menu_items::name.eq(name.as_ref()),
            menu_items::description.eq(description.as_deref()),
            menu_items::price.eq(price.get()),
            menu_items::image_url.eq(image_url.as_deref()),
        ))
        .returning(MenuItem::as_returning())
        .get_result(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "item": item})))
}

/******************************************/
// Toggling Menu Item Availability
/******************************************/
/**
 * @route   PUT /api/menu/{item_id}/availability
 * @access  JWT Protected, manager
 */
#[instrument(name = "Set menu item availability", skip(pool, req_body, user), fields(user_id = %user.id))]
pub async fn set_availability(
    pool: web::Data<PgPool>,
    item_id: web::Path<Uuid>,
    req_body: web::Json<AvailabilityBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let existing = find_menu_item(&mut conn, item_id.into_inner()).await?;
    ensure_restaurant_access(&mut conn, &user, existing.restaurant_id, MANAGEMENT).await?;

    let item = diesel::update(menu_items::table.find(existing.id))
        .set(menu_items::is_available.eq(req_body.is_available))
        .returning(MenuItem::as_returning())
        .get_result(&mut conn)
        .await?;
    tracing::info!(item_id = %item.id, is_available = item.is_available, "Menu availability changed");
    Ok(HttpResponse::Ok().json(json!({"success": true, "item": item})))
}
