use crate::db::PgPool;
use crate::db_models::{CartItem, MenuItem};
use crate::domain::Role;
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::schema::{cart_items, menu_items, restaurants, users};
use crate::validations::quantities::PositiveCount;
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct AddCartItemBody {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCartItemBody {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartLine {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    pub is_available: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub restaurant_id: Option<Uuid>,
    pub items: Vec<CartLine>,
    pub subtotal: i64,
}

/// Cart rows joined with the current menu entry, oldest first.
pub async fn load_cart(
    conn: &mut AsyncPgConnection,
    customer_id: Uuid,
) -> Result<Vec<(CartItem, MenuItem)>, CustomError> {
    let rows = cart_items::table
        .inner_join(menu_items::table)
        .filter(cart_items::customer_id.eq(customer_id))
        .order(cart_items::created_at.asc())
        .select((CartItem::as_select(), MenuItem::as_select()))
        .load::<(CartItem, MenuItem)>(conn)
        .await?;
    Ok(rows)
}

/// Holds the customer's row until the transaction ends so cart writes for one
/// customer run one at a time.
pub async fn lock_cart(
    conn: &mut AsyncPgConnection,
    customer_id: Uuid,
) -> Result<(), CustomError> {
    users::table
        .find(customer_id)
        .select(users::id)
        .for_update()
        .first::<Uuid>(conn)
        .await?;
    Ok(())
}

async fn cart_view(
    conn: &mut AsyncPgConnection,
    customer_id: Uuid,
) -> Result<CartView, CustomError> {
    let rows = load_cart(conn, customer_id).await?;
    let restaurant_id = rows.get(0).map(|(cart, _)| cart.restaurant_id);
    let items: Vec<CartLine> = rows
        .into_iter()
        .map(|(cart, menu)| CartLine {
            id: cart.id,
            menu_item_id: menu.id,
            line_total: menu.price.saturating_mul(i64::from(cart.quantity)),
            name: menu.name,
            unit_price: menu.price,
            quantity: cart.quantity,
            is_available: menu.is_available,
            notes: cart.notes,
        })
        .collect();
    let subtotal = items
        .iter()
        .fold(0i64, |acc, line| acc.saturating_add(line.line_total));
    Ok(CartView {
        restaurant_id,
        items,
        subtotal,
    })
}

/******************************************/
// Viewing the Cart
/******************************************/
/**
 * @route   GET /api/cart
 * @access  JWT Protected, customer
 */
#[instrument(name = "View cart", skip(pool, user), fields(user_id = %user.id))]
pub async fn view_cart(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let mut conn = pool.get().await?;
    let cart = cart_view(&mut conn, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "cart": cart})))
}

/******************************************/
// Adding an Item to the Cart
/******************************************/
/**
 * @route   POST /api/cart/items
 * @access  JWT Protected, customer
 */
/// Items from another restaurant replace the cart; the same item again adds
/// to its quantity and keeps its notes unless new ones are given.
#[instrument(name = "Add cart item", skip(pool, req_item, user), fields(user_id = %user.id, menu_item_id = %req_item.menu_item_id))]
pub async fn add_item(
    pool: web::Data<PgPool>,
    req_item: web::Json<AddCartItemBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let AddCartItemBody {
        menu_item_id,
        quantity,
        notes,
    } = req_item.into_inner();
    let quantity = PositiveCount::parse(quantity, "Quantity").map_err(CustomError::ValidationError)?;
    let customer_id = user.id;
    let mut conn = pool.get().await?;

    conn.transaction::<_, CustomError, _>(|conn| {
        async move {
            lock_cart(conn, customer_id).await?;
            let restaurant_id: Uuid = menu_items::table
                .inner_join(restaurants::table)
                .filter(menu_items::id.eq(menu_item_id))
                .filter(menu_items::is_available.eq(true))
                .filter(restaurants::is_active.eq(true))
                .select(menu_items::restaurant_id)
                .first(conn)
                .await
                .optional()?
                .ok_or_else(|| {
                    CustomError::NotFound("Menu item not found or unavailable".to_string())
                })?;

            let cleared = diesel::delete(
                cart_items::table
                    .filter(cart_items::customer_id.eq(customer_id))
                    .filter(cart_items::restaurant_id.ne(restaurant_id)),
            )
            .execute(conn)
            .await?;
            if cleared > 0 {
                tracing::info!(cleared, "Cart switched restaurant");
            }

            let existing: Option<(i32, Option<String>)> = cart_items::table
                .filter(cart_items::customer_id.eq(customer_id))
                .filter(cart_items::menu_item_id.eq(menu_item_id))
                .select((cart_items::quantity, cart_items::notes))
                .first(conn)
                .await
                .optional()?;
            let (quantity, notes) = match existing {
                Some((held, held_notes)) => (
                    PositiveCount::parse(held.saturating_add(quantity.get()), "Quantity")
                        .map_err(CustomError::ValidationError)?,
                    notes.or(held_notes),
                ),
                None => (quantity, notes),
            };

            diesel::insert_into(cart_items::table)
                .values((
                    cart_items::id.eq(Uuid::new_v4()),
                    cart_items::customer_id.eq(customer_id),
                    cart_items::restaurant_id.eq(restaurant_id),
                    cart_items::menu_item_id.eq(menu_item_id),
                    cart_items::quantity.eq(quantity.get()),
                    cart_items::notes.eq(notes.as_deref()),
                ))
                .on_conflict((cart_items::customer_id, cart_items::menu_item_id))
                .do_update()
                .set((
                    cart_items::quantity.eq(quantity.get()),
                    cart_items::notes.eq(notes.as_deref()),
                ))
                .execute(conn)
                .await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await?;

    let cart = cart_view(&mut conn, customer_id).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "cart": cart})))
}

/******************************************/
// Changing a Cart Quantity
/******************************************/
/**
 * @route   PUT /api/cart/items/{id}
 * @access  JWT Protected, customer
 */
/// A quantity of zero or less removes the line.
#[instrument(name = "Update cart item", skip(pool, req_item, user), fields(user_id = %user.id))]
pub async fn update_item(
    pool: web::Data<PgPool>,
    cart_item_id: web::Path<Uuid>,
    req_item: web::Json<UpdateCartItemBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let cart_item_id = cart_item_id.into_inner();
    let mine = cart_items::table
        .filter(cart_items::id.eq(cart_item_id))
        .filter(cart_items::customer_id.eq(user.id));
    let mut conn = pool.get().await?;

    let affected = if req_item.quantity <= 0 {
        diesel::delete(mine).execute(&mut conn).await?
    } else {
        let quantity =
            PositiveCount::parse(req_item.quantity, "Quantity").map_err(CustomError::ValidationError)?;
        diesel::update(mine)
            .set(cart_items::quantity.eq(quantity.get()))
            .execute(&mut conn)
            .await?
    };
    if affected == 0 {
        return Err(CustomError::NotFound("Cart item not found".to_string()));
    }

    let cart = cart_view(&mut conn, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "cart": cart})))
}

/******************************************/
// Removing a Cart Item
/******************************************/
/**
 * @route   DELETE /api/cart/items/{id}
 * @access  JWT Protected, customer
 */
#[instrument(name = "Remove cart item", skip(pool, user), fields(user_id = %user.id))]
pub async fn remove_item(
    pool: web::Data<PgPool>,
    cart_item_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let mut conn = pool.get().await?;
    let affected = diesel::delete(
        cart_items::table
            .filter(cart_items::id.eq(cart_item_id.into_inner()))
            .filter(cart_items::customer_id.eq(user.id)),
    )
    .execute(&mut conn)
    .await?;
    if affected == 0 {
        return Err(CustomError::NotFound("Cart item not found".to_string()));
    }
    let cart = cart_view(&mut conn, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "cart": cart})))
}

/******************************************/
// Clearing the Cart
/******************************************/
/**
 * @route   DELETE /api/cart
 * @access  JWT Protected, customer
 */
#[instrument(name = "Clear cart", skip(pool, user), fields(user_id = %user.id))]
pub async fn clear_cart(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let mut conn = pool.get().await?;
    diesel::delete(cart_items::table.filter(cart_items::customer_id.eq(user.id)))
        .execute(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "message": "Cart cleared"})))
}
