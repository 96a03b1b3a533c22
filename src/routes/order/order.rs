use crate::db::PgPool;
use crate::db_models::{NewOrder, Order, OrderItem};
use crate::domain::{
    generate_order_code, DeliveryStatus, OrderLine, OrderPricing, OrderStatus, OrderType,
    PricingSettings, Role,
};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::{ensure_restaurant_access, ANY_STAFF, FLOOR_STAFF};
use crate::routes::cart::cart::{load_cart, lock_cart};
use crate::routes::restaurant::restaurant::find_active_restaurant;
use crate::schema::{
    cart_items, delivery_assignments, dining_tables, order_items, orders, users,
};
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct PlaceOrderBody {
    pub order_type: OrderType,
    pub table_id: Option<Uuid>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusBody {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

pub async fn find_order(conn: &mut AsyncPgConnection, order_id: Uuid) -> Result<Order, CustomError> {
    orders::table
        .find(order_id)
        .select(Order::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Order not found".to_string()))
}

/// Writes `next` only if the order is still in `current`; a concurrent change
/// surfaces as a conflict.
pub async fn compare_and_set_order_status(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
    current: OrderStatus,
    next: OrderStatus,
) -> Result<Order, CustomError> {
    diesel::update(
        orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::status.eq(current)),
    )
    .set((
        orders::status.eq(next),
        orders::updated_at.eq(diesel::dsl::now),
    ))
    .returning(Order::as_returning())
    .get_result(conn)
    .await
    .optional()?
    .ok_or_else(|| {
        CustomError::Conflict("Order was changed by someone else, reload and retry".to_string())
    })
}

/// Moves every still-active assignment of the order to CANCELLED.
async fn cancel_live_assignments(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<usize, CustomError> {
    let mut cancelled = 0;
    for status in DeliveryStatus::ACTIVE {
        cancelled += diesel::update(
            delivery_assignments::table
                .filter(delivery_assignments::order_id.eq(order_id))
                .filter(delivery_assignments::status.eq(status)),
        )
        .set(delivery_assignments::status.eq(DeliveryStatus::Cancelled))
        .execute(conn)
        .await?;
    }
    Ok(cancelled)
}

/******************************************/
// Placing an Order from the Cart
/******************************************/
/**
 * @route   POST /api/orders
 * @access  JWT Protected, customer
 */
#[instrument(name = "Place order", skip(pool, pricing, req_order, user), fields(user_id = %user.id, order_type = ?req_order.order_type))]
pub async fn place_order(
    pool: web::Data<PgPool>,
    pricing: web::Data<PricingSettings>,
    req_order: web::Json<PlaceOrderBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let PlaceOrderBody {
        order_type,
        table_id,
        delivery_address,
        notes,
    } = req_order.into_inner();
    let fees = *pricing.get_ref();
    let customer_id = user.id;
    let delivery_address = delivery_address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let mut conn = pool.get().await?;

    let (order, items) = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move {
                lock_cart(conn, customer_id).await?;
                let cart = load_cart(conn, customer_id).await?;
                let restaurant_id = cart
                    .get(0)
                    .map(|(line, _)| line.restaurant_id)
                    .ok_or_else(|| CustomError::ValidationError("Your cart is empty".to_string()))?;
                if cart.iter().any(|(line, _)| line.restaurant_id != restaurant_id) {
                    return Err(CustomError::ValidationError(
                        "Your cart holds items from more than one restaurant".to_string(),
                    ));
                }
                find_active_restaurant(conn, restaurant_id).await?;
                if let Some((_, item)) = cart.iter().find(|(_, item)| !item.is_available) {
                    return Err(CustomError::ValidationError(format!(
                        "{} is no longer available",
                        item.name
                    )));
                }

                let table_id = match order_type {
                    OrderType::Table => {
                        let table_id = table_id.ok_or_else(|| {
                            CustomError::ValidationError(
                                "A table is required for dine-in orders".to_string(),
                            )
                        })?;
                        dining_tables::table
                            .filter(dining_tables::id.eq(table_id))
                            .filter(dining_tables::restaurant_id.eq(restaurant_id))
                            .select(dining_tables::id)
                            .first::<Uuid>(conn)
                            .await
                            .optional()?
                            .ok_or_else(|| {
                                CustomError::ValidationError(
                                    "Table does not belong to this restaurant".to_string(),
                                )
                            })?;
                        Some(table_id)
                    }
                    OrderType::Preorder | OrderType::Delivery => None,
                };
                let delivery_address = match order_type {
                    OrderType::Delivery => Some(delivery_address.ok_or_else(|| {
                        CustomError::ValidationError(
                            "A delivery address is required for delivery orders".to_string(),
                        )
                    })?),
                    OrderType::Table | OrderType::Preorder => None,
                };

                let lines: Vec<OrderLine> = cart
                    .iter()
                    .map(|(line, item)| OrderLine {
                        unit_price: item.price,
                        quantity: line.quantity,
                    })
                    .collect();
                let pricing = OrderPricing::compute(order_type, &lines, &fees)
                    .map_err(CustomError::ValidationError)?;

                let (customer_name, customer_phone): (String, Option<String>) = users::table
                    .find(customer_id)
                    .select((users::full_name, users::phone))
                    .first(conn)
                    .await?;
                let order_code = generate_order_code();
                let order = diesel::insert_into(orders::table)
                    .values(&NewOrder {
                        id: Uuid::new_v4(),
                        order_code: &order_code,
                        restaurant_id,
                        customer_id,
                        order_type,
                        status: OrderStatus::Received,
                        table_id,
                        delivery_address: delivery_address.as_deref(),
                        customer_name: &customer_name,
                        customer_phone: customer_phone.as_deref(),
                        notes: notes.as_deref(),
                        subtotal: pricing.subtotal,
                        service_fee: pricing.service_fee,
                        delivery_fee: pricing.delivery_fee,
                        total_amount: pricing.total_amount,
                    })
                    .returning(Order::as_returning())
                    .get_result(conn)
                    .await?;

                let items: Vec<OrderItem> = cart
                    .into_iter()
                    .map(|(line, item)| OrderItem {
                        id: Uuid::new_v4(),
                        order_id: order.id,
                        menu_item_id: item.id,
                        subtotal: item.price * i64::from(line.quantity),
                        item_name: item.name,
                        unit_price: item.price,
                        quantity: line.quantity,
                        notes: line.notes,
                    })
                    .collect();
                diesel::insert_into(order_items::table)
                    .values(&items)
                    .execute(conn)
                    .await?;
                diesel::delete(cart_items::table.filter(cart_items::customer_id.eq(customer_id)))
                    .execute(conn)
                    .await?;
                Ok((order, items))
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(order_id = %order.id, order_code = %order.order_code, total = order.total_amount, "Order placed");
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "order": order,
        "items": items,
    })))
}

/******************************************/
// Customer Order History
/******************************************/
/**
 * @route   GET /api/orders
 * @access  JWT Protected, customer
 */
#[instrument(name = "List my orders", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_my_orders(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let rows = orders::table
        .filter(orders::customer_id.eq(user.id))
        .order(orders::created_at.desc())
        .select(Order::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "orders": rows})))
}

/******************************************/
// Viewing One Order
/******************************************/
/**
 * @route   GET /api/orders/{id}
 * @access  JWT Protected, owner / restaurant staff / admin
 */
#[instrument(name = "Get order", skip(pool, user), fields(user_id = %user.id))]
pub async fn get_order(
    pool: web::Data<PgPool>,
    order_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let order = find_order(&mut conn, order_id.into_inner()).await?;
    if order.customer_id != user.id {
        ensure_restaurant_access(&mut conn, &user, order.restaurant_id, ANY_STAFF).await?;
    }
    let items = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .select(OrderItem::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "order": order,
        "items": items,
    })))
}

/******************************************/
// Restaurant Order Board
/******************************************/
/**
 * @route   GET /api/restaurants/{id}/orders?status=
 * @access  JWT Protected, restaurant staff / admin
 */
#[instrument(name = "List restaurant orders", skip(pool, filter, user), fields(user_id = %user.id))]
pub async fn list_restaurant_orders(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    filter: web::Query<OrderFilter>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, ANY_STAFF).await?;

    let mut query = orders::table
        .filter(orders::restaurant_id.eq(restaurant_id))
        .order(orders::created_at.desc())
        .select(Order::as_select())
        .into_boxed();
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status));
    }
    let rows = query.load(&mut conn).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "orders": rows})))
}

/******************************************/
// Moving an Order Through its Lifecycle
/******************************************/
/**
 * @route   PUT /api/orders/{id}/status
 * @access  JWT Protected, floor staff / admin; owner may cancel a RECEIVED order
 */
#[instrument(name = "Update order status", skip(pool, req_status, user), fields(user_id = %user.id, status = %req_status.status))]
pub async fn update_order_status(
    pool: web::Data<PgPool>,
    order_id: web::Path<Uuid>,
    req_status: web::Json<UpdateOrderStatusBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let requested = req_status.status;
    let mut conn = pool.get().await?;
    let order = find_order(&mut conn, order_id.into_inner()).await?;

    if user.role == Role::Customer {
        if order.customer_id != user.id || requested != OrderStatus::Cancelled {
            return Err(CustomError::Forbidden(
                "Customers may only cancel their own orders".to_string(),
            ));
        }
        if order.status != OrderStatus::Received {
            return Err(CustomError::Conflict(
                "The kitchen has already started this order".to_string(),
            ));
        }
    } else {
        ensure_restaurant_access(&mut conn, &user, order.restaurant_id, FLOOR_STAFF).await?;
    }

    let next = order.status.transition(order.order_type, requested)?;
    let (order_id, current) = (order.id, order.status);
    let updated = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move {
                // Serialises with driver assignment, which locks the same row.
                orders::table
                    .find(order_id)
                    .select(orders::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .await?;
                let live_assignments = delivery_assignments::table
                    .filter(delivery_assignments::order_id.eq(order_id))
                    .select(delivery_assignments::status)
                    .for_update()
                    .load::<DeliveryStatus>(conn)
                    .await?
                    .iter()
                    .filter(|status| status.is_active())
                    .count();
                if next.is_driver_reported() && live_assignments > 0 {
                    return Err(CustomError::Conflict(format!(
                        "{} is reported by the assigned driver",
                        next
                    )));
                }

                let updated =
                    compare_and_set_order_status(conn, order_id, current, next).await?;
                if next == OrderStatus::Cancelled && live_assignments > 0 {
                    let cancelled = cancel_live_assignments(conn, order_id).await?;
                    tracing::info!(order_id = %order_id, cancelled, "Delivery assignments cancelled with the order");
                }
                Ok(updated)
            }
            .scope_boxed()
        })
        .await?;
    tracing::info!(order_id = %updated.id, from = %current, to = %updated.status, "Order status changed");
    Ok(HttpResponse::Ok().json(json!({"success": true, "order": updated})))
}
