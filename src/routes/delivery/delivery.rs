use crate::db::PgPool;
use crate::db_models::{DeliveryAssignment, UserProfile};
use crate::domain::{DeliveryStatus, EmploymentStatus, OrderStatus, OrderType, Role, StaffRole};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::{active_staff_roles, ensure_restaurant_access, MANAGEMENT};
use crate::routes::order::order::{compare_and_set_order_status, find_order};
use crate::schema::{delivery_assignments, employment_records, orders, users};
use actix_web::{web, HttpResponse};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct AssignDeliveryBody {
    pub order_id: Uuid,
    pub driver_id: Uuid,
}

#[derive(Deserialize)]
pub struct DeliveryStatusBody {
    pub status: DeliveryStatus,
}

#[derive(Deserialize)]
pub struct AvailabilityBody {
    pub is_available: bool,
}

/// What a driver needs on the road.
#[derive(Serialize)]
pub struct DriverJob {
    #[serde(flatten)]
    pub assignment: DeliveryAssignment,
    pub order_code: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub total_amount: i64,
}

/// Timestamps recorded when an assignment reaches `next`; earlier ones are kept.
fn stamped(
    assignment: &DeliveryAssignment,
    next: DeliveryStatus,
    now: NaiveDateTime,
) -> (
    Option<NaiveDateTime>,
    Option<NaiveDateTime>,
    Option<NaiveDateTime>,
) {
    let accepted_at = match next {
        DeliveryStatus::Accepted => Some(now),
        _ => assignment.accepted_at,
    };
    let picked_up_at = match next {
        DeliveryStatus::PickedUp => Some(now),
        _ => assignment.picked_up_at,
    };
    let delivered_at = match next {
        DeliveryStatus::Delivered => Some(now),
        _ => assignment.delivered_at,
    };
    (accepted_at, picked_up_at, delivered_at)
}

/******************************************/
// Assigning a Driver
/******************************************/
/**
 * @route   POST /api/deliveries
 * @access  JWT Protected, manager / admin
 */
#[instrument(name = "Assign delivery", skip(pool, req_assign, user), fields(user_id = %user.id, order_id = %req_assign.order_id, driver_id = %req_assign.driver_id))]
pub async fn assign_delivery(
    pool: web::Data<PgPool>,
    req_assign: web::Json<AssignDeliveryBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let AssignDeliveryBody {
        order_id,
        driver_id,
    } = req_assign.into_inner();
    let mut conn = pool.get().await?;
    let order = find_order(&mut conn, order_id).await?;
    ensure_restaurant_access(&mut conn, &user, order.restaurant_id, MANAGEMENT).await?;

    let assignment = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move {
                let (order_type, status) = orders::table
                    .find(order_id)
                    .select((orders::order_type, orders::status))
                    .for_update()
                    .first::<(OrderType, OrderStatus)>(conn)
                    .await?;
                if order_type != OrderType::Delivery {
                    return Err(CustomError::ValidationError(
                        "Only delivery orders can be assigned to a driver".to_string(),
                    ));
                }
                if status.is_terminal() {
                    return Err(CustomError::Conflict(format!(
                        "Order is already {}",
                        status
                    )));
                }

                let existing: Vec<DeliveryStatus> = delivery_assignments::table
                    .filter(delivery_assignments::order_id.eq(order_id))
                    .select(delivery_assignments::status)
                    .load(conn)
                    .await?;
                if existing.iter().any(DeliveryStatus::is_active) {
                    return Err(CustomError::Conflict(
                        "Order already has an active delivery assignment".to_string(),
                    ));
                }

                let driver_roles = active_staff_roles(conn, driver_id, order.restaurant_id).await?;
                if !driver_roles.contains(&StaffRole::Driver) {
                    return Err(CustomError::ValidationError(
                        "Driver is not an active driver at this restaurant".to_string(),
                    ));
                }

                let assignment = diesel::insert_into(delivery_assignments::table)
                    .values((
                        delivery_assignments::id.eq(Uuid::new_v4()),
                        delivery_assignments::order_id.eq(order_id),
                        delivery_assignments::driver_id.eq(driver_id),
                        delivery_assignments::status.eq(DeliveryStatus::Pending),
                    ))
                    .returning(DeliveryAssignment::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(assignment)
            }
            .scope_boxed()
        })
        .await?;
    tracing::info!(assignment_id = %assignment.id, "Delivery assigned");
    Ok(HttpResponse::Created().json(json!({"success": true, "assignment": assignment})))
}

/******************************************/
// Driver Job List
/******************************************/
/**
 * @route   GET /api/deliveries
 * @access  JWT Protected, driver
 */
#[instrument(name = "List my deliveries", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_my_deliveries(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let jobs: Vec<DriverJob> = delivery_assignments::table
        .inner_join(orders::table)
        .filter(delivery_assignments::driver_id.eq(user.id))
        .order(delivery_assignments::created_at.desc())
        .select((
            DeliveryAssignment::as_select(),
            orders::order_code,
            orders::customer_name,
            orders::customer_phone,
            orders::delivery_address,
            orders::total_amount,
        ))
        .load::<(
            DeliveryAssignment,
            String,
            String,
            Option<String>,
            Option<String>,
            i64,
        )>(&mut conn)
        .await?
        .into_iter()
        .map(
            |(assignment, order_code, customer_name, customer_phone, delivery_address, total_amount)| {
                DriverJob {
                    assignment,
                    order_code,
                    customer_name,
                    customer_phone,
                    delivery_address,
                    total_amount,
                }
            },
        )
        .collect();
    Ok(HttpResponse::Ok().json(json!({"success": true, "deliveries": jobs})))
}

/******************************************/
// Driver Progress Updates
/******************************************/
/**
 * @route   PUT /api/deliveries/{id}/status
 * @access  JWT Protected, assigned driver
 */
/// Dispatch and outcome are mirrored onto the order in the same transaction.
#[instrument(name = "Update delivery status", skip(pool, req_status, user), fields(user_id = %user.id, status = %req_status.status))]
pub async fn update_delivery_status(
    pool: web::Data<PgPool>,
    assignment_id: web::Path<Uuid>,
    req_status: web::Json<DeliveryStatusBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let requested = req_status.status;
    let mut conn = pool.get().await?;
    let assignment = delivery_assignments::table
        .find(assignment_id.into_inner())
        .select(DeliveryAssignment::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Delivery assignment not found".to_string()))?;
    if assignment.driver_id != user.id {
        return Err(CustomError::Forbidden(
            "Only the assigned driver can update this delivery".to_string(),
        ));
    }
    let next = assignment.status.transition(requested)?;

    let (updated, order) = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move {
                // Same lock order as order status writes: order row, then assignments.
                orders::table
                    .find(assignment.order_id)
                    .select(orders::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .await?;
                let (accepted_at, picked_up_at, delivered_at) =
                    stamped(&assignment, next, chrono::Utc::now().naive_utc());
                let updated = diesel::update(
                    delivery_assignments::table
                        .filter(delivery_assignments::id.eq(assignment.id))
                        .filter(delivery_assignments::status.eq(assignment.status)),
                )
                .set((
                    delivery_assignments::status.eq(next),
                    delivery_assignments::accepted_at.eq(accepted_at),
                    delivery_assignments::picked_up_at.eq(picked_up_at),
                    delivery_assignments::delivered_at.eq(delivered_at),
                ))
                .returning(DeliveryAssignment::as_returning())
                .get_result(conn)
                .await
                .optional()?
                .ok_or_else(|| {
                    CustomError::Conflict(
                        "Delivery was changed by someone else, reload and retry".to_string(),
                    )
                })?;

                let order = match next.order_status() {
                    Some(order_next) => {
                        let order = find_order(conn, updated.order_id).await?;
                        let order_next = order.status.transition(order.order_type, order_next)?;
                        Some(
                            compare_and_set_order_status(conn, order.id, order.status, order_next)
                                .await?,
                        )
                    }
                    None => None,
                };
                Ok((updated, order))
            }
            .scope_boxed()
        })
        .await?;
    tracing::info!(assignment_id = %updated.id, status = %updated.status, "Delivery status changed");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "assignment": updated,
        "order": order,
    })))
}

/******************************************/
// Driver Availability
/******************************************/
/**
 * @route   PUT /api/deliveries/availability
 * @access  JWT Protected, driver
 */
#[instrument(name = "Set driver availability", skip(pool, req_body, user), fields(user_id = %user.id, is_available = req_body.is_available))]
pub async fn set_availability(
    pool: web::Data<PgPool>,
    req_body: web::Json<AvailabilityBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Staff])?;
    let mut conn = pool.get().await?;
    let driving: i64 = employment_records::table
        .filter(employment_records::user_id.eq(user.id))
        .filter(employment_records::staff_role.eq(StaffRole::Driver))
        .filter(employment_records::status.eq(EmploymentStatus::Active))
        .count()
        .get_result(&mut conn)
        .await?;
    if driving == 0 {
        return Err(CustomError::Forbidden(
            "Only active drivers have an availability status".to_string(),
        ));
    }
    let profile = diesel::update(users::table.find(user.id))
        .set(users::is_available.eq(req_body.is_available))
        .returning(UserProfile::as_returning())
        .get_result(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "user": profile})))
}
