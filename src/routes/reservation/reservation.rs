use crate::db::PgPool;
use crate::db_models::Reservation;
use crate::domain::{ReservationStatus, Role};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::{ensure_restaurant_access, ANY_STAFF, FLOOR_STAFF};
use crate::routes::restaurant::restaurant::find_active_restaurant;
use crate::schema::reservations;
use crate::validations::quantities::PositiveCount;
use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct NewReservationBody {
    pub restaurant_id: Uuid,
    pub reservation_date: String,
    pub reservation_time: String,
    pub party_size: i32,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ReservationStatusBody {
    pub status: ReservationStatus,
}

/// Parses `YYYY-MM-DD` and `HH:MM[:SS]` and rejects a slot earlier than `now`.
pub fn parse_slot(
    date: &str,
    time: &str,
    now: NaiveDateTime,
) -> Result<(NaiveDate, NaiveTime), String> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{} is not a valid date (YYYY-MM-DD).", date))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M"))
        .map_err(|_| format!("{} is not a valid time (HH:MM).", time))?;
    if date.and_time(time) < now {
        return Err("Reservations cannot be made in the past.".to_string());
    }
    Ok((date, time))
}

/******************************************/
// Booking a Table
/******************************************/
/**
 * @route   POST /api/reservations
 * @access  JWT Protected, customer
 */
#[instrument(name = "Create reservation", skip(pool, req_reservation, user), fields(user_id = %user.id, restaurant_id = %req_reservation.restaurant_id))]
pub async fn create_reservation(
    pool: web::Data<PgPool>,
    req_reservation: web::Json<NewReservationBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Customer])?;
    let body = req_reservation.into_inner();
    let party_size =
        PositiveCount::parse(body.party_size, "Party size").map_err(CustomError::ValidationError)?;
    let (date, time) = parse_slot(
        &body.reservation_date,
        &body.reservation_time,
        chrono::Local::now().naive_local(),
    )
    .map_err(CustomError::ValidationError)?;
    let notes = body.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    let mut conn = pool.get().await?;
    let restaurant = find_active_restaurant(&mut conn, body.restaurant_id).await?;
    let reservation = diesel::insert_into(reservations::table)
        .values((
            reservations::id.eq(Uuid::new_v4()),
            reservations::restaurant_id.eq(restaurant.id),
            reservations::customer_id.eq(user.id),
            reservations::reservation_date.eq(date),
            reservations::reservation_time.eq(time),
            reservations::party_size.eq(party_size.get()),
            reservations::status.eq(ReservationStatus::Pending),
            reservations::notes.eq(notes.as_deref()),
        ))
        .returning(Reservation::as_returning())
        .get_result(&mut conn)
        .await?;
    tracing::info!(reservation_id = %reservation.id, "Reservation requested");
    Ok(HttpResponse::Created().json(json!({"success": true, "reservation": reservation})))
}

/******************************************/
// Customer Reservations
/******************************************/
/**
 * @route   GET /api/reservations
 * @access  JWT Protected
 */
#[instrument(name = "List my reservations", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_my_reservations(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let rows = reservations::table
        .filter(reservations::customer_id.eq(user.id))
        .order((
            reservations::reservation_date.asc(),
            reservations::reservation_time.asc(),
        ))
        .select(Reservation::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "reservations": rows})))
}

/******************************************/
// Restaurant Reservation Book
/******************************************/
/**
 * @route   GET /api/restaurants/{id}/reservations
 * @access  JWT Protected, restaurant staff / admin
 */
#[instrument(name = "List restaurant reservations", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_restaurant_reservations(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, ANY_STAFF).await?;
    let rows = reservations::table
        .filter(reservations::restaurant_id.eq(restaurant_id))
        .order((
            reservations::reservation_date.asc(),
            reservations::reservation_time.asc(),
        ))
        .select(Reservation::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "reservations": rows})))
}

/******************************************/
// Confirming / Seating / Cancelling
/******************************************/
/**
 * @route   PUT /api/reservations/{id}/status
 * @access  JWT Protected, floor staff / admin; owner may cancel
 */
#[instrument(name = "Update reservation status", skip(pool, req_status, user), fields(user_id = %user.id, status = %req_status.status))]
pub async fn update_reservation_status(
    pool: web::Data<PgPool>,
    reservation_id: web::Path<Uuid>,
    req_status: web::Json<ReservationStatusBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let requested = req_status.status;
    let mut conn = pool.get().await?;
    let reservation = reservations::table
        .find(reservation_id.into_inner())
        .select(Reservation::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Reservation not found".to_string()))?;

    if user.role == Role::Customer {
        if reservation.customer_id != user.id || requested != ReservationStatus::Cancelled {
            return Err(CustomError::Forbidden(
                "Customers may only cancel their own reservations".to_string(),
            ));
        }
        if !reservation.status.cancellable_by_customer() {
            return Err(CustomError::Conflict(format!(
                "A {} reservation can no longer be cancelled",
                reservation.status
            )));
        }
    } else {
        ensure_restaurant_access(&mut conn, &user, reservation.restaurant_id, FLOOR_STAFF).await?;
    }

    let next = reservation.status.transition(requested)?;
    let updated = diesel::update(
        reservations::table
            .filter(reservations::id.eq(reservation.id))
            .filter(reservations::status.eq(reservation.status)),
    )
    .set(reservations::status.eq(next))
    .returning(Reservation::as_returning())
    .get_result(&mut conn)
    .await
    .optional()?
    .ok_or_else(|| {
        CustomError::Conflict(
            "Reservation was changed by someone else, reload and retry".to_string(),
        )
    })?;
    tracing::info!(reservation_id = %updated.id, from = %reservation.status, to = %updated.status, "Reservation status changed");
    Ok(HttpResponse::Ok().json(json!({"success": true, "reservation": updated})))
}
