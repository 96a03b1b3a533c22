use crate::db::PgPool;
use crate::db_models::DiningTable;
use crate::domain::TableState;
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::{ensure_restaurant_access, ANY_STAFF, FLOOR_STAFF, MANAGEMENT};
use crate::schema::dining_tables;
use crate::validations::quantities::PositiveCount;
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct NewTableBody {
    pub table_number: String,
    pub capacity: i32,
}

#[derive(Deserialize)]
pub struct TableStateBody {
    pub state: TableState,
}

/******************************************/
// Listing Tables
/******************************************/
/**
 * @route   GET /api/restaurants/{id}/tables
 * @access  JWT Protected, restaurant staff / admin
 */
#[instrument(name = "List tables", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_tables(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, ANY_STAFF).await?;
    let tables = dining_tables::table
        .filter(dining_tables::restaurant_id.eq(restaurant_id))
        .order(dining_tables::table_number.asc())
        .select(DiningTable::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "tables": tables})))
}

/******************************************/
// Adding a Table
/******************************************/
/**
 * @route   POST /api/restaurants/{id}/tables
 * @access  JWT Protected, manager
 */
#[instrument(name = "Create table", skip(pool, req_table, user), fields(user_id = %user.id, table_number = %req_table.table_number))]
pub async fn create_table(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    req_table: web::Json<NewTableBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let NewTableBody {
        table_number,
        capacity,
    } = req_table.into_inner();
    let table_number = table_number.trim().to_string();
    if table_number.is_empty() {
        return Err(CustomError::ValidationError(
            "Table number is required".to_string(),
        ));
    }
    let capacity = PositiveCount::parse(capacity, "Capacity").map_err(CustomError::ValidationError)?;
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, MANAGEMENT).await?;

    let table = diesel::insert_into(dining_tables::table)
        .values((
            dining_tables::id.eq(Uuid::new_v4()),
            dining_tables::restaurant_id.eq(restaurant_id),
            dining_tables::table_number.eq(&table_number),
            dining_tables::capacity.eq(capacity.get()),
            dining_tables::state.eq(TableState::Free),
        ))
        .returning(DiningTable::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                CustomError::Conflict(format!("Table {} already exists", table_number))
            }
            other => other.into(),
        })?;
    Ok(HttpResponse::Created().json(json!({"success": true, "table": table})))
}

/******************************************/
// Changing a Table State
/******************************************/
/**
 * @route   PUT /api/tables/{id}/state
 * @access  JWT Protected, floor staff / admin
 */
#[instrument(name = "Update table state", skip(pool, req_state, user), fields(user_id = %user.id, state = %req_state.state))]
pub async fn update_table_state(
    pool: web::Data<PgPool>,
    table_id: web::Path<Uuid>,
    req_state: web::Json<TableStateBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let table = dining_tables::table
        .find(table_id.into_inner())
        .select(DiningTable::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Table not found".to_string()))?;
    ensure_restaurant_access(&mut conn, &user, table.restaurant_id, FLOOR_STAFF).await?;

    let next = table.state.transition(req_state.state)?;
    let updated = diesel::update(
        dining_tables::table
            .filter(dining_tables::id.eq(table.id))
            .filter(dining_tables::state.eq(table.state)),
    )
    .set(dining_tables::state.eq(next))
    .returning(DiningTable::as_returning())
    .get_result(&mut conn)
    .await
    .optional()?
    .ok_or_else(|| {
        CustomError::Conflict("Table was changed by someone else, reload and retry".to_string())
    })?;
    tracing::info!(table_id = %updated.id, from = %table.state, to = %updated.state, "Table state changed");
    Ok(HttpResponse::Ok().json(json!({"success": true, "table": updated})))
}
