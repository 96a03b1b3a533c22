use crate::db::PgPool;
use crate::db_models::{EmploymentRecord, UserProfile};
use crate::domain::{EmploymentStatus, Role, StaffRole};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::{ensure_restaurant_access, MANAGEMENT};
use crate::routes::auth::auth::{insert_user, RegisterBody};
use crate::schema::{employment_records, users};
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct HireStaffBody {
    #[serde(flatten)]
    pub account: RegisterBody,
    pub staff_role: StaffRole,
}

#[derive(Deserialize)]
pub struct EmploymentStatusBody {
    /// Omitted means flip the current status.
    pub status: Option<EmploymentStatus>,
}

#[derive(Serialize)]
pub struct StaffMember {
    pub employment: EmploymentRecord,
    pub user: UserProfile,
}

/******************************************/
// Listing Restaurant Staff
/******************************************/
/**
 * @route   GET /api/restaurants/{id}/staff
 * @access  JWT Protected, manager / admin
 */
#[instrument(name = "List staff", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_staff(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, MANAGEMENT).await?;
    let staff: Vec<StaffMember> = employment_records::table
        .inner_join(users::table)
        .filter(employment_records::restaurant_id.eq(restaurant_id))
        .order(users::full_name.asc())
        .select((EmploymentRecord::as_select(), UserProfile::as_select()))
        .load::<(EmploymentRecord, UserProfile)>(&mut conn)
        .await?
        .into_iter()
        .map(|(employment, user)| StaffMember { employment, user })
        .collect();
    Ok(HttpResponse::Ok().json(json!({"success": true, "staff": staff})))
}

/******************************************/
// Hiring Staff
/******************************************/
/**
 * @route   POST /api/restaurants/{id}/staff
 * @access  JWT Protected, manager / admin
 */
/// Creates the STAFF account and its ACTIVE employment record together.
#[instrument(name = "Hire staff", skip(pool, req_staff, user), fields(user_id = %user.id, staff_role = ?req_staff.staff_role))]
pub async fn hire_staff(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    req_staff: web::Json<HireStaffBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let restaurant_id = restaurant_id.into_inner();
    let HireStaffBody {
        account,
        staff_role,
    } = req_staff.into_inner();
    if staff_role == StaffRole::Manager {
        return Err(CustomError::ValidationError(
            "Managers are appointed by an administrator".to_string(),
        ));
    }
    let registration = account.validate().map_err(CustomError::ValidationError)?;
    let mut conn = pool.get().await?;
    ensure_restaurant_access(&mut conn, &user, restaurant_id, MANAGEMENT).await?;

    let member = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move {
                let profile = insert_user(conn, registration, Role::Staff).await?;
                let employment = diesel::insert_into(employment_records::table)
                    .values((
                        employment_records::id.eq(Uuid::new_v4()),
                        employment_records::user_id.eq(profile.id),
                        employment_records::restaurant_id.eq(restaurant_id),
                        employment_records::staff_role.eq(staff_role),
                        employment_records::status.eq(EmploymentStatus::Active),
                    ))
                    .returning(EmploymentRecord::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(StaffMember {
                    employment,
                    user: profile,
                })
            }
            .scope_boxed()
        })
        .await?;
    tracing::info!(employment_id = %member.employment.id, staff_user_id = %member.user.id, "Staff hired");
    Ok(HttpResponse::Created().json(json!({"success": true, "staff": member})))
}

/******************************************/
// Activating / Deactivating Staff
/******************************************/
/**
 * @route   PUT /api/staff/{employment_id}/status
 * @access  JWT Protected, manager / admin
 */
#[instrument(name = "Update employment status", skip(pool, req_status, user), fields(user_id = %user.id))]
pub async fn update_employment_status(
    pool: web::Data<PgPool>,
    employment_id: web::Path<Uuid>,
    req_status: web::Json<EmploymentStatusBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let record = employment_records::table
        .find(employment_id.into_inner())
        .select(EmploymentRecord::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Employment record not found".to_string()))?;
    ensure_restaurant_access(&mut conn, &user, record.restaurant_id, MANAGEMENT).await?;

    let next = req_status.status.unwrap_or_else(|| record.status.toggled());
    if record.user_id == user.id && next == EmploymentStatus::Inactive {
        return Err(CustomError::Conflict(
            "You cannot deactivate your own employment".to_string(),
        ));
    }
    let updated = diesel::update(employment_records::table.find(record.id))
        .set(employment_records::status.eq(next))
        .returning(EmploymentRecord::as_returning())
        .get_result(&mut conn)
        .await?;
    tracing::info!(employment_id = %updated.id, status = ?updated.status, "Employment status changed");
    Ok(HttpResponse::Ok().json(json!({"success": true, "employment": updated})))
}
