use crate::domain::{EmploymentStatus, StaffRole};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::schema::{employment_records, restaurants};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;
use uuid::Uuid;

/// Staff who run the floor and the kitchen.
pub const FLOOR_STAFF: &[StaffRole] = &[StaffRole::Manager, StaffRole::Kitchen, StaffRole::Server];
pub const MANAGEMENT: &[StaffRole] = &[StaffRole::Manager];
pub const ANY_STAFF: &[StaffRole] = &[
    StaffRole::Manager,
    StaffRole::Kitchen,
    StaffRole::Server,
    StaffRole::Driver,
];

/// Admins may act on any restaurant; staff and managers only on the one they
/// hold an ACTIVE employment record at, in one of `staff_roles`.
#[instrument(name = "Check restaurant access", skip(conn, user, staff_roles), fields(user_id = %user.id))]
pub async fn ensure_restaurant_access(
    conn: &mut AsyncPgConnection,
    user: &AuthenticatedUser,
    restaurant_id: Uuid,
    staff_roles: &[StaffRole],
) -> Result<(), CustomError> {
    if user.is_admin() {
        ensure_restaurant_exists(conn, restaurant_id).await?;
        return Ok(());
    }
    if !user.role.is_restaurant_side() {
        return Err(CustomError::Forbidden(format!(
            "{} cannot act on behalf of a restaurant",
            user.role
        )));
    }
    let held_roles = active_staff_roles(conn, user.id, restaurant_id).await?;
    if held_roles.iter().any(|role| staff_roles.contains(role)) {
        Ok(())
    } else {
        Err(CustomError::Forbidden(
            "You are not employed at this restaurant in a role that allows this".to_string(),
        ))
    }
}

pub async fn active_staff_roles(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    restaurant_id: Uuid,
) -> Result<Vec<StaffRole>, CustomError> {
    let roles = employment_records::table
        .filter(employment_records::user_id.eq(user_id))
        .filter(employment_records::restaurant_id.eq(restaurant_id))
        .filter(employment_records::status.eq(EmploymentStatus::Active))
        .select(employment_records::staff_role)
        .load::<StaffRole>(conn)
        .await?;
    Ok(roles)
}

pub async fn ensure_restaurant_exists(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
) -> Result<(), CustomError> {
    restaurants::table
        .find(restaurant_id)
        .select(restaurants::id)
        .first::<Uuid>(conn)
        .await
        .optional()?
        .map(|_| ())
        .ok_or_else(|| CustomError::NotFound("Restaurant not found".to_string()))
}
