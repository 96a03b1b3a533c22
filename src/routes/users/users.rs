use crate::db::PgPool;
use crate::db_models::UserProfile;
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::schema::users;
use crate::validations::name_email::{PersonName, PhoneNumber};
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

#[derive(Deserialize)]
pub struct UpdateProfileBody {
    full_name: String,
    phone: Option<String>,
}

impl UpdateProfileBody {
    pub fn validate(self) -> Result<(PersonName, Option<PhoneNumber>), String> {
        let name = PersonName::parse(self.full_name)?;
        let phone = PhoneNumber::parse_optional(self.phone)?;
        Ok((name, phone))
    }
}

/******************************************/
// View Profile Route
/******************************************/
/**
 * @route   GET /api/profile
 * @access  JWT Protected
 */
#[instrument(name = "Get profile", skip(pool, user), fields(user_id = %user.id))]
pub async fn view_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let mut conn = pool.get().await?;
    let profile = users::table
        .find(user.id)
        .select(UserProfile::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("User not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "user": profile})))
}

/******************************************/
// Updating Profile Route
/******************************************/
/**
 * @route   PUT /api/profile
 * @access  JWT Protected
 */
#[instrument(name = "Update profile", skip(req_user, pool, user), fields(user_id = %user.id))]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    req_user: web::Json<UpdateProfileBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    let (name, phone) = req_user
        .into_inner()
        .validate()
        .map_err(CustomError::ValidationError)?;
    let phone: Option<&str> = phone.as_ref().map(|p| p.as_ref());
    let mut conn = pool.get().await?;
    let profile = diesel::update(users::table.find(user.id))
        .set((
            users::full_name.eq(name.as_ref()),
            users::phone.eq(phone),
        ))
        .returning(UserProfile::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("User not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "user": profile})))
}
