use crate::db_models::UserProfile;
use crate::errors::custom::{AuthError, CustomError};
use crate::schema::users;
use crate::validations::credentials::verify_password;
use actix_web::web;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;

#[instrument(name = "Get stored credentials", skip(email, conn), fields(email = %email))]
async fn get_stored_credentials(
    email: &str,
    conn: &mut AsyncPgConnection,
) -> Result<(UserProfile, String), CustomError> {
    users::table
        .filter(users::email.eq(email.trim().to_lowercase()))
        .select((UserProfile::as_select(), users::password_hash))
        .first::<(UserProfile, String)>(conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("User not found".to_string()))
}

/// Looks the user up by email and checks the password on the blocking pool.
#[instrument(name = "Validate credentials", skip(conn, email, password), fields(email = %email))]
pub async fn validate_credentials(
    conn: &mut AsyncPgConnection,
    email: &str,
    password: String,
) -> Result<UserProfile, CustomError> {
    let (user, stored_password_hash) = get_stored_credentials(email, conn).await?;

    let is_valid =
        web::block(move || verify_password(&stored_password_hash, &password)).await?;
    if is_valid {
        Ok(user)
    } else {
        tracing::info!(user_id = %user.id, "Password mismatch");
        Err(CustomError::AuthenticationError(
            AuthError::InvalidCredentials,
        ))
    }
}
