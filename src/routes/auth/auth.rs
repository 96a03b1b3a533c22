use super::validate_user::validate_credentials;
use crate::auth_jwt::auth::create_jwt;
use crate::config::configuration::JwtSettings;
use crate::db::PgPool;
use crate::db_models::{NewUser, UserProfile};
use crate::domain::Role;
use crate::errors::custom::{AuthError, CustomError};
use crate::schema::users;
use crate::session_state::TypedSession;
use crate::validations::credentials::Password;
use crate::validations::name_email::{PersonName, PhoneNumber, UserEmail};
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    phone: Option<String>,
}

#[derive(Debug)]
pub struct ValidRegistration {
    pub name: PersonName,
    pub email: UserEmail,
    pub password: Password,
    pub phone: Option<PhoneNumber>,
}

impl RegisterBody {
    pub fn validate(self) -> Result<ValidRegistration, String> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty()
        {
            return Err("Name, email and password required".to_string());
        }
        Ok(ValidRegistration {
            name: PersonName::parse(self.name)?,
            email: UserEmail::parse(self.email)?,
            password: Password::parse(self.password)?,
            phone: PhoneNumber::parse_optional(self.phone)?,
        })
    }
}

#[derive(Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Hashes `password` on the blocking pool and inserts a user row with `role`.
/// Shared by self-registration, staff hiring, and test seeding.
pub async fn insert_user(
    conn: &mut AsyncPgConnection,
    user: ValidRegistration,
    role: Role,
) -> Result<UserProfile, CustomError> {
    let ValidRegistration {
        name,
        email,
        password,
        phone,
    } = user;
    let password_hashed = web::block(move || password.hash())
        .await?
        .map_err(|err| CustomError::HashingError(err.to_string()))?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        email: email.as_ref(),
        full_name: name.as_ref(),
        phone: phone.as_ref().map(|p| p.as_ref()),
        password_hash: &password_hashed,
        role,
    };
    diesel::insert_into(users::table)
        .values(&new_user)
        .returning(UserProfile::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                CustomError::Conflict(format!("{} is already registered", email.as_ref()))
            }
            other => other.into(),
        })
}

/******************************************/
// Registering User Route
/******************************************/
/**
 * @route   POST /auth/register
 * @access  Public
 */
#[instrument(name = "Register a new customer", skip(req_user, pool), fields(email = %req_user.email))]
pub async fn register(
    pool: web::Data<PgPool>,
    req_user: web::Json<RegisterBody>,
) -> Result<HttpResponse, CustomError> {
    let registration = req_user
        .into_inner()
        .validate()
        .map_err(CustomError::ValidationError)?;
    let mut conn = pool.get().await?;
    let user = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move { insert_user(conn, registration, Role::Customer).await }.scope_boxed()
        })
        .await?;
    tracing::info!(user_id = %user.id, "Customer registered");
    Ok(HttpResponse::Created().json(json!({"success": true, "user": user})))
}

/******************************************/
// Login Route
/******************************************/
/**
 * @route   POST /auth/login
 * @access  Public
 */
#[instrument(name = "Login a user", skip(req_login, pool, session, jwt), fields(email = %req_login.email))]
pub async fn login(
    pool: web::Data<PgPool>,
    jwt: web::Data<JwtSettings>,
    req_login: web::Json<LoginBody>,
    session: TypedSession,
) -> Result<HttpResponse, CustomError> {
    let LoginBody { email, password } = req_login.into_inner();
    if email.trim().is_empty() || password.is_empty() {
        return Err(CustomError::ValidationError(
            "Email and password required".to_string(),
        ));
    }
    let mut conn = pool.get().await?;
    let user = validate_credentials(&mut conn, &email, password).await?;

    let token = create_jwt(user.id, user.role, &jwt)
        .map_err(|err| CustomError::AuthenticationError(AuthError::JwtAuthenticationError(err)))?;
    session.renew();
    session.insert_user_id(user.id).map_err(|err| {
        CustomError::AuthenticationError(AuthError::SessionAuthenticationError(err.to_string()))
    })?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "token": token, "user": user})))
}

/******************************************/
// Logout Route
/******************************************/
/**
 * @route   POST /api/auth/logout
 * @access  JWT Protected
 */
#[instrument(name = "Logout a user", skip(session))]
pub async fn logout(session: TypedSession) -> HttpResponse {
    session.log_out();
    HttpResponse::Ok().json(json!({"success": true, "message": "Logged out"}))
}
