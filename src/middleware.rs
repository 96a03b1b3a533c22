use crate::auth_jwt::auth::verify_jwt;
use crate::config::configuration::JwtSettings;
use crate::domain::Role;
use crate::db::PgPool;
use crate::errors::custom::{AuthError, CustomError, DbError};
use crate::schema::users;
use crate::session_state::TypedSession;
use actix_session::SessionExt;
use actix_web::body::MessageBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use actix_web_lab::middleware::Next;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::future::{ready, Ready};
use uuid::Uuid;

/// Identity of the caller, placed in request extensions by [`jwt_auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), CustomError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(CustomError::Forbidden(format!(
                "{} is not allowed to perform this action",
                self.role
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = CustomError;
    type Future = Ready<Result<AuthenticatedUser, CustomError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied().ok_or(
            CustomError::AuthenticationError(AuthError::OtherAuthenticationError(
                "User not logged in".to_string(),
            )),
        );
        ready(user)
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<String, CustomError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            CustomError::AuthenticationError(AuthError::JwtAuthenticationError(
                "Missing bearer token".to_string(),
            ))
        })
}

/// Role as stored now; appointments and demotions apply to tokens already issued.
async fn current_role(pool: &PgPool, user_id: Uuid) -> Result<Role, CustomError> {
    let mut conn = pool.get().await?;
    users::table
        .find(user_id)
        .select(users::role)
        .first::<Role>(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| {
            CustomError::AuthenticationError(AuthError::OtherAuthenticationError(
                "Account no longer exists".to_string(),
            ))
        })
}

/******************************************/
// JWT + session guard for the /api scope
/******************************************/
/// A request passes when the bearer token verifies and the server session
/// still belongs to the token's subject; logging out purges the session and
/// therefore retires the token. The role is read from the database, not the
/// token.
pub async fn jwt_auth_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let jwt_settings = req
        .app_data::<web::Data<JwtSettings>>()
        .cloned()
        .ok_or_else(|| {
            CustomError::AuthenticationError(AuthError::OtherAuthenticationError(
                "JWT settings are not configured".to_string(),
            ))
        })?;
    let token = bearer_token(req.headers())?;
    let claims = verify_jwt(&token, &jwt_settings).map_err(|err| {
        CustomError::AuthenticationError(AuthError::JwtAuthenticationError(err))
    })?;

    let session = TypedSession::new(req.get_session());
    let session_user = session.get_user_id().map_err(|err| {
        CustomError::AuthenticationError(AuthError::SessionAuthenticationError(err.to_string()))
    })?;
    if session_user != Some(claims.sub) {
        tracing::warn!(user_id = %claims.sub, "Token presented without a live session");
        return Err(CustomError::AuthenticationError(
            AuthError::SessionAuthenticationError("Session expired or logged out".to_string()),
        )
        .into());
    }

    let pool = req.app_data::<web::Data<PgPool>>().cloned().ok_or_else(|| {
        CustomError::DatabaseError(DbError::ConnectionError(
            "Database pool is not configured".to_string(),
        ))
    })?;
    let role = current_role(&pool, claims.sub).await?;
    if role != claims.role {
        tracing::info!(user_id = %claims.sub, token_role = %claims.role, %role, "Role changed since login");
    }

    req.extensions_mut().insert(AuthenticatedUser {
        id: claims.sub,
        role,
    });
    next.call(req).await
}
