use crate::config::configuration::JwtSettings;
use crate::domain::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

pub fn create_jwt(user_id: Uuid, role: Role, settings: &JwtSettings) -> Result<String, String> {
    let now = Utc::now();
    let expiration_time = (now + Duration::hours(settings.expiry_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        role,
        exp: expiration_time,
        iat: now.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key).map_err(|err| err.to_string())
}

/// Checks signature and expiry.
pub fn verify_jwt(token: &str, settings: &JwtSettings) -> Result<Claims, String> {
    let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());
    let validation = Validation::default();
    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|err| err.to_string())?;
    Ok(token_data.claims)
}
