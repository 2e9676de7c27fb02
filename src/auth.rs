use std::future::{ready, Ready};

use actix_web::http::header::{HeaderValue, AUTHORIZATION};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Bearer, Scheme};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::AppError;
use crate::models::Claims;
use crate::service::AuthService;

/// Issues and verifies HS256 access tokens with a fixed lifetime.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // exp is exclusive: a token is dead from its expiry second onwards
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.set_required_spec_claims(&["exp", "sub"]);

        TokenService {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn create_jwt(&self, username: &str) -> Result<String, AppError> {
        self.create_jwt_at(username, Utc::now())
    }

    pub fn create_jwt_at(&self, username: &str, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let expiration = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("token expiry overflows".to_string()))?;

        let claims = Claims {
            sub: username.to_owned(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AppError::Signing)
    }

    /// Signature is checked before expiry, so a forged expired token is
    /// reported as invalid rather than expired.
    pub fn validate_jwt(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                other => AppError::InvalidToken(format!("{other:?}")),
            })
    }

    /// Absence is checked first, then the `Bearer ` scheme, then the token itself.
    pub fn validate_header(&self, header: Option<&HeaderValue>) -> Result<Claims, AppError> {
        let credentials = bearer_credentials(header)?;
        self.validate_jwt(credentials.token())
    }
}

pub fn bearer_credentials(header: Option<&HeaderValue>) -> Result<Bearer, AppError> {
    let header = header.ok_or(AppError::TokenNotFound)?;
    let credentials = Bearer::parse(header).map_err(|_| AppError::MalformedToken)?;
    if credentials.token().trim().is_empty() {
        return Err(AppError::MalformedToken);
    }
    Ok(credentials)
}

/// Extractor for handlers that require a valid bearer token.
///
/// Only the token is checked here; whether the subject still exists is up to
/// the handler.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AuthService>>() {
            Some(service) => service
                .tokens()
                .validate_header(req.headers().get(AUTHORIZATION))
                .map(|claims| AuthenticatedUser { claims }),
            None => Err(AppError::Internal("auth service not configured".to_string())),
        };
        if let Err(err) = &result {
            log::debug!("rejected {} {}: {err}", req.method(), req.path());
        }
        ready(result)
    }
}
