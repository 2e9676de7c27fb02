//! Failure taxonomy and the JSON error envelope returned to clients.
//!
//! Every handler returns `Result<_, AppError>`; actix renders the error through
//! [`ResponseError`] as `{"error": {"code", "message", "details"?}}`.

use std::collections::BTreeMap;

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name to the list of messages describing what is wrong with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        errors
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("username already taken")]
    UserAlreadyExists,
    #[error("username missing")]
    UsernameRequired,
    #[error("invalid input: {0:?}")]
    InvalidInput(FieldErrors),
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authorization header missing")]
    TokenNotFound,
    #[error("authorization header is not a bearer credential")]
    MalformedToken,
    #[error("token rejected: {0}")]
    InvalidToken(String),
    #[error("token subject {0} does not exist")]
    UnknownSubject(String),
    #[error("token expired")]
    TokenExpired,

    // infra
    #[error(transparent)]
    Store(StoreError),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => AppError::UserAlreadyExists,
            other => AppError::Store(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a FieldErrors>,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::UsernameRequired => "USERNAME_REQUIRED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::MalformedToken | Self::InvalidToken(_) | Self::UnknownSubject(_) => {
                "INVALID_TOKEN"
            }
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Store(_) | Self::Hash(_) | Self::Signing(_) | Self::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::UserAlreadyExists => "A user with that username already exists.",
            Self::UsernameRequired => "Please enter a username.",
            Self::InvalidInput(_) => "The input contains invalid values.",
            Self::InvalidCredentials => "Incorrect username or password.",
            Self::TokenNotFound => "No token was provided.",
            Self::MalformedToken => "The token is not valid.",
            Self::InvalidToken(_) => "The token failed verification.",
            Self::UnknownSubject(_) => "The token does not match any user.",
            Self::TokenExpired => "The token has expired.",
            Self::Store(_) | Self::Hash(_) | Self::Signing(_) | Self::Internal(_) => {
                "Internal server error."
            }
        }
    }

    pub fn details(&self) -> Option<&FieldErrors> {
        match self {
            Self::InvalidInput(details) => Some(details),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UserAlreadyExists
            | Self::UsernameRequired
            | Self::InvalidInput(_)
            | Self::TokenNotFound
            | Self::MalformedToken => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::InvalidToken(_)
            | Self::UnknownSubject(_)
            | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Store(_) | Self::Hash(_) | Self::Signing(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("request failed: {self}");
        }
        HttpResponse::build(self.status_code()).json(ErrorEnvelope {
            error: ErrorBody {
                code: self.code(),
                message: self.message(),
                details: self.details(),
            },
        })
    }
}

/// Turns body deserialisation failures into `INVALID_INPUT` instead of actix's plain-text 400.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Request body must be JSON.".to_string(),
        JsonPayloadError::Deserialize(inner) => format!("Malformed JSON body: {inner}"),
        other => other.to_string(),
    };
    AppError::InvalidInput(FieldErrors::single(NON_FIELD_ERRORS, message)).into()
}
