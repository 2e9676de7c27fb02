//! Signup, login and protected-access flows.
//!
//! `AuthService` is built once at startup and shared with every handler
//! through `web::Data`; it owns the store, the hasher and the signing key.

use std::sync::Arc;

use chrono::Duration;

use crate::auth::TokenService;
use crate::config::EnvConfig;
use crate::db::{InMemoryUserStore, JsonFileUserStore, UserStore};
use crate::error::AppError;
use crate::models::{Claims, LoginRequest, SignupRequest, User};
use crate::password::PasswordHasher;
use crate::validation::{check_login, check_signup};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService, hasher: PasswordHasher) -> Self {
        AuthService {
            store,
            tokens,
            hasher,
        }
    }

    pub async fn from_config(config: &EnvConfig) -> Result<Self, AppError> {
        let store: Arc<dyn UserStore> = match &config.user_store_path {
            Some(path) => Arc::new(JsonFileUserStore::open(path).await?),
            None => {
                log::warn!("USER_STORE_PATH not set, users are kept in memory only");
                Arc::new(InMemoryUserStore::new())
            }
        };
        let tokens = TokenService::new(
            config.jwt_secret.as_bytes(),
            Duration::minutes(i64::from(config.token_ttl_minutes)),
        );
        let hasher = PasswordHasher::new(config.bcrypt_cost)?;
        Ok(AuthService::new(store, tokens, hasher))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// A taken username outranks a missing one, which outranks any other field error.
    pub async fn signup(&self, req: SignupRequest) -> Result<User, AppError> {
        let check = check_signup(&req);

        if let Some(username) = &check.username {
            if self.store.exists(username).await? {
                return Err(AppError::UserAlreadyExists);
            }
        }
        if check.username_missing {
            return Err(AppError::UsernameRequired);
        }
        let new_user = check.into_new_user().map_err(AppError::InvalidInput)?;

        let password_hash = self.hasher.hash(new_user.password).await?;
        let user = User {
            username: new_user.username,
            email: new_user.email,
            password_hash,
        };
        self.store.insert(user.clone()).await?;

        log::info!("registered user {}", user.username);
        Ok(user)
    }

    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<String, AppError> {
        let (username, password) = check_login(&req).map_err(AppError::InvalidInput)?;

        let stored_hash = self
            .store
            .find(&username)
            .await?
            .map(|user| user.password_hash);
        if !self.hasher.verify(password, stored_hash).await? {
            log::warn!("failed login for {username}");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.create_jwt(&username)?;
        log::info!("issued token for {username}");
        Ok(token)
    }

    /// Confirms that verified claims still name a stored user.
    pub async fn authorize(&self, claims: &Claims) -> Result<User, AppError> {
        self.store
            .find(&claims.sub)
            .await?
            .ok_or_else(|| AppError::UnknownSubject(claims.sub.clone()))
    }
}
