//! # Bearer Authentication
//!
//! The stub trusts the bearer token as the caller's user id; there is no
//! identity provider behind it. [`Bearer`] extracts only the id (used when
//! an account creates itself on first sign-in). [`Caller`] additionally
//! resolves the account and its role, and refuses deactivated accounts.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header;
use pyro_client::Account;
use pyro_core::{Action, Role, Service, UserId};

use crate::error::AppError;
use crate::store::AppState;

/// The user id carried by `Authorization: Bearer <id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bearer(pub UserId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Bearer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".into()))?;
        UserId::new(token.trim())
            .map(Bearer)
            .map_err(|_| AppError::Unauthorized("empty bearer token".into()))
    }
}

/// An authenticated, active account.
#[derive(Debug, Clone)]
pub struct Caller {
    pub account: Account,
}

impl Caller {
    pub fn id(&self) -> &UserId {
        &self.account.user_id
    }

    pub fn role(&self) -> Role {
        self.account.current_role
    }

    pub fn county(&self) -> Option<&str> {
        self.account.county.as_deref()
    }

    /// 403 unless the permission table grants `action` on `service`.
    pub fn require(&self, state: &AppState, service: Service, action: Action) -> Result<(), AppError> {
        if state.permissions().is_allowed(service, self.role(), action) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role '{}' may not {action} {service}",
                self.role()
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role() == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role 'admin' required, caller has '{}'",
                self.role()
            )))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Bearer(user_id) = Bearer::from_request_parts(parts, state).await?;
        let account = state
            .users()
            .get(&user_id)
            .map(|a| a.value().clone())
            .ok_or_else(|| AppError::Unauthorized(format!("no account for '{user_id}'")))?;
        if !account.active {
            return Err(AppError::Forbidden(format!("account '{user_id}' is deactivated")));
        }
        Ok(Self { account })
    }
}
