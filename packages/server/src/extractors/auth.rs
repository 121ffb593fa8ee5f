use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use ballot_common::SessionState;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::profile;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated profile extracted from the `Authorization: Bearer <token>` header.
///
/// The profile is reloaded on every request, so an admin flag changed after the
/// token was issued applies immediately and a deleted profile loses access.
/// Use `Option<AuthUser>` where a guest is also acceptable.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl AuthUser {
    /// Returns `Ok(())` for administrators, `Err(PermissionDenied)` otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Admins may act on any profile; voters only on their own.
    pub fn require_self_or_admin(&self, profile_id: Uuid) -> Result<(), AppError> {
        if self.is_admin || self.profile_id == profile_id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn session(&self) -> SessionState {
        SessionState::from_profile(self.is_admin)
    }
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)?;

    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

    let profile = profile::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    Ok(AuthUser {
        profile_id: profile.id,
        email: profile.email,
        is_admin: profile.is_admin,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    /// Missing, malformed or stale tokens yield a guest rather than an error.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::TokenMissing | AppError::TokenInvalid) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
