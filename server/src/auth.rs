use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::models::role::Role;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Header carrying the caller's user id, set by the authenticating proxy in
/// front of this server.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id_from(parts: &Parts) -> Result<Option<Uuid>, AppError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id = value
        .to_str()
        .ok()
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| AppError::AuthError("Invalid user id header".to_string()))?;
    Ok(Some(user_id))
}

/// Caller identity when the route also serves anonymous callers.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_id_from(parts)?))
    }
}

/// Signed-in caller. Rejects with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id_from(parts)?
            .map(CurrentUser)
            .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
    }
}

/// Caller allowed to manage events and check tickets in.
#[derive(Debug, Clone, Copy)]
pub struct Organizer {
    pub user_id: Uuid,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for Organizer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user_id) = CurrentUser::from_request_parts(parts, state).await?;
        let info = state.roles.resolve(Some(user_id)).await.info;
        match info.role {
            Some(role) if info.can_manage_events => Ok(Organizer { user_id, role }),
            _ => Err(AppError::Forbidden(
                "Organizer or admin role required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Admin {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user_id) = CurrentUser::from_request_parts(parts, state).await?;
        if state.roles.resolve(Some(user_id)).await.info.is_admin {
            Ok(Admin { user_id })
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }
}
