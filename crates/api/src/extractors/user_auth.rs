//! Bearer token authentication extractor.
//!
//! Validates the session token and resolves its subject against the user
//! directory, yielding the [`UserContext`] every lending operation runs as.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::UserContext;
use persistence::repositories::UserRepository;
use shared::jwt::{extract_org_id, extract_user_id, JwtError};

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserContext);

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = bearer_token(auth_header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = state.jwt.validate_token(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        })?;

        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;
        let org_claim = extract_org_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid organization claim".to_string()))?;

        let user: UserContext = UserRepository::new(state.pool.clone())
            .find_active(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown or inactive user".to_string()))?
            .into();

        if let Some(org_id) = org_claim {
            if org_id != user.organization_id {
                tracing::warn!(
                    user_id = %user.id,
                    claimed_org = %org_id,
                    "Token organization does not match directory"
                );
                return Err(ApiError::Unauthorized(
                    "Token is not valid for this organization".to_string(),
                ));
            }
        }

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}
