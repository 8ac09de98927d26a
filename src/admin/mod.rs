use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Router,
};
use tracing::warn;

pub mod handlers;

use crate::{
    auth::jwt::AuthMember,
    members::{cache, repo::Member},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}

/// Authenticated member with the admin flag set. Anything else is a 403.
pub struct AdminMember(pub Member);

#[async_trait]
impl FromRequestParts<AppState> for AdminMember {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthMember(member_id) = AuthMember::from_request_parts(parts, state).await?;

        let member = cache::load_member(state, member_id)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
            .ok_or((StatusCode::UNAUTHORIZED, "Member not found".to_string()))?;

        if !member.is_admin {
            warn!(member_id = %member.id, "admin route denied");
            return Err((StatusCode::FORBIDDEN, "Admin access required".into()));
        }

        Ok(AdminMember(member))
    }
}
