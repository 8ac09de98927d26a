use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::loyalty::tiers::Tier;
use crate::members::repo::Member;

/// Request body for member registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub referral_code: Option<String>,
}

/// Request body for login. `login` is either the JC ID or the email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Request body for Google sign-in. `credential` is the ID token issued by
/// the identity provider.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub credential: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response returned after register, login, google or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub member: PublicMember,
}

/// Member fields exposed to the client.
#[derive(Debug, Serialize)]
pub struct PublicMember {
    pub id: Uuid,
    pub jc_id: String,
    pub email: String,
    pub name: String,
    pub points: i64,
    pub tier: Tier,
    pub total_spent: f64,
    pub referral_code: String,
    pub created_at: OffsetDateTime,
}

impl From<&Member> for PublicMember {
    fn from(m: &Member) -> Self {
        Self {
            id: m.id,
            jc_id: m.jc_id.clone(),
            email: m.email.clone(),
            name: m.name.clone(),
            points: m.points,
            tier: m.tier,
            total_spent: m.total_spent,
            referral_code: m.referral_code.clone(),
            created_at: m.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_member_serialization() {
        let member = Member {
            id: Uuid::new_v4(),
            jc_id: "JC424242".into(),
            email: "lee@example.com".into(),
            name: "Lee".into(),
            password_hash: Some("hash".into()),
            google_id: None,
            points: 150,
            tier: Tier::Bronze,
            total_spent: 1200.0,
            referral_code: "REF00042".into(),
            referred_by: None,
            is_admin: false,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&PublicMember::from(&member)).unwrap();
        assert!(json.contains("JC424242"));
        assert!(json.contains("BRONZE"));
        assert!(!json.contains("hash"));
    }
}
