use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, GoogleLoginRequest, LoginRequest, MessageResponse, PasswordResetConfirm,
            PasswordResetRequest, PublicMember, RefreshRequest, RegisterRequest,
        },
        google,
        jwt::{AuthMember, JwtKeys},
        password,
    },
    email::{self, EmailEvent},
    loyalty::tiers::{self, Tier},
    members::{
        cache,
        repo::{Activity, Member, NewMember},
    },
    referrals,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password-reset/request", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/activity", get(get_my_activity))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn sign_pair(
    keys: &JwtKeys,
    member: &Member,
) -> Result<(String, String), (StatusCode, String)> {
    let access_token = keys.sign_access(member.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh_token = keys.sign_refresh(member.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok((access_token, refresh_token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name is required".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    // Ensure email is not taken
    if let Ok(Some(_)) = Member::find_by_email(&state.db, &payload.email).await {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let hash = match password::hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    // Unknown referral codes are ignored; signup still goes through.
    let referrer = match payload.referral_code.as_deref() {
        Some(code) if !code.trim().is_empty() => {
            Member::find_by_referral_code(&state.db, code.trim())
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "referral code lookup failed");
                    None
                })
        }
        _ => None,
    };

    let member = match create_member(
        &state,
        &payload.name,
        &payload.email,
        Some(hash),
        None,
        referrer.as_ref().map(|r| r.id),
    )
    .await
    {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "create member failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if let Some(referrer) = referrer {
        referrals::grant_signup_bonus(&state, &referrer, &member).await;
    }

    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = sign_pair(&keys, &member)?;

    info!(member_id = %member.id, jc_id = %member.jc_id, "member registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        member: PublicMember::from(&member),
    }))
}

/// Insert a member with signup defaults, mirror it, log the signup and send
/// the welcome email. Shared by password and Google registration.
async fn create_member(
    state: &AppState,
    name: &str,
    email_addr: &str,
    password_hash: Option<String>,
    google_id: Option<String>,
    referred_by: Option<uuid::Uuid>,
) -> anyhow::Result<Member> {
    let jc_id = Member::fresh_jc_id(&state.db).await?;
    let referral_code = Member::fresh_referral_code(&state.db).await?;

    let member = Member::create(
        &state.db,
        &NewMember {
            jc_id,
            email: email_addr.to_string(),
            name: name.to_string(),
            password_hash,
            google_id,
            points: tiers::SIGNUP_POINTS,
            tier: Tier::Pearl,
            referral_code,
            referred_by,
        },
    )
    .await?;
    state.members.put(&member);

    if let Err(e) = Activity::record(&state.db, member.id, "signup", "Joined the Jeans Club").await
    {
        warn!(error = %e, member_id = %member.id, "signup activity not recorded");
    }

    email::notify(
        state,
        &member.email,
        EmailEvent::Welcome {
            name: member.name.clone(),
            jc_id: member.jc_id.clone(),
            referral_code: member.referral_code.clone(),
        },
    )
    .await;

    Ok(member)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.login = payload.login.trim().to_string();

    // JC ID first, then email
    let looked_up = match Member::find_by_jc_id(&state.db, &payload.login).await {
        Ok(Some(m)) => Some(m),
        Ok(None) => Member::find_by_email(&state.db, &payload.login.to_lowercase())
            .await
            .map_err(|e| {
                error!(error = %e, "member lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?,
        Err(e) => {
            error!(error = %e, "member lookup failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let member = match looked_up {
        Some(m) => m,
        None => {
            warn!(login = %payload.login, "login unknown member");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
    };

    // Google-only accounts have no password to check against
    let Some(hash) = member.password_hash.as_deref() else {
        warn!(member_id = %member.id, "password login on google-only account");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    };

    let ok = match password::verify_password(&payload.password, hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };
    if !ok {
        warn!(member_id = %member.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    state.members.put(&member);
    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = sign_pair(&keys, &member)?;

    info!(member_id = %member.id, jc_id = %member.jc_id, "member logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        member: PublicMember::from(&member),
    }))
}

#[instrument(skip(state, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let claims = google::decode_credential(
        &payload.credential,
        state.config.google_client_id.as_deref(),
    )
    .map_err(|e| {
        warn!(error = %e, "google credential rejected");
        (StatusCode::UNAUTHORIZED, "Invalid Google credential".to_string())
    })?;

    let email_addr = claims.email.trim().to_lowercase();
    let display_name = claims
        .name
        .clone()
        .unwrap_or_else(|| email_addr.split('@').next().unwrap_or("Member").to_string());

    let member = match Member::find_by_google_id(&state.db, &claims.sub).await {
        Ok(Some(m)) => m,
        Ok(None) => {
            // Existing password account gets the google id linked
            match Member::find_by_email(&state.db, &email_addr).await {
                Ok(Some(existing)) => Member::link_google(&state.db, existing.id, &claims.sub)
                    .await
                    .map_err(|e| {
                        error!(error = %e, "link google id failed");
                        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                    })?,
                Ok(None) => create_member(
                    &state,
                    &display_name,
                    &email_addr,
                    None,
                    Some(claims.sub.clone()),
                    None,
                )
                .await
                .map_err(|e| {
                    error!(error = %e, "create google member failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                })?,
                Err(e) => {
                    error!(error = %e, "member lookup failed");
                    return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
                }
            }
        }
        Err(e) => {
            error!(error = %e, "member lookup failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    state.members.put(&member);
    let keys = JwtKeys::from_ref(&state);
    let (access_token, refresh_token) = sign_pair(&keys, &member)?;

    info!(member_id = %member.id, "google sign-in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        member: PublicMember::from(&member),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("{}", e)))?;

    let member = cache::load_member(&state, claims.sub)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "Member not found".to_string()))?;

    let (access_token, refresh_token) = sign_pair(&keys, &member)?;
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        member: PublicMember::from(&member),
    }))
}

#[instrument(skip(state, payload))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let email_addr = payload.email.trim().to_lowercase();

    // Response is the same whether or not the account exists
    let reply = MessageResponse {
        message: "If the address is registered, a reset code is on its way".into(),
    };

    let member = match Member::find_by_email(&state.db, &email_addr).await {
        Ok(Some(m)) if m.password_hash.is_some() => m,
        Ok(_) => return Ok(Json(reply)),
        Err(e) => {
            error!(error = %e, "member lookup failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let (token, expires_at) = password::new_reset_token();
    if let Err(e) = Member::set_reset_token(&state.db, member.id, &token, expires_at).await {
        error!(error = %e, member_id = %member.id, "storing reset token failed");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    email::notify(
        &state,
        &member.email,
        EmailEvent::PasswordReset {
            name: member.name.clone(),
            token,
        },
    )
    .await;

    info!(member_id = %member.id, "password reset requested");
    Ok(Json(reply))
}

#[instrument(skip(state, payload))]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if payload.new_password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let member = Member::find_by_reset_token(&state.db, payload.token.trim())
        .await
        .map_err(|e| {
            error!(error = %e, "reset token lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .ok_or((StatusCode::BAD_REQUEST, "Invalid or expired token".to_string()))?;

    if password::reset_token_expired(member.reset_token_expires_at) {
        warn!(member_id = %member.id, "expired reset token");
        return Err((StatusCode::BAD_REQUEST, "Invalid or expired token".into()));
    }

    let hash = password::hash_password(&payload.new_password)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let member = Member::set_password(&state.db, member.id, &hash)
        .await
        .map_err(|e| {
            error!(error = %e, "password update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    state.members.put(&member);

    if let Err(e) = Activity::record(&state.db, member.id, "password_reset", "Password changed").await
    {
        warn!(error = %e, member_id = %member.id, "activity not recorded");
    }

    info!(member_id = %member.id, "password reset completed");
    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
) -> Result<Json<PublicMember>, (StatusCode, String)> {
    let member = cache::load_member(&state, member_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "Member not found".to_string()))?;
    Ok(Json(PublicMember::from(&member)))
}

#[instrument(skip(state))]
pub async fn get_my_activity(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
) -> Result<Json<Vec<Activity>>, (StatusCode, String)> {
    let entries = Activity::list_for(&state.db, member_id).await.map_err(|e| {
        error!(error = %e, member_id = %member_id, "activity lookup failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(entries))
}
