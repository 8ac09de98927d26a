use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthMember,
    email::{self, EmailEvent},
    loyalty::tiers::{tier_for_points, REFERRAL_BONUS},
    members::repo::{Activity, Member},
    state::AppState,
};

pub mod repo;

use repo::Referral;

pub fn router() -> Router<AppState> {
    Router::new().route("/me/referrals", get(list_my_referrals))
}

/// Credit the referrer for a qualifying signup: fixed bonus, tier recompute,
/// referral record, activity entry and a notification. Best-effort; a failure
/// here never blocks the signup that triggered it.
pub async fn grant_signup_bonus(state: &AppState, referrer: &Member, referred: &Member) {
    let new_points = referrer.points + REFERRAL_BONUS;
    let new_tier = tier_for_points(new_points);

    let updated = match Member::update_loyalty(
        &state.db,
        referrer.id,
        new_points,
        new_tier,
        referrer.total_spent,
    )
    .await
    {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, referrer_id = %referrer.id, "referral bonus not credited");
            return;
        }
    };
    state.members.put(&updated);

    if let Err(e) = Referral::create(&state.db, referrer.id, referred.id, REFERRAL_BONUS).await {
        error!(error = %e, referrer_id = %referrer.id, "referral record not written");
    }
    if let Err(e) = Activity::record(
        &state.db,
        referrer.id,
        "referral",
        &format!("Referral bonus: {} joined with your code", referred.jc_id),
    )
    .await
    {
        warn!(error = %e, referrer_id = %referrer.id, "referral activity not recorded");
    }

    email::notify(
        state,
        &updated.email,
        EmailEvent::ReferralBonus {
            name: updated.name.clone(),
            bonus: REFERRAL_BONUS,
            balance: updated.points,
        },
    )
    .await;

    if new_tier != referrer.tier {
        email::notify(
            state,
            &updated.email,
            EmailEvent::TierUpgrade {
                name: updated.name.clone(),
                tier: new_tier,
            },
        )
        .await;
    }

    info!(
        referrer_id = %referrer.id,
        referred_id = %referred.id,
        bonus = REFERRAL_BONUS,
        "referral bonus credited"
    );
}

#[instrument(skip(state))]
pub async fn list_my_referrals(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
) -> Result<Json<Vec<Referral>>, (StatusCode, String)> {
    let rows = Referral::list_by_referrer(&state.db, member_id)
        .await
        .map_err(|e| {
            error!(error = %e, member_id = %member_id, "referral lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    Ok(Json(rows))
}
