use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::jwt::AuthMember,
    email::{self, EmailEvent},
    loyalty::{
        dto::{Pagination, PurchaseRequest, PurchaseResponse, RedeemRequest, RedeemResponse},
        repo::Purchase,
        tiers::{self, TierSpec, TIERS},
    },
    members::{cache, repo::{Activity, Member}},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/loyalty/tiers", get(list_tiers))
}

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/loyalty/purchases", post(record_purchase))
        .route("/loyalty/redeem", post(redeem_discount))
        .route("/me/purchases", get(list_my_purchases))
}

/// The static tier table, public so the storefront can render it.
pub async fn list_tiers() -> Json<[TierSpec; 5]> {
    Json(TIERS)
}

#[instrument(skip(state, payload))]
pub async fn record_purchase(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, (StatusCode, String)> {
    if !payload.amount.is_finite() || payload.amount <= 0.0 {
        return Err((StatusCode::BAD_REQUEST, "Amount must be positive".into()));
    }

    let member = cache::load_member(&state, member_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "Member not found".to_string()))?;

    let earned = tiers::points_for_purchase(payload.amount, member.tier);
    let new_points = member.points + earned;
    let new_tier = tiers::tier_for_points(new_points);
    let tier_changed = new_tier != member.tier;

    let updated = Member::update_loyalty(
        &state.db,
        member.id,
        new_points,
        new_tier,
        member.total_spent + payload.amount,
    )
    .await
    .map_err(internal)?;
    state.members.put(&updated);

    Purchase::create(&state.db, member.id, payload.amount, earned)
        .await
        .map_err(internal)?;

    if let Err(e) = Activity::record(
        &state.db,
        member.id,
        "purchase",
        &format!("Earned {} points on a {:.2} purchase", earned, payload.amount),
    )
    .await
    {
        warn!(error = %e, member_id = %member.id, "purchase activity not recorded");
    }

    email::notify(
        &state,
        &updated.email,
        EmailEvent::PointsEarned {
            name: updated.name.clone(),
            points: earned,
            balance: updated.points,
        },
    )
    .await;

    if tier_changed {
        if let Err(e) = Activity::record(
            &state.db,
            member.id,
            "tier_upgrade",
            &format!("Reached {} status", new_tier),
        )
        .await
        {
            warn!(error = %e, member_id = %member.id, "tier activity not recorded");
        }
        email::notify(
            &state,
            &updated.email,
            EmailEvent::TierUpgrade {
                name: updated.name.clone(),
                tier: new_tier,
            },
        )
        .await;
    }

    info!(
        member_id = %member.id,
        amount = payload.amount,
        earned,
        tier = %updated.tier,
        "purchase recorded"
    );
    Ok(Json(PurchaseResponse {
        points_earned: earned,
        points_balance: updated.points,
        tier: updated.tier,
        tier_changed,
    }))
}

#[instrument(skip(state, payload))]
pub async fn redeem_discount(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, (StatusCode, String)> {
    let member = cache::load_member(&state, member_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "Member not found".to_string()))?;

    let discount = tiers::discount_for_points(payload.points, member.points, member.tier)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let new_points = member.points - discount.points_used;
    let new_tier = tiers::tier_for_points(new_points);

    let updated = Member::update_loyalty(
        &state.db,
        member.id,
        new_points,
        new_tier,
        member.total_spent,
    )
    .await
    .map_err(internal)?;
    state.members.put(&updated);

    if let Err(e) = Activity::record(
        &state.db,
        member.id,
        "discount",
        &format!(
            "Redeemed {} points for a {:.1}% discount",
            discount.points_used, discount.percent
        ),
    )
    .await
    {
        warn!(error = %e, member_id = %member.id, "redeem activity not recorded");
    }

    info!(
        member_id = %member.id,
        points_used = discount.points_used,
        percent = discount.percent,
        "discount redeemed"
    );
    Ok(Json(RedeemResponse {
        points_used: discount.points_used,
        discount_percent: discount.percent,
        remaining_points: updated.points,
        tier: updated.tier,
    }))
}

#[instrument(skip(state))]
pub async fn list_my_purchases(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Purchase>>, (StatusCode, String)> {
    let rows = Purchase::list_by_member(&state.db, member_id, p.limit, p.offset)
        .await
        .map_err(|e| {
            error!(error = %e, member_id = %member_id, "purchase lookup failed");
            internal(e)
        })?;
    Ok(Json(rows))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
