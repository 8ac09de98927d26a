use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    admin::AdminMember,
    loyalty::{dto::Pagination, tiers::{tier_for_points, Tier}},
    members::repo::{Activity, Member},
    newsletter::repo::Subscription,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/members", get(list_members))
        .route("/admin/members/:id/points", post(adjust_points))
        .route("/admin/stats", get(stats))
        .route("/admin/newsletter", get(list_newsletter))
}

/// Roster entry for the admin panel.
#[derive(Debug, Serialize)]
pub struct MemberOverview {
    pub id: Uuid,
    pub jc_id: String,
    pub email: String,
    pub name: String,
    pub points: i64,
    pub tier: Tier,
    pub total_spent: f64,
    pub is_admin: bool,
    pub created_at: time::OffsetDateTime,
}

impl From<Member> for MemberOverview {
    fn from(m: Member) -> Self {
        Self {
            id: m.id,
            jc_id: m.jc_id,
            email: m.email,
            name: m.name,
            points: m.points,
            tier: m.tier,
            total_spent: m.total_spent,
            is_admin: m.is_admin,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustPointsRequest {
    pub delta: i64,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct AdjustPointsResponse {
    pub points_balance: i64,
    pub tier: Tier,
}

#[derive(Debug, Serialize)]
pub struct TierCount {
    pub tier: Tier,
    pub members: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub members: i64,
    pub points_outstanding: i64,
    pub total_spent: f64,
    pub tiers: Vec<TierCount>,
    pub newsletter_active: i64,
}

#[instrument(skip(state, _admin))]
pub async fn list_members(
    State(state): State<AppState>,
    _admin: AdminMember,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MemberOverview>>, (StatusCode, String)> {
    let members = Member::list(&state.db, p.limit, p.offset).await.map_err(|e| {
        error!(error = %e, "member listing failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(members.into_iter().map(MemberOverview::from).collect()))
}

#[instrument(skip(state, admin, payload))]
pub async fn adjust_points(
    State(state): State<AppState>,
    admin: AdminMember,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustPointsRequest>,
) -> Result<Json<AdjustPointsResponse>, (StatusCode, String)> {
    if payload.reason.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Reason is required".into()));
    }

    let member = Member::find_by_id(&state.db, id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Member not found".to_string()))?;

    // balances never go negative
    let new_points = (member.points + payload.delta).max(0);
    let new_tier = tier_for_points(new_points);

    let updated = Member::update_loyalty(
        &state.db,
        member.id,
        new_points,
        new_tier,
        member.total_spent,
    )
    .await
    .map_err(|e| {
        error!(error = %e, member_id = %member.id, "points adjustment failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    state.members.put(&updated);

    if let Err(e) = Activity::record(
        &state.db,
        updated.id,
        "adjustment",
        &format!("Points adjusted by {}: {}", payload.delta, payload.reason.trim()),
    )
    .await
    {
        warn!(error = %e, member_id = %updated.id, "adjustment activity not recorded");
    }

    info!(
        admin_id = %admin.0.id,
        member_id = %updated.id,
        delta = payload.delta,
        "points adjusted"
    );
    Ok(Json(AdjustPointsResponse {
        points_balance: updated.points,
        tier: updated.tier,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminMember,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let (members, points_outstanding, total_spent) = sqlx::query_as::<_, (i64, i64, f64)>(
        "SELECT COUNT(*), COALESCE(SUM(points), 0)::BIGINT, COALESCE(SUM(total_spent), 0) \
         FROM members",
    )
    .fetch_one(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let tier_rows = sqlx::query_as::<_, (Tier, i64)>(
        "SELECT tier, COUNT(*) FROM members GROUP BY tier",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let newsletter_active = Subscription::count_active(&state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(StatsResponse {
        members,
        points_outstanding,
        total_spent,
        tiers: tier_rows
            .into_iter()
            .map(|(tier, members)| TierCount { tier, members })
            .collect(),
        newsletter_active,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_newsletter(
    State(state): State<AppState>,
    _admin: AdminMember,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Subscription>>, (StatusCode, String)> {
    let rows = Subscription::list(&state.db, p.limit, p.offset)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(rows))
}
