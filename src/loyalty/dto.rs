use serde::{Deserialize, Serialize};

use crate::loyalty::tiers::Tier;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub points_earned: i64,
    pub points_balance: i64,
    pub tier: Tier,
    pub tier_changed: bool,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub points: i64,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub points_used: i64,
    pub discount_percent: f64,
    pub remaining_points: i64,
    pub tier: Tier,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_response_serialization() {
        let response = PurchaseResponse {
            points_earned: 12,
            points_balance: 112,
            tier: Tier::Bronze,
            tier_changed: true,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"points_earned\":12"));
        assert!(json.contains("BRONZE"));
        assert!(json.contains("\"tier_changed\":true"));
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 0);
    }
}
