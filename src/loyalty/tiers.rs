use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currency units that earn one base point.
pub const POINT_VALUE: f64 = 10.0;
/// Discount percent granted per redeemed point.
pub const REDEMPTION_RATE: f64 = 0.1;
/// Smallest redemption the program accepts.
pub const MIN_REDEEM_POINTS: i64 = 10;
/// Starting balance for a fresh account.
pub const SIGNUP_POINTS: i64 = 10;
/// Credited to the referrer once per qualifying signup.
pub const REFERRAL_BONUS: i64 = 100;

/// Loyalty level. Ordered lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "tier", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Pearl,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TierSpec {
    pub tier: Tier,
    pub threshold: i64,          // cumulative points where the tier starts
    pub multiplier: f64,         // applied to base points per purchase
    pub max_discount_points: i64, // redeemable per discount
}

/// Thresholds are monotonically increasing and contiguous from zero.
pub const TIERS: [TierSpec; 5] = [
    TierSpec { tier: Tier::Pearl, threshold: 0, multiplier: 1.0, max_discount_points: 50 },
    TierSpec { tier: Tier::Bronze, threshold: 100, multiplier: 1.25, max_discount_points: 100 },
    TierSpec { tier: Tier::Silver, threshold: 300, multiplier: 1.5, max_discount_points: 200 },
    TierSpec { tier: Tier::Gold, threshold: 600, multiplier: 1.75, max_discount_points: 300 },
    TierSpec { tier: Tier::Platinum, threshold: 1000, multiplier: 2.0, max_discount_points: 500 },
];

impl Tier {
    pub fn spec(self) -> &'static TierSpec {
        TIERS.iter().find(|s| s.tier == self).unwrap()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Pearl => "PEARL",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest tier whose threshold is at or below `points`.
pub fn tier_for_points(points: i64) -> Tier {
    for spec in TIERS.iter().rev() {
        if points >= spec.threshold {
            return spec.tier;
        }
    }
    Tier::Pearl
}

/// Points earned for a purchase at the member's current tier.
/// Non-positive amounts earn nothing.
pub fn points_for_purchase(amount: f64, tier: Tier) -> i64 {
    if amount <= 0.0 {
        return 0;
    }
    (amount / POINT_VALUE * tier.spec().multiplier).floor() as i64
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedeemError {
    #[error("a discount needs at least 10 points")]
    BelowMinimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Discount {
    pub points_used: i64,
    pub percent: f64,
}

/// Requested points are capped by the tier's per-discount limit and the
/// member's balance before conversion.
pub fn discount_for_points(
    requested: i64,
    member_points: i64,
    tier: Tier,
) -> Result<Discount, RedeemError> {
    let capped = requested
        .min(tier.spec().max_discount_points)
        .min(member_points);
    if capped < MIN_REDEEM_POINTS {
        return Err(RedeemError::BelowMinimum);
    }
    Ok(Discount {
        points_used: capped,
        percent: capped as f64 * REDEMPTION_RATE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier_for_points(0), Tier::Pearl);
        assert_eq!(tier_for_points(99), Tier::Pearl);
        assert_eq!(tier_for_points(100), Tier::Bronze);
        assert_eq!(tier_for_points(299), Tier::Bronze);
        assert_eq!(tier_for_points(300), Tier::Silver);
        assert_eq!(tier_for_points(599), Tier::Silver);
        assert_eq!(tier_for_points(600), Tier::Gold);
        assert_eq!(tier_for_points(999), Tier::Gold);
        assert_eq!(tier_for_points(1000), Tier::Platinum);
        assert_eq!(tier_for_points(1_000_000), Tier::Platinum);
    }

    #[test]
    fn every_balance_falls_in_exactly_one_tier_range() {
        for points in 0..1500 {
            let tier = tier_for_points(points);
            let spec = tier.spec();
            assert!(points >= spec.threshold);
            let next = TIERS.iter().find(|s| s.threshold > spec.threshold);
            if let Some(next) = next {
                assert!(points < next.threshold, "points {} leaked into {}", points, next.tier);
            }
        }
    }

    #[test]
    fn thresholds_increase() {
        for pair in TIERS.windows(2) {
            assert!(pair[0].threshold < pair[1].threshold);
            assert!(pair[0].multiplier < pair[1].multiplier);
        }
    }

    #[test]
    fn purchase_points_floor_and_multiplier() {
        assert_eq!(points_for_purchase(95.0, Tier::Pearl), 9);
        assert_eq!(points_for_purchase(95.0, Tier::Platinum), 19);
        assert_eq!(points_for_purchase(100.0, Tier::Bronze), 12);
        assert_eq!(points_for_purchase(0.0, Tier::Gold), 0);
        assert_eq!(points_for_purchase(-20.0, Tier::Gold), 0);
    }

    #[test]
    fn purchase_points_monotonic_in_amount() {
        let mut last = 0;
        for amount in (0..2000).map(|a| a as f64) {
            let pts = points_for_purchase(amount, Tier::Silver);
            assert!(pts >= last);
            last = pts;
        }
    }

    #[test]
    fn discount_capped_by_tier_and_balance() {
        // tier cap wins
        let d = discount_for_points(10_000, 10_000, Tier::Pearl).unwrap();
        assert_eq!(d.points_used, 50);
        assert!((d.percent - 5.0).abs() < f64::EPSILON);

        // balance wins
        let d = discount_for_points(10_000, 30, Tier::Platinum).unwrap();
        assert_eq!(d.points_used, 30);

        // requested amount wins
        let d = discount_for_points(20, 500, Tier::Platinum).unwrap();
        assert_eq!(d.points_used, 20);
    }

    #[test]
    fn discount_never_exceeds_tier_maximum() {
        for spec in TIERS.iter() {
            let d = discount_for_points(i64::MAX, i64::MAX, spec.tier).unwrap();
            assert!(d.points_used <= spec.max_discount_points);
            assert!(d.percent <= spec.max_discount_points as f64 * REDEMPTION_RATE);
        }
    }

    #[test]
    fn discount_rejects_below_minimum() {
        assert_eq!(
            discount_for_points(5, 500, Tier::Gold),
            Err(RedeemError::BelowMinimum)
        );
        assert_eq!(
            discount_for_points(100, 5, Tier::Gold),
            Err(RedeemError::BelowMinimum)
        );
        assert_eq!(
            discount_for_points(0, 0, Tier::Pearl),
            Err(RedeemError::BelowMinimum)
        );
    }
}
