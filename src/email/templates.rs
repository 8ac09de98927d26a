use crate::loyalty::tiers::Tier;

/// Notification kinds the club sends. Each renders a fixed HTML body.
#[derive(Debug, Clone)]
pub enum EmailEvent {
    Welcome {
        name: String,
        jc_id: String,
        referral_code: String,
    },
    PointsEarned {
        name: String,
        points: i64,
        balance: i64,
    },
    TierUpgrade {
        name: String,
        tier: Tier,
    },
    ReferralBonus {
        name: String,
        bonus: i64,
        balance: i64,
    },
    PasswordReset {
        name: String,
        token: String,
    },
    NewsletterWelcome,
}

impl EmailEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            EmailEvent::Welcome { .. } => "welcome",
            EmailEvent::PointsEarned { .. } => "points_earned",
            EmailEvent::TierUpgrade { .. } => "tier_upgrade",
            EmailEvent::ReferralBonus { .. } => "referral_bonus",
            EmailEvent::PasswordReset { .. } => "password_reset",
            EmailEvent::NewsletterWelcome => "newsletter_welcome",
        }
    }
}

/// Subject and HTML body for an event.
pub fn render(event: &EmailEvent) -> (String, String) {
    match event {
        EmailEvent::Welcome {
            name,
            jc_id,
            referral_code,
        } => (
            "Welcome to the Jeans Club!".to_string(),
            format!(
                "<h1>Welcome, {name}!</h1>\
                 <p>Your member ID is <strong>{jc_id}</strong>.</p>\
                 <p>Share your referral code <strong>{referral_code}</strong> with friends \
                 and earn bonus points when they join.</p>"
            ),
        ),
        EmailEvent::PointsEarned {
            name,
            points,
            balance,
        } => (
            format!("You earned {points} points"),
            format!(
                "<h1>Nice one, {name}!</h1>\
                 <p>Your latest purchase earned <strong>{points}</strong> points.</p>\
                 <p>Your balance is now <strong>{balance}</strong> points.</p>"
            ),
        ),
        EmailEvent::TierUpgrade { name, tier } => (
            format!("You reached {tier} status"),
            format!(
                "<h1>Congratulations, {name}!</h1>\
                 <p>You are now a <strong>{tier}</strong> member. Higher earn rates and \
                 bigger discounts are unlocked.</p>"
            ),
        ),
        EmailEvent::ReferralBonus {
            name,
            bonus,
            balance,
        } => (
            "A friend joined through your referral".to_string(),
            format!(
                "<h1>Thanks for spreading the word, {name}!</h1>\
                 <p>We added <strong>{bonus}</strong> bonus points to your account. \
                 Your balance is now <strong>{balance}</strong> points.</p>"
            ),
        ),
        EmailEvent::PasswordReset { name, token } => (
            "Reset your Jeans Club password".to_string(),
            format!(
                "<h1>Hi {name},</h1>\
                 <p>Use the code below to reset your password. It expires in one hour.</p>\
                 <p><strong>{token}</strong></p>\
                 <p>If you did not request this, you can ignore this email.</p>"
            ),
        ),
        EmailEvent::NewsletterWelcome => (
            "You are on the list".to_string(),
            "<h1>Welcome to the Jeans Club newsletter!</h1>\
             <p>Expect drops, member offers and style news in your inbox.</p>"
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_interpolates_member_identity() {
        let (subject, html) = render(&EmailEvent::Welcome {
            name: "Ana".into(),
            jc_id: "JC000123".into(),
            referral_code: "XY99ZZ11".into(),
        });
        assert!(subject.contains("Welcome"));
        assert!(html.contains("Ana"));
        assert!(html.contains("JC000123"));
        assert!(html.contains("XY99ZZ11"));
    }

    #[test]
    fn points_earned_carries_amounts() {
        let (subject, html) = render(&EmailEvent::PointsEarned {
            name: "Ana".into(),
            points: 42,
            balance: 142,
        });
        assert!(subject.contains("42"));
        assert!(html.contains("42"));
        assert!(html.contains("142"));
    }

    #[test]
    fn tier_upgrade_names_the_tier() {
        let (subject, html) = render(&EmailEvent::TierUpgrade {
            name: "Ana".into(),
            tier: Tier::Gold,
        });
        assert!(subject.contains("GOLD"));
        assert!(html.contains("GOLD"));
    }

    #[test]
    fn password_reset_contains_token() {
        let (_, html) = render(&EmailEvent::PasswordReset {
            name: "Ana".into(),
            token: "tok123".into(),
        });
        assert!(html.contains("tok123"));
        assert!(html.contains("one hour"));
    }

    #[test]
    fn event_kinds_are_distinct() {
        let kinds = [
            EmailEvent::NewsletterWelcome.kind(),
            EmailEvent::Welcome {
                name: String::new(),
                jc_id: String::new(),
                referral_code: String::new(),
            }
            .kind(),
            EmailEvent::PasswordReset {
                name: String::new(),
                token: String::new(),
            }
            .kind(),
        ];
        assert_eq!(kinds.len(), {
            let mut k = kinds.to_vec();
            k.sort();
            k.dedup();
            k.len()
        });
    }
}
