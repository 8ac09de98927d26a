use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::members::repo::Member;
use crate::state::AppState;

/// In-process mirror of member rows. Every successful database read or
/// write refreshes the mirror; lookups fall back to it when the database
/// is unreachable.
#[derive(Clone, Default)]
pub struct MemberCache {
    inner: Arc<DashMap<Uuid, Member>>,
}

impl MemberCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, member: &Member) {
        self.inner.insert(member.id, member.clone());
    }

    pub fn get(&self, id: Uuid) -> Option<Member> {
        self.inner.get(&id).map(|m| m.value().clone())
    }

    pub fn get_by_email(&self, email: &str) -> Option<Member> {
        self.inner
            .iter()
            .find(|m| m.email == email)
            .map(|m| m.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Database-first member lookup with a cache fallback on database errors.
pub async fn load_member(state: &AppState, id: Uuid) -> anyhow::Result<Option<Member>> {
    match Member::find_by_id(&state.db, id).await {
        Ok(found) => {
            if let Some(member) = &found {
                state.members.put(member);
            }
            Ok(found)
        }
        Err(e) => {
            warn!(error = %e, member_id = %id, "member lookup failed, serving cache copy");
            Ok(state.members.get(id))
        }
    }
}

pub async fn load_member_by_email(
    state: &AppState,
    email: &str,
) -> anyhow::Result<Option<Member>> {
    match Member::find_by_email(&state.db, email).await {
        Ok(found) => {
            if let Some(member) = &found {
                state.members.put(member);
            }
            Ok(found)
        }
        Err(e) => {
            warn!(error = %e, email = %email, "member lookup failed, serving cache copy");
            Ok(state.members.get_by_email(email))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loyalty::tiers::Tier;
    use time::OffsetDateTime;

    fn sample(email: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            jc_id: "JC123456".into(),
            email: email.into(),
            name: "Sam".into(),
            password_hash: None,
            google_id: None,
            points: 10,
            tier: Tier::Pearl,
            total_spent: 0.0,
            referral_code: "CODE1234".into(),
            referred_by: None,
            is_admin: false,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn put_then_get_by_id_and_email() {
        let cache = MemberCache::new();
        let member = sample("sam@example.com");
        cache.put(&member);

        assert_eq!(cache.get(member.id).unwrap().email, "sam@example.com");
        assert_eq!(
            cache.get_by_email("sam@example.com").unwrap().id,
            member.id
        );
        assert!(cache.get_by_email("other@example.com").is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = MemberCache::new();
        let mut member = sample("sam@example.com");
        cache.put(&member);
        member.points = 250;
        cache.put(&member);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(member.id).unwrap().points, 250);
    }
}
