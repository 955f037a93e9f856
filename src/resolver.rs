// ============================================
// resolver.rs - Access Hash Lookup
// ============================================
// Mention links (tg://user?id=N) only become MentionName entities
// when the client knows the access hash of user N.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::trace;

use crate::entity::EntityKind;

static MENTION_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tg://user\?id=([0-9]+)$").expect("valid mention regex"));

/// Resolves a user id to the access hash needed to reference that user.
///
/// Implementations are expected to be cheap, local lookups.
#[cfg_attr(test, mockall::automock)]
pub trait AccessHashResolver {
    fn access_hash(&self, user_id: i64) -> Option<i64>;
}

impl<F> AccessHashResolver for F
where
    F: Fn(i64) -> Option<i64>,
{
    fn access_hash(&self, user_id: i64) -> Option<i64> {
        self(user_id)
    }
}

impl AccessHashResolver for HashMap<i64, i64> {
    fn access_hash(&self, user_id: i64) -> Option<i64> {
        self.get(&user_id).copied()
    }
}

/// Resolver that never knows any user; every mention stays a plain link.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAccessHashes;

impl AccessHashResolver for NoAccessHashes {
    fn access_hash(&self, _user_id: i64) -> Option<i64> {
        None
    }
}

/// Extract the user id of a `tg://user?id=<digits>` link.
pub fn mention_user_id(url: &str) -> Option<i64> {
    MENTION_URL
        .captures(url)
        .and_then(|caps| caps[1].parse().ok())
}

/// Entity kind for a link: a mention when the url points to a user we can
/// resolve, a text link otherwise.
pub(crate) fn link_kind<R>(url: String, resolver: &R) -> EntityKind
where
    R: AccessHashResolver + ?Sized,
{
    if let Some(user_id) = mention_user_id(&url) {
        if let Some(access_hash) = resolver.access_hash(user_id) {
            return EntityKind::MentionName {
                user_id,
                access_hash,
            };
        }
        trace!("No access hash for user {}, keeping text link", user_id);
    }
    EntityKind::TextUrl { url }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_mention_user_id() {
        assert_eq!(mention_user_id("tg://user?id=42"), Some(42));
        assert_eq!(mention_user_id("tg://user?id="), None);
        assert_eq!(mention_user_id("tg://user?id=-5"), None);
        assert_eq!(mention_user_id("tg://user?id=42x"), None);
        assert_eq!(mention_user_id("https://t.me/bob"), None);
        // Larger than i64
        assert_eq!(mention_user_id("tg://user?id=99999999999999999999"), None);
    }

    #[test]
    fn test_link_kind_resolves_mention() {
        let mut resolver = MockAccessHashResolver::new();
        resolver
            .expect_access_hash()
            .with(eq(42))
            .times(1)
            .returning(|_| Some(777));

        let kind = link_kind("tg://user?id=42".to_string(), &resolver);
        assert_eq!(
            kind,
            EntityKind::MentionName {
                user_id: 42,
                access_hash: 777
            }
        );
    }

    #[test]
    fn test_link_kind_plain_url_skips_lookup() {
        let mut resolver = MockAccessHashResolver::new();
        resolver.expect_access_hash().never();

        let kind = link_kind("https://example.com".to_string(), &resolver);
        assert_eq!(
            kind,
            EntityKind::TextUrl {
                url: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn test_closure_and_map_resolvers() {
        let closure = |id: i64| (id == 1).then_some(10);
        assert_eq!(closure.access_hash(1), Some(10));
        assert_eq!(closure.access_hash(2), None);

        let map: HashMap<i64, i64> = [(5, 50)].into_iter().collect();
        assert_eq!(map.access_hash(5), Some(50));
        assert_eq!(NoAccessHashes.access_hash(5), None);
    }
}
