use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::registry::TitlePolicyRegistry;

/// The quirk groups that apply to one title.
///
/// `groups` is the full union of every matching group; callers apply all of
/// them.  An empty set means the title gets default handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDecision {
    pub title_id: String,
    pub groups:   BTreeSet<String>,
}

impl PolicyDecision {
    pub fn has(&self, group: &str) -> bool { self.groups.contains(group) }

    pub fn is_default(&self) -> bool { self.groups.is_empty() }
}

#[derive(Debug, Clone)]
pub struct PolicyResolver {
    registry: Arc<TitlePolicyRegistry>,
}

impl PolicyResolver {
    pub fn new(registry: Arc<TitlePolicyRegistry>) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, title_id: &str) -> PolicyDecision {
        let groups: BTreeSet<String> = self.registry
            .groups_for(title_id)
            .into_iter()
            .map(str::to_owned)
            .collect();
        if groups.len() > 1 {
            tracing::debug!(title_id, ?groups, "title matches several quirk groups");
        }
        PolicyDecision { title_id: title_id.to_owned(), groups }
    }

    pub fn registry(&self) -> &TitlePolicyRegistry { &self.registry }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_union_of_groups() {
        let reg = TitlePolicyRegistry::from_table([
            ("ndog",  vec!["CUSA07820"]),
            ("tlou2", vec!["CUSA07820", "CUSA10249"]),
        ]).unwrap();
        let resolver = PolicyResolver::new(Arc::new(reg));

        let d = resolver.resolve("CUSA07820");
        assert!(d.has("ndog") && d.has("tlou2"));
        assert_eq!(d.groups.len(), 2);

        let d = resolver.resolve("CUSA10249");
        assert_eq!(d.groups, BTreeSet::from(["tlou2".to_string()]));
    }

    #[test]
    fn unknown_title_gets_default_handling() {
        let resolver = PolicyResolver::new(Arc::new(TitlePolicyRegistry::builtin().unwrap()));
        let d = resolver.resolve("CUSA12345");
        assert!(d.is_default());
        assert_eq!(d.title_id, "CUSA12345");
    }
}
