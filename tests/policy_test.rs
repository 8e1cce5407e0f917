use proptest::prelude::*;
use savepolicy::policy::PolicyResolver;
use savepolicy::registry::TitlePolicyRegistry;
use savepolicy::size::{blocks_to_bytes, bytes_to_megabytes};
use std::collections::BTreeSet;
use std::sync::Arc;

fn builtin_resolver() -> PolicyResolver {
    PolicyResolver::new(Arc::new(TitlePolicyRegistry::builtin().unwrap()))
}

#[test]
fn test_title_in_two_groups_gets_both() {
    let reg = TitlePolicyRegistry::from_table([
        ("ndog",       vec!["CUSA07820", "CUSA00341"]),
        ("ndog_tlou2", vec!["CUSA07820", "CUSA10249"]),
        ("gtav",       vec!["CUSA00411"]),
    ]).unwrap();
    let decision = PolicyResolver::new(Arc::new(reg)).resolve("CUSA07820");
    assert_eq!(
        decision.groups,
        BTreeSet::from(["ndog".to_string(), "ndog_tlou2".to_string()]),
    );
}

#[test]
fn test_builtin_titles_resolve() {
    let resolver = builtin_resolver();
    assert!(resolver.resolve("CUSA03041").has("rdr2"));
    assert!(resolver.resolve("CUSA33388").has("re4r"));
    assert!(resolver.resolve("CUSA02344").has("ndog_col"));
    for group in resolver.registry().groups() {
        for title in &group.titles {
            assert!(resolver.resolve(title.as_str()).has(&group.name));
        }
    }
}

#[test]
fn test_decision_serializes() {
    let json = serde_json::to_value(builtin_resolver().resolve("CUSA00411")).unwrap();
    assert_eq!(json["title_id"], "CUSA00411");
    assert_eq!(json["groups"][0], "gtav");
}

proptest! {
    #[test]
    fn unlisted_titles_resolve_empty(s in "\\PC*") {
        let resolver = builtin_resolver();
        prop_assume!(!resolver.registry().contains_title(&s));
        prop_assert!(resolver.resolve(&s).is_default());
    }

    #[test]
    fn unlisted_well_formed_titles_resolve_empty(n in 0u32..100_000) {
        let resolver = builtin_resolver();
        let id = format!("CUSB{n:05}");
        prop_assert!(resolver.resolve(&id).is_default());
    }

    #[test]
    fn megabytes_are_monotonic_in_blocks(a in 0i64..=32768, b in 0i64..=32768) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mb = |n: i64| bytes_to_megabytes(blocks_to_bytes(n).unwrap() as i64).unwrap();
        prop_assert!(mb(lo) <= mb(hi));
    }
}
