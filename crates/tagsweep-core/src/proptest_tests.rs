//! Property-based tests for retention decisions and the skip filter.

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use crate::{Inventory, RetentionPolicy, SkipPolicy, TagRecord};

/// Strategy for generating creation times, a third of them unknown.
fn created_at_strategy() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop_oneof![
        1 => Just(None),
        2 => (0i64..2_000_000_000).prop_map(|secs| DateTime::from_timestamp(secs, 0)),
    ]
}

/// Strategy for generating inventories with unique tag names.
fn inventory_strategy() -> impl Strategy<Value = Inventory> {
    prop::collection::vec(created_at_strategy(), 0..40).prop_map(|times| {
        times
            .into_iter()
            .enumerate()
            .map(|(i, t)| TagRecord::new(format!("tag-{i}"), t))
            .collect()
    })
}

/// Strategy for generating tag names that are not `sha-` tags.
fn plain_tag_strategy() -> impl Strategy<Value = String> {
    "[a-rt-z0-9][a-z0-9._-]{0,20}"
}

proptest! {
    /// Keeping at least as many tags as exist leaves nothing to delete.
    #[test]
    fn large_retention_keeps_everything(inventory in inventory_strategy(), extra in 0usize..5) {
        let decision = RetentionPolicy::new(inventory.len() + extra).apply(&inventory);
        prop_assert!(decision.candidates().is_empty());
        let sorted = inventory.sorted_newest_first();
        prop_assert_eq!(decision.keep(), sorted.records());
    }

    /// A zero retention count turns every tag into a candidate.
    #[test]
    fn zero_retention_deletes_everything(inventory in inventory_strategy()) {
        let decision = RetentionPolicy::new(0).apply(&inventory);
        prop_assert!(decision.keep().is_empty());
        prop_assert_eq!(decision.candidates().len(), inventory.len());
    }

    /// Kept and candidate tags partition the inventory.
    #[test]
    fn partition_is_complete_and_disjoint(inventory in inventory_strategy(), count in 0usize..50) {
        let decision = RetentionPolicy::new(count).apply(&inventory);
        prop_assert_eq!(decision.keep().len(), count.min(inventory.len()));

        let mut names: Vec<&str> = decision
            .kept_names()
            .into_iter()
            .chain(decision.candidate_names())
            .collect();
        names.sort_unstable();
        let mut expected = inventory.names();
        expected.sort_unstable();
        prop_assert_eq!(names, expected);
    }

    /// Every kept tag is at least as recent as every candidate.
    #[test]
    fn kept_tags_are_newest(inventory in inventory_strategy(), count in 0usize..50) {
        let decision = RetentionPolicy::new(count).apply(&inventory);
        for kept in decision.keep() {
            for candidate in decision.candidates() {
                prop_assert!(kept.created_at() >= candidate.created_at());
            }
        }
    }

    /// Sorting an already sorted inventory changes nothing.
    #[test]
    fn sorting_is_idempotent(inventory in inventory_strategy()) {
        let once = inventory.sorted_newest_first();
        let twice = once.sorted_newest_first();
        prop_assert_eq!(once, twice);
    }

    /// The decision depends only on its inputs.
    #[test]
    fn retention_is_deterministic(inventory in inventory_strategy(), count in 0usize..50) {
        let policy = RetentionPolicy::new(count);
        prop_assert_eq!(policy.apply(&inventory), policy.apply(&inventory));
    }

    /// Rerunning after the candidates are gone leaves nothing to delete.
    #[test]
    fn rerun_after_cleanup_is_noop(inventory in inventory_strategy(), count in 0usize..50) {
        let policy = RetentionPolicy::new(count);
        let (keep, _) = policy.apply(&inventory).into_parts();
        let remaining = Inventory::from(keep);
        prop_assert!(policy.apply(&remaining).candidates().is_empty());
    }

    /// Commit-aware policy skips long hex suffixes in any case.
    #[test]
    fn commit_policy_skips_hex(hex in "[0-9a-fA-F]{7,40}") {
        let tag = format!("sha-{hex}");
        prop_assert!(SkipPolicy::CommitTag.check(&tag).is_some());
    }

    /// Commit-aware policy deletes short hex suffixes.
    #[test]
    fn commit_policy_deletes_short_hex(hex in "[0-9a-f]{0,6}") {
        let tag = format!("sha-{hex}");
        prop_assert!(SkipPolicy::CommitTag.check(&tag).is_none());
    }

    /// Prefix policy skips every `sha-` tag regardless of suffix.
    #[test]
    fn prefix_policy_skips_any_suffix(suffix in "[a-zA-Z0-9._-]{0,30}") {
        let tag = format!("sha-{suffix}");
        prop_assert!(SkipPolicy::DigestPrefix.check(&tag).is_some());
    }

    /// Neither policy touches ordinary tags.
    #[test]
    fn policies_ignore_plain_tags(tag in plain_tag_strategy()) {
        prop_assert!(SkipPolicy::DigestPrefix.check(&tag).is_none());
        prop_assert!(SkipPolicy::CommitTag.check(&tag).is_none());
    }
}
