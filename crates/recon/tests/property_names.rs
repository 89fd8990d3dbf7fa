// Property-based tests for name table merging.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use accession_recon::names::{MergeOutcome, NameTable};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{0,6}, [A-Z]"
}

fn sort_key() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Z]{1,8}"]
}

proptest! {
    #![proptest_config(config())]

    /// Merging the same pairs twice changes nothing the second time.
    #[test]
    fn merge_is_idempotent(pairs in prop::collection::vec((name(), sort_key()), 0..40)) {
        let mut table = NameTable::new();
        for (n, k) in &pairs {
            table.merge(n, k);
        }
        let before: Vec<_> = table.iter().cloned().collect();

        for (n, k) in &pairs {
            let outcome = table.merge(n, k);
            prop_assert!(
                matches!(outcome, MergeOutcome::Unchanged | MergeOutcome::Conflict { .. }),
                "second merge of ({}, {}) gave {:?}", n, k, outcome
            );
        }
        let after: Vec<_> = table.iter().cloned().collect();
        prop_assert_eq!(before, after);
    }

    /// The stored sort key is the first non-empty key offered for the name.
    #[test]
    fn first_non_empty_key_wins(n in name(), keys in prop::collection::vec(sort_key(), 1..10)) {
        let mut table = NameTable::new();
        for k in &keys {
            table.merge(&n, k);
        }
        let expected = keys.iter().find(|k| !k.is_empty()).cloned().unwrap_or_default();
        prop_assert_eq!(&table.get(&n).unwrap().sort_key, &expected);
    }

    /// One entry per distinct non-empty name, in first-seen order.
    #[test]
    fn one_entry_per_name(pairs in prop::collection::vec((prop_oneof![Just(String::new()), name()], sort_key()), 0..40)) {
        let mut table = NameTable::new();
        let mut seen: Vec<String> = Vec::new();
        for (n, k) in &pairs {
            table.merge(n, k);
            if !n.is_empty() && !seen.contains(n) {
                seen.push(n.clone());
            }
        }
        let names: Vec<String> = table.iter().map(|e| e.name.clone()).collect();
        prop_assert_eq!(names, seen);
    }

    /// Export order is by name and emits a non-empty key for every entry.
    #[test]
    fn sorted_export_has_keys(pairs in prop::collection::vec((name(), sort_key()), 0..40)) {
        let mut table = NameTable::new();
        for (n, k) in &pairs {
            table.merge(n, k);
        }
        let sorted = table.sorted();
        for w in sorted.windows(2) {
            prop_assert!(w[0].name <= w[1].name);
        }
        for entry in sorted {
            prop_assert!(!entry.effective_sort_key().is_empty());
        }
    }
}
