//! Property tests for the quantified invariants in the testable-properties
//! section: refcount balance, destroyed-context propagation, entries-bound
//! membership, default resolution uniqueness, diff round-trip equality,
//! and name charset conformance.

use mold_core::context::payload::ContextKind;
use mold_core::context::shortcuts::add_keyval_integer;
use mold_core::context::{self, Context};
use mold_core::error::Status;
use mold_core::value::Value;
use mold_core::version::Version;
use proptest::prelude::*;

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn arb_version() -> impl Strategy<Value = Version> {
    (0u32..5, 0u32..5).prop_map(|(major, minor)| Version::new(major, minor))
}

proptest! {
    /// Invariant 1: a context begun, finalized, then put, leaves its
    /// parent's own refcount unaffected — the caller's handle is the only
    /// one released, the parent's tree-owned reference persists.
    #[test]
    fn refcount_balances_after_begin_finalize_put(name in arb_name()) {
        let mold = context::mold_begin();
        let before = mold.refcount();
        let keyval = add_keyval_integer(&mold, &name, 0, "", Version::initial()).unwrap();
        let kept = keyval.clone();
        context::put(keyval).unwrap();
        prop_assert_eq!(mold.refcount(), before);
        prop_assert!(!kept.is_destroyed());
    }

    /// Invariant 2: destroying a context marks every external handle to
    /// it (and its subtree) as destroyed, not just the handle destroy was
    /// called through.
    #[test]
    fn destroy_propagates_to_every_held_reference(name in arb_name()) {
        let mold = context::mold_begin();
        let section = context::begin(&mold, ContextKind::Section).unwrap();
        section.set_name(&name).unwrap();
        context::finalize(&section).unwrap();
        let alias = section.clone();
        context::destroy(&section).unwrap();
        prop_assert!(alias.is_destroyed());
        prop_assert!(section.is_destroyed());
    }

    /// Invariant 3: a finalized config's element count for a name always
    /// falls within [entries_min, max(entries_min, entries_max)].
    #[test]
    fn entries_bound_membership_holds(min in 0i64..4, extra in 0i64..4, n in 0usize..6) {
        let max = min + extra;
        let mold = context::mold_begin();
        let slot = add_keyval_integer(&mold, "slot", 0, "", Version::initial()).unwrap();
        slot.add_restriction_entries_min(min, Version::initial()).unwrap();
        slot.add_restriction_entries_max(max, Version::initial()).unwrap();
        context::mold_finalize(&mold).unwrap();

        let config = context::config_begin(&mold).unwrap();
        for i in 0..n {
            let keyval = context::begin(&config, ContextKind::Keyval).unwrap();
            keyval.set_name("slot").unwrap();
            keyval.set_value(Value::Integer(i as i64)).unwrap();
            context::finalize(&keyval).unwrap();
        }
        let result = context::config_finalize(&config);
        let bound_min = min;
        let bound_max = max.max(min);
        let within = (n as i64) >= bound_min && (n as i64) <= bound_max;
        prop_assert_eq!(result.is_ok(), within);
    }

    /// Invariant 4: `resolve_default` always returns the unique
    /// greatest-introduced-<=V default, never ambiguous among several
    /// candidates at different versions.
    #[test]
    fn default_resolution_picks_the_unique_greatest_applicable(
        versions in prop::collection::btree_set(arb_version(), 1..5),
        query in arb_version(),
    ) {
        let mold = context::mold_begin();
        let keyval = context::begin(&mold, ContextKind::Keyval).unwrap();
        keyval.set_name("v").unwrap();
        keyval.set_value(Value::Integer(0)).unwrap();
        let mut ordered: Vec<Version> = versions.into_iter().collect();
        ordered.sort();
        for (i, v) in ordered.iter().enumerate() {
            keyval.add_default(Value::Integer(i as i64), *v).unwrap();
        }

        let expected = ordered.iter().enumerate().filter(|(_, v)| **v <= query).max_by_key(|(_, v)| **v);
        match expected {
            Some((i, _)) => {
                let resolved = keyval.get_default(query).unwrap();
                prop_assert_eq!(resolved, i.to_string());
            }
            None => {
                let err = keyval.get_default(query).unwrap_err();
                prop_assert_eq!(err.status, Status::DefaultMissing);
            }
        }
    }

    /// Invariant 5: comparing a finalized config against a freshly built,
    /// identically valued one reports no differences.
    #[test]
    fn diff_round_trips_an_identically_built_config(value in 0i64..1000) {
        let mold = context::mold_begin();
        let port = add_keyval_integer(&mold, "port", 0, "", Version::initial()).unwrap();
        port.add_restriction_entries_max(1, Version::initial()).unwrap();
        context::mold_finalize(&mold).unwrap();

        let build = |v: i64| -> Context {
            let config = context::config_begin(&mold).unwrap();
            let keyval = context::begin(&config, ContextKind::Keyval).unwrap();
            keyval.set_name("port").unwrap();
            keyval.set_value(Value::Integer(v)).unwrap();
            context::finalize(&keyval).unwrap();
            context::config_finalize(&config).unwrap();
            config
        };

        let lhs = build(value);
        let rhs = build(value);
        let report = mold_core::diff::compare(&lhs, &rhs).unwrap();
        prop_assert!(report.is_empty());
    }

    /// Invariant 6: a name is accepted by validation if and only if every
    /// character is in [a-z0-9_] and it is non-empty.
    #[test]
    fn name_charset_conformance(name in "[a-zA-Z0-9_-]{1,12}") {
        let mold = context::mold_begin();
        let section = context::begin(&mold, ContextKind::Section).unwrap();
        section.set_name(&name).unwrap();
        let result = mold_core::validation::validate(&section);
        let conforms = name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        prop_assert_eq!(result.is_ok(), conforms);
    }
}
