//! End-to-end scenarios from the testable-properties section: building
//! a mold, generating configs at different versions, and checking the
//! resolution, validation, diff, and query behavior that falls out.

use mold_core::context::payload::ContextKind;
use mold_core::context::shortcuts::{add_keyval_enum, add_keyval_integer, add_keyval_string};
use mold_core::context::{self, Context};
use mold_core::error::{Result, Status};
use mold_core::value::Value;
use mold_core::version::Version;
use pretty_assertions::assert_eq;

/// Scenario 1: a default queue that advances across versions, and a
/// config version rejected once it exceeds the mold's.
#[test]
fn port_default_resolves_by_version_and_rejects_conflicting_config_version() -> Result<()> {
    let mold = context::mold_begin();
    let port = add_keyval_integer(&mold, "port", 8080, "", Version::initial())?;
    port.add_default(Value::Integer(9090), Version::new(2, 0))?;
    port.add_restriction_entries_max(1, Version::initial())?;
    context::mold_finalize(&mold)?;
    assert_eq!(mold.get_version()?, Version::new(2, 0));

    let config = context::config_begin(&mold)?;
    let config_port = context::begin(&config, ContextKind::Keyval)?;
    config_port.set_name("port")?;
    config_port.set_value(Value::Integer(8080)).unwrap();
    context::finalize(&config_port)?;
    config.set_version(Version::new(1, 5))?;
    context::config_finalize(&config)?;

    assert_eq!(config_port.get_default(Version::new(1, 5))?, "8080");
    assert_eq!(config_port.get_default(Version::new(2, 1))?, "9090");

    let err = config.set_version(Version::new(9, 9)).unwrap_err();
    assert_eq!(err.status, Status::ConflictingVersion);
    Ok(())
}

/// Scenario 2: a missing required section is caught at validation, not
/// silently skipped because the config simply has zero of them.
#[test]
fn missing_required_section_is_restriction_violated() -> Result<()> {
    let mold = context::mold_begin();
    let server = context::begin(&mold, ContextKind::Section)?;
    server.set_name("server")?;
    server.add_restriction_entries_min(1, Version::initial())?;
    server.add_restriction_entries_max(3, Version::initial())?;
    add_keyval_string(&server, "host", "localhost", "", Version::initial())?;
    context::finalize(&server)?;
    context::mold_finalize(&mold)?;

    let config = context::config_begin(&mold)?;
    let err = context::config_finalize(&config).unwrap_err();
    assert_eq!(err.status, Status::RestrictionViolated);
    Ok(())
}

/// Scenario 3: an enum restriction set that only becomes satisfiable
/// once the config's version reaches the version the extra value was
/// introduced at.
#[test]
fn enum_restriction_applies_only_from_its_introduced_version() -> Result<()> {
    let mold = context::mold_begin();
    let mode = add_keyval_enum(&mold, "mode", "on", "", Version::initial())?;
    mode.add_restriction_value_enum("on", Version::initial())?;
    mode.add_restriction_value_enum("off", Version::initial())?;
    mode.add_restriction_value_enum("auto", Version::new(2, 0))?;
    context::mold_finalize(&mold)?;
    assert_eq!(mold.get_version()?, Version::new(2, 0));

    let early = context::config_begin(&mold)?;
    let early_mode = context::begin(&early, ContextKind::Keyval)?;
    early_mode.set_name("mode")?;
    early_mode.set_value(Value::Enum(Some("auto".to_string()))).unwrap();
    context::finalize(&early_mode)?;
    early.set_version(Version::new(1, 5))?;
    // The enum restriction lives on the keyval itself, so the specific
    // status surfaces by validating it directly rather than through
    // config_finalize, which would wrap a descendant failure as
    // ElementsInvalid on the config root.
    let err = mold_core::validation::validate(&early_mode).unwrap_err();
    assert_eq!(err.status, Status::RestrictionViolated);

    let late = context::config_begin(&mold)?;
    let late_mode = context::begin(&late, ContextKind::Keyval)?;
    late_mode.set_name("mode")?;
    late_mode.set_value(Value::Enum(Some("auto".to_string()))).unwrap();
    context::finalize(&late_mode)?;
    late.set_version(Version::new(2, 0))?;
    context::config_finalize(&late)?;
    Ok(())
}

/// Scenario 4: two configs differing only in the ordering of
/// duplicate-named keyvals under one section diff by position, one
/// entry per mismatch.
#[test]
fn diff_reports_one_entry_per_mismatched_position() -> Result<()> {
    let mold = context::mold_begin();
    let group = context::begin(&mold, ContextKind::Section)?;
    group.set_name("group")?;
    let slot = add_keyval_string(&group, "slot", "", "", Version::initial())?;
    slot.add_restriction_entries_max(4, Version::initial())?;
    context::finalize(&group)?;
    context::mold_finalize(&mold)?;

    let build = |values: &[&str]| -> Result<Context> {
        let config = context::config_begin(&mold)?;
        let config_group = context::begin(&config, ContextKind::Section)?;
        config_group.set_name("group")?;
        for v in values {
            let keyval = context::begin(&config_group, ContextKind::Keyval)?;
            keyval.set_name("slot")?;
            keyval.set_value(Value::String(Some((*v).to_string()))).unwrap();
            context::finalize(&keyval)?;
        }
        context::finalize(&config_group)?;
        context::config_finalize(&config)?;
        Ok(config)
    };

    let lhs = build(&["a", "b", "c"])?;
    let rhs = build(&["a", "x", "c"])?;
    let report = mold_core::diff::compare(&lhs, &rhs)?;
    assert_eq!(report.len(), 1);
    assert!(report[0].contains('b') && report[0].contains('x'));

    let identical = build(&["a", "b", "c"])?;
    assert!(mold_core::diff::compare(&lhs, &identical)?.is_empty());
    Ok(())
}

/// Scenario 5: an entries-max restriction that widens at a later
/// version, tightening and loosening the accepted cardinality window.
#[test]
fn entries_max_widens_at_its_introduced_version() -> Result<()> {
    let mold = context::mold_begin();
    let slot = add_keyval_integer(&mold, "slot", 0, "", Version::initial())?;
    slot.add_restriction_entries_min(0, Version::initial())?;
    slot.add_restriction_entries_max(2, Version::initial())?;
    slot.add_restriction_entries_max(4, Version::new(2, 0))?;
    context::mold_finalize(&mold)?;

    let build_with_n_slots = |version: Version, n: usize| -> Result<()> {
        let config = context::config_begin(&mold)?;
        for i in 0..n {
            let keyval = context::begin(&config, ContextKind::Keyval)?;
            keyval.set_name("slot")?;
            keyval.set_value(Value::Integer(i as i64)).unwrap();
            context::finalize(&keyval)?;
        }
        config.set_version(version)?;
        context::config_finalize(&config)?;
        Ok(())
    };

    let err = build_with_n_slots(Version::new(1, 9), 3).unwrap_err();
    assert_eq!(err.status, Status::RestrictionViolated);
    build_with_n_slots(Version::new(2, 0), 3)?;
    let err = build_with_n_slots(Version::new(2, 0), 5).unwrap_err();
    assert_eq!(err.status, Status::RestrictionViolated);
    Ok(())
}

/// Scenario 6: `resolve_root_name` reconstructs a dotted path with an
/// `@index` suffix only where the sibling index is non-zero.
#[test]
fn resolve_root_name_reconstructs_dotted_indexed_path() -> Result<()> {
    let mold = context::mold_begin();
    let a = context::begin(&mold, ContextKind::Section)?;
    a.set_name("a")?;
    let b0 = context::begin(&a, ContextKind::Section)?;
    b0.set_name("b")?;
    context::finalize(&b0)?;
    let b1 = context::begin(&a, ContextKind::Section)?;
    b1.set_name("b")?;
    let c = add_keyval_string(&b1, "c", "", "", Version::initial())?;
    context::finalize(&b1)?;
    context::finalize(&a)?;
    context::mold_finalize(&mold)?;

    assert_eq!(c.resolve_root_name()?, "a.b@1.c");
    Ok(())
}
