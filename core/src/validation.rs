//! Recursive structural validator (spec §4.8).
//!
//! `validate` always reports the specific failure status for the node
//! that actually failed (`RestrictionViolated`, `WrongValueType`,
//! `MoldMissing`, `DefaultMissing`, `ConflictingVersion`, `FatalContext`),
//! or `ElementsInvalid` when every local check on `ctx` passes but some
//! descendant fails. The softer `InvalidContext` is reserved for a node
//! whose `Invalid` flag was set by some earlier operation that this
//! pass's per-kind rule doesn't independently re-derive (spec §4.8: "self
//! invalid, still constructing"). `finalize` is the layer that decides
//! whether to mask a failure as `InvalidContext` for a caller still
//! building the tree, or to surface it verbatim once the parent is
//! already `Finalized` (spec §4.5, §7) — `validate` itself never masks.

use crate::context::payload::{ContextKind, Payload};
use crate::context::Context;
use crate::error::{MoldError, Result, Status};
use crate::resolution::{self, restriction_queue};
use crate::value::ValueType;
use crate::version::Version;

/// `validate(ctx)`: validate the subtree rooted at `ctx` at the target
/// version of its own root (the config's version, or the mold's version
/// for a mold-rooted tree).
pub fn validate(ctx: &Context) -> Result<()> {
    let v = ctx.root()?.get_version()?;
    validate_at(ctx, v)
}

fn validate_at(ctx: &Context, v: Version) -> Result<()> {
    if ctx.is_fatal() {
        return Err(MoldError::new(Status::FatalContext, "context carries a fatal error"));
    }

    let was_invalid = !ctx.valid()?;
    clear_invalid(ctx);

    if let Err(e) = validate_local(ctx, v) {
        let name = ctx.get_name().unwrap_or_else(|_| ctx.kind().to_string());
        tracing::warn!(kind = %ctx.kind(), name = %name, status = %e.status, "validation failed");
        ctx.mark_invalid(e.message.clone());
        return Err(e);
    }
    if was_invalid {
        let e = MoldError::new(Status::InvalidContext, "context was marked invalid by an earlier operation");
        ctx.mark_invalid(e.message.clone());
        return Err(e);
    }

    let mut any_invalid = false;
    for child in ctx.direct_children() {
        if validate_at(&child, v).is_err() {
            any_invalid = true;
        }
    }
    if any_invalid {
        return Err(MoldError::new(Status::ElementsInvalid, "one or more descendants failed validation"));
    }
    Ok(())
}

fn clear_invalid(ctx: &Context) {
    ctx.borrow_mut().flags.invalid = false;
}

fn validate_local(ctx: &Context, v: Version) -> Result<()> {
    match ctx.kind() {
        ContextKind::Config => check_entries_bounds(ctx, v),
        ContextKind::Mold => Ok(()),
        ContextKind::Section => validate_section(ctx, v),
        ContextKind::Keyval => validate_keyval(ctx, v),
        ContextKind::Default => validate_default(ctx),
        ContextKind::Restriction => validate_restriction(ctx),
        ContextKind::Documentation => validate_documentation(ctx),
        ContextKind::FreeText => Ok(()),
    }
}

/// Config and config-rooted Section share this: every distinct child
/// name must fall within its resolved entries-bound at `v`. Names known
/// only on the mold side (none present at all in `ctx`) are checked too
/// at a count of zero, so an entirely missing required element is caught
/// here rather than silently skipped.
fn check_entries_bounds(ctx: &Context, v: Version) -> Result<()> {
    let own_counts: Vec<(String, usize)> = {
        let inner = ctx.borrow();
        let elements = match &inner.payload {
            Payload::Config(c) => &c.elements,
            Payload::Section(s) => &s.elements,
            _ => return Ok(()),
        };
        elements.names().into_iter().map(|n| (n.to_string(), elements.count(n))).collect()
    };

    let mut all_names: Vec<String> = own_counts.iter().map(|(n, _)| n.clone()).collect();
    if let Ok(scope) = resolution::mold_scope_of(ctx) {
        if let Ok(mold_names) = scope.elements() {
            for child in mold_names.into_vec() {
                if let Ok(name) = child.get_name() {
                    if !all_names.contains(&name) {
                        all_names.push(name);
                    }
                }
            }
        }
    }

    for name in &all_names {
        let count = own_counts.iter().find(|(n, _)| n == name).map_or(0, |(_, c)| *c);
        let bound = resolution::resolve_entries_bound(ctx, name, v)?;
        if !bound.contains(count) {
            return Err(MoldError::new(
                Status::RestrictionViolated,
                format!(
                    "'{name}' has {count} entries, expected minimum={} maximum={}",
                    bound.min,
                    if bound.max < 0 { "unbounded".to_string() } else { bound.max.to_string() }
                ),
            ));
        }
    }
    Ok(())
}

fn validate_section(ctx: &Context, v: Version) -> Result<()> {
    validate_name_charset(ctx)?;
    if ctx.root_is_config() {
        if ctx.mold_equivalent().is_none() {
            return Err(MoldError::new(Status::MoldMissing, "section has no mold-equivalent"));
        }
        check_entries_bounds(ctx, v)?;
    }
    Ok(())
}

fn validate_keyval(ctx: &Context, v: Version) -> Result<()> {
    validate_name_charset(ctx)?;
    if ctx.root_is_config() {
        let equiv = ctx
            .mold_equivalent()
            .ok_or_else(|| MoldError::new(Status::MoldMissing, "keyval has no mold-equivalent"))?;
        let own_type = keyval_value_type(ctx)?;
        let equiv_type = keyval_value_type(&equiv)?;
        if own_type != equiv_type {
            return Err(MoldError::new(
                Status::WrongValueType,
                format!("keyval value type {own_type} does not match mold-equivalent type {equiv_type}"),
            ));
        }
        if !resolution::resolve_exclusive_value(ctx, v)? {
            return Err(MoldError::new(Status::RestrictionViolated, "value does not satisfy any applicable restriction"));
        }
    } else if defaults_queue(ctx)?.is_empty() {
        return Err(MoldError::new(Status::DefaultMissing, "mold keyval has no default value"));
    }
    Ok(())
}

fn validate_default(ctx: &Context) -> Result<()> {
    let parent = ctx
        .parent()?
        .ok_or_else(|| MoldError::new(Status::InternalError, "default has no parent"))?;
    let parent_type = keyval_value_type(&parent)?;
    let (own_type, introduced) = match &ctx.borrow().payload {
        Payload::Default(d) => (d.value.value_type(), d.introduced),
        _ => unreachable!(),
    };
    if own_type != parent_type {
        return Err(MoldError::new(
            Status::WrongValueType,
            format!("default value type {own_type} does not match keyval type {parent_type}"),
        ));
    }
    let duplicate = defaults_queue(&parent)?
        .iter()
        .filter(|d| *d != ctx)
        .any(|d| default_introduced(d) == introduced);
    if duplicate {
        return Err(MoldError::new(Status::ConflictingVersion, format!("duplicate default at version {introduced}")));
    }
    Ok(())
}

fn validate_restriction(ctx: &Context) -> Result<()> {
    let parent = ctx
        .parent()?
        .ok_or_else(|| MoldError::new(Status::InternalError, "restriction has no parent"))?;
    let (kind, introduced) = match &ctx.borrow().payload {
        Payload::Restriction(r) => (r.kind, r.introduced),
        _ => unreachable!(),
    };

    // Spec §3.2 invariant 5: ValueEnum requires a parent Keyval of enum
    // type; ValueRange/ValueNumeric require Integer or Float. Checked
    // here too (not just in the `add_restriction_value_*` shortcuts) so a
    // restriction assembled via raw begin/finalize is still caught.
    if parent.kind() == ContextKind::Keyval {
        let parent_type = keyval_value_type(&parent)?;
        let type_ok = match kind {
            crate::context::payload::RestrictionKind::ValueEnum => parent_type == ValueType::Enum,
            crate::context::payload::RestrictionKind::ValueRange
            | crate::context::payload::RestrictionKind::ValueNumeric => {
                matches!(parent_type, ValueType::Integer | ValueType::Float)
            }
            crate::context::payload::RestrictionKind::EntriesMin | crate::context::payload::RestrictionKind::EntriesMax => true,
        };
        if !type_ok {
            return Err(MoldError::new(
                Status::WrongValueType,
                format!("{kind:?} restriction is not compatible with a {parent_type} keyval"),
            ));
        }
    }

    let conflict = restriction_queue(&parent)?.iter().filter(|s| *s != ctx).any(|s| {
        matches!(&s.borrow().payload, Payload::Restriction(r) if r.kind == kind && r.introduced == introduced)
    });
    if conflict {
        return Err(MoldError::new(
            Status::ConflictingVersion,
            format!("duplicate {kind:?} restriction at version {introduced}"),
        ));
    }
    Ok(())
}

fn validate_documentation(ctx: &Context) -> Result<()> {
    let parent = ctx
        .parent()?
        .ok_or_else(|| MoldError::new(Status::InternalError, "documentation has no parent"))?;
    let introduced = match &ctx.borrow().payload {
        Payload::Documentation(d) => d.introduced,
        _ => unreachable!(),
    };
    let duplicate = documentation_queue(&parent)?.iter().filter(|d| *d != ctx).any(|d| {
        matches!(&d.borrow().payload, Payload::Documentation(dd) if dd.introduced == introduced)
    });
    if duplicate {
        return Err(MoldError::new(Status::ConflictingVersion, format!("duplicate documentation at version {introduced}")));
    }
    Ok(())
}

fn validate_name_charset(ctx: &Context) -> Result<()> {
    let name = ctx.get_name()?;
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MoldError::new(Status::RestrictionViolated, format!("name '{name}' violates the [a-z0-9_]+ charset")))
    }
}

fn keyval_value_type(ctx: &Context) -> Result<ValueType> {
    match &ctx.borrow().payload {
        Payload::Keyval(k) => Ok(k.value.value_type()),
        other => Err(MoldError::new(Status::WrongContext, format!("{} is not a keyval", other.kind()))),
    }
}

fn defaults_queue(ctx: &Context) -> Result<Vec<Context>> {
    match &ctx.borrow().payload {
        Payload::Keyval(k) => Ok(k.defaults.iter().cloned().collect()),
        other => Err(MoldError::new(Status::WrongContext, format!("{} has no default queue", other.kind()))),
    }
}

fn documentation_queue(ctx: &Context) -> Result<Vec<Context>> {
    match &ctx.borrow().payload {
        Payload::Mold(m) => Ok(m.documentation.iter().cloned().collect()),
        Payload::Section(s) => Ok(s.documentation.iter().cloned().collect()),
        Payload::Keyval(k) => Ok(k.documentation.iter().cloned().collect()),
        other => Err(MoldError::new(Status::WrongContext, format!("{} has no documentation queue", other.kind()))),
    }
}

fn default_introduced(ctx: &Context) -> Version {
    match &ctx.borrow().payload {
        Payload::Default(d) => d.introduced,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;
    use crate::value::Value;

    #[test]
    fn name_charset_rejects_uppercase_and_dashes() {
        let mold = context::mold_begin();
        let section = context::begin(&mold, ContextKind::Section).unwrap();
        section.set_name("Bad-Name").unwrap();
        let err = validate_name_charset(&section).unwrap_err();
        assert_eq!(err.status, Status::RestrictionViolated);
    }

    #[test]
    fn name_charset_accepts_lowercase_digits_underscore() {
        let mold = context::mold_begin();
        let section = context::begin(&mold, ContextKind::Section).unwrap();
        section.set_name("server_1").unwrap();
        assert!(validate_name_charset(&section).is_ok());
    }

    #[test]
    fn mold_keyval_without_default_is_default_missing() {
        let mold = context::mold_begin();
        let keyval = context::begin(&mold, ContextKind::Keyval).unwrap();
        keyval.set_name("port").unwrap();
        let err = validate_keyval(&keyval, Version::initial()).unwrap_err();
        assert_eq!(err.status, Status::DefaultMissing);
    }

    #[test]
    fn default_type_mismatch_is_wrong_value_type() {
        let mold = context::mold_begin();
        let keyval = context::begin(&mold, ContextKind::Keyval).unwrap();
        keyval.set_name("port").unwrap();
        {
            let mut inner = keyval.borrow_mut();
            if let Payload::Keyval(k) = &mut inner.payload {
                k.value = Value::Integer(0);
            }
        }
        let default = context::begin(&keyval, ContextKind::Default).unwrap();
        {
            let mut inner = default.borrow_mut();
            if let Payload::Default(d) = &mut inner.payload {
                d.value = Value::String(Some("oops".into()));
            }
        }
        let err = validate_default(&default).unwrap_err();
        assert_eq!(err.status, Status::WrongValueType);
    }
}
