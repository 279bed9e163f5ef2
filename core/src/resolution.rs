//! Version-aware default and restriction resolution (spec §4.7).

use crate::context::payload::{ContextKind, Payload, RestrictionKind};
use crate::context::Context;
use crate::error::{bail, MoldError, Result, Status};
use crate::value::{Value, ValueType};
use crate::version::{applicable_at, Version};

/// Effective cardinality bound for a named element under a parent at a
/// given version. `max == -1` is the "not yet introduced or already
/// deprecated at V" sentinel from spec §4.7 and is treated as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntriesBound {
    pub min: i64,
    pub max: i64,
}

impl EntriesBound {
    #[must_use]
    pub fn contains(&self, count: usize) -> bool {
        let count = count as i64;
        count >= self.min && (self.max < 0 || count <= self.max)
    }
}

/// `resolve_default(keyval, v)`: the Default with the greatest introduced
/// version `<= v`, read from the mold-side defaults queue directly for a
/// mold keyval, or through the mold-equivalent for a config keyval.
pub fn resolve_default(keyval: &Context, v: Version) -> Result<Value> {
    let source = mold_source_keyval(keyval)?;
    let inner = source.borrow();
    let k = match &inner.payload {
        Payload::Keyval(k) => k,
        other => bail!(Status::WrongContext, "resolve_default requires a keyval, got {}", other.kind()),
    };
    k.defaults
        .iter()
        .filter_map(|d| match &d.borrow().payload {
            Payload::Default(dd) if dd.introduced <= v => Some((dd.introduced, dd.value.clone())),
            _ => None,
        })
        .max_by_key(|(introduced, _)| *introduced)
        .map(|(_, value)| value)
        .ok_or_else(|| MoldError::new(Status::DefaultMissing, "no default applies at this version"))
}

/// `get_documentation(ctx, v)`: the Documentation with the greatest
/// introduced version `<= v`, read from `ctx`'s own documentation queue
/// (legal on Mold/Section/Keyval). Returns the text and the version it
/// was actually introduced at.
pub fn resolve_documentation(ctx: &Context, v: Version) -> Result<(String, Version)> {
    let queue = documentation_queue(ctx)?;
    queue
        .iter()
        .filter_map(|d| match &d.borrow().payload {
            Payload::Documentation(dd) if dd.introduced <= v => Some((dd.introduced, dd.text.clone())),
            _ => None,
        })
        .max_by_key(|(introduced, _)| *introduced)
        .map(|(introduced, text)| (text, introduced))
        .ok_or_else(|| MoldError::new(Status::NotExist, "no documentation applies at this version"))
}

fn documentation_queue(ctx: &Context) -> Result<Vec<Context>> {
    match &ctx.borrow().payload {
        Payload::Mold(m) => Ok(m.documentation.iter().cloned().collect()),
        Payload::Section(s) => Ok(s.documentation.iter().cloned().collect()),
        Payload::Keyval(k) => Ok(k.documentation.iter().cloned().collect()),
        other => bail!(Status::WrongContext, "{} has no documentation queue", other.kind()),
    }
}

/// The mold-side keyval backing `keyval`'s defaults: itself when
/// mold-rooted, its mold-equivalent otherwise.
fn mold_source_keyval(keyval: &Context) -> Result<Context> {
    if keyval.kind() != ContextKind::Keyval {
        bail!(Status::WrongContext, "expected a keyval, got {}", keyval.kind());
    }
    if keyval.root_is_mold() {
        return Ok(keyval.clone());
    }
    keyval
        .mold_equivalent()
        .ok_or_else(|| MoldError::new(Status::MoldMissing, "keyval has no mold-equivalent"))
}

/// The mold-side scope (Mold or mold-rooted Section) holding `parent`'s
/// elements in mold terms: itself when mold-rooted, the mold-equivalent
/// otherwise.
pub(crate) fn mold_scope_of(parent: &Context) -> Result<Context> {
    if parent.root_is_mold() {
        return Ok(parent.clone());
    }
    match parent.kind() {
        ContextKind::Config => match &parent.borrow().payload {
            Payload::Config(c) => Ok(c.mold.clone()),
            _ => unreachable!(),
        },
        ContextKind::Section => parent
            .mold_equivalent()
            .ok_or_else(|| MoldError::new(Status::MoldMissing, "section has no mold-equivalent")),
        other => bail!(Status::WrongContext, "{other} cannot own named elements"),
    }
}

/// `resolve_entries_bound(parent, name, v)`: walk the mold-equivalent
/// element's restriction queue for the applicable EntriesMin/EntriesMax
/// pair at `v`, applying the defaulting and correction rules of §4.7.
pub fn resolve_entries_bound(parent: &Context, name: &str, v: Version) -> Result<EntriesBound> {
    let scope = mold_scope_of(parent)?;
    let element = scope.elements_get_first(name)?;
    let introduced = element.get_introduced()?;
    let deprecated = element.get_deprecated()?;
    if !applicable_at(introduced, deprecated, v) {
        return Ok(EntriesBound { min: 0, max: -1 });
    }

    let restrictions = restriction_queue(&element)?;
    let min = restrictions
        .iter()
        .filter_map(|r| restriction_numeric_if(r, RestrictionKind::EntriesMin, v))
        .max_by_key(|(introduced, _)| *introduced)
        .map_or(1, |(_, n)| n as i64);
    let mut max = restrictions
        .iter()
        .filter_map(|r| restriction_numeric_if(r, RestrictionKind::EntriesMax, v))
        .max_by_key(|(introduced, _)| *introduced)
        .map_or(1, |(_, n)| n as i64);
    if max != 0 && max < min {
        max = min;
    }
    Ok(EntriesBound { min, max })
}

fn restriction_numeric_if(ctx: &Context, kind: RestrictionKind, v: Version) -> Option<(Version, f64)> {
    match &ctx.borrow().payload {
        Payload::Restriction(r) if r.kind == kind && applicable_at(r.introduced, r.deprecated, v) => {
            r.numeric.map(|n| (r.introduced, n))
        }
        _ => None,
    }
}

pub(crate) fn restriction_queue(ctx: &Context) -> Result<Vec<Context>> {
    match &ctx.borrow().payload {
        Payload::Section(s) => Ok(s.restrictions.iter().cloned().collect()),
        Payload::Keyval(k) => Ok(k.restrictions.iter().cloned().collect()),
        other => bail!(Status::WrongContext, "{} has no restriction queue", other.kind()),
    }
}

/// `resolve_exclusive_value(keyval, v)` (spec §4.7): a config keyval's
/// value must match at least one applicable ValueEnum/ValueNumeric/
/// ValueRange restriction on its mold-equivalent. An empty applicable set
/// is permissive, except for an enum-typed keyval, which always requires
/// at least one applicable ValueEnum restriction to be listed.
pub fn resolve_exclusive_value(keyval: &Context, v: Version) -> Result<bool> {
    let mold_equiv = keyval
        .mold_equivalent()
        .ok_or_else(|| MoldError::new(Status::MoldMissing, "keyval has no mold-equivalent"))?;
    let restrictions = restriction_queue(&mold_equiv)?;
    let applicable: Vec<Context> = restrictions
        .into_iter()
        .filter(|r| {
            matches!(
                &r.borrow().payload,
                Payload::Restriction(rd) if !rd.kind.is_inclusive() && applicable_at(rd.introduced, rd.deprecated, v)
            )
        })
        .collect();

    let value = keyval_value(keyval)?;
    if applicable.is_empty() {
        return Ok(value.value_type() != ValueType::Enum);
    }
    for r in &applicable {
        if restriction_matches_value(r, &value)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn keyval_value(ctx: &Context) -> Result<Value> {
    match &ctx.borrow().payload {
        Payload::Keyval(k) => Ok(k.value.clone()),
        other => bail!(Status::WrongContext, "{} is not a keyval", other.kind()),
    }
}

fn restriction_matches_value(ctx: &Context, value: &Value) -> Result<bool> {
    match &ctx.borrow().payload {
        Payload::Restriction(r) => match r.kind {
            RestrictionKind::ValueEnum => {
                let want = r.enum_value.as_deref().unwrap_or("");
                Ok(value.get_enum()?.unwrap_or("") == want)
            }
            RestrictionKind::ValueNumeric => Ok(numeric_of(value)? == r.numeric.unwrap_or(0.0)),
            RestrictionKind::ValueRange => {
                let (lo, hi) = r.range.unwrap_or((f64::MIN, f64::MAX));
                let n = numeric_of(value)?;
                Ok(n >= lo && n <= hi)
            }
            RestrictionKind::EntriesMin | RestrictionKind::EntriesMax => Ok(true),
        },
        _ => Ok(true),
    }
}

fn numeric_of(value: &Value) -> Result<f64> {
    match value {
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        other => bail!(Status::WrongValueType, "{} is not numeric", other.value_type()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{self, payload::ContextKind};

    fn build_mold_with_port_defaults() -> (Context, Context) {
        let mold = context::mold_begin();
        let port = context::begin(&mold, ContextKind::Keyval).unwrap();
        port.set_name("port").unwrap();
        {
            let mut inner = port.borrow_mut();
            if let Payload::Keyval(k) = &mut inner.payload {
                k.value = Value::Integer(0);
            }
        }
        let d1 = context::begin(&port, ContextKind::Default).unwrap();
        d1.add_introduced(Version::new(1, 0)).unwrap();
        {
            let mut inner = d1.borrow_mut();
            if let Payload::Default(d) = &mut inner.payload {
                d.value = Value::Integer(8080);
            }
        }
        let d2 = context::begin(&port, ContextKind::Default).unwrap();
        d2.add_introduced(Version::new(2, 0)).unwrap();
        {
            let mut inner = d2.borrow_mut();
            if let Payload::Default(d) = &mut inner.payload {
                d.value = Value::Integer(9090);
            }
        }
        {
            let mut inner = port.borrow_mut();
            if let Payload::Keyval(k) = &mut inner.payload {
                k.defaults.push_back(d1.clone());
                k.defaults.push_back(d2.clone());
            }
        }
        (mold, port)
    }

    #[test]
    fn resolve_default_picks_greatest_introduced_leq_v() {
        let (_mold, port) = build_mold_with_port_defaults();
        let at_15 = resolve_default(&port, Version::new(1, 5)).unwrap();
        assert_eq!(at_15.get_integer().unwrap(), 8080);
        let at_21 = resolve_default(&port, Version::new(2, 1)).unwrap();
        assert_eq!(at_21.get_integer().unwrap(), 9090);
    }

    #[test]
    fn resolve_default_missing_before_first_introduced() {
        let (_mold, port) = build_mold_with_port_defaults();
        let err = resolve_default(&port, Version::new(0, 5)).unwrap_err();
        assert_eq!(err.status, Status::DefaultMissing);
    }
}
