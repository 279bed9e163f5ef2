//! Structural pairwise comparison (spec §4.9).

use crate::context::payload::{ContextKind, Payload};
use crate::context::Context;
use crate::error::Result;
use crate::version::Version;

const STRINGIFY_CAP: usize = 256;

/// `compare(lhs, rhs)`: append-only diff report. An empty report means
/// `lhs` and `rhs` are semantically equal.
pub fn compare(lhs: &Context, rhs: &Context) -> Result<Vec<String>> {
    let mut report = Vec::new();
    diff_into(lhs, rhs, &mut report)?;
    tracing::debug!(entries = report.len(), "diff produced");
    Ok(report)
}

/// `compare(lhs, rhs)→conflict|ok` (spec §6): `true` when the report is
/// non-empty.
pub fn has_conflict(lhs: &Context, rhs: &Context) -> Result<bool> {
    Ok(!compare(lhs, rhs)?.is_empty())
}

fn diff_into(lhs: &Context, rhs: &Context, report: &mut Vec<String>) -> Result<()> {
    let lhs_root_kind = lhs.root()?.kind();
    let rhs_root_kind = rhs.root()?.kind();
    if lhs_root_kind != rhs_root_kind {
        report.push(format!(
            "root kind mismatch: {} at '{}' vs {} at '{}'",
            lhs_root_kind,
            path_of(lhs),
            rhs_root_kind,
            path_of(rhs)
        ));
        return Ok(());
    }

    if lhs.kind() != rhs.kind() {
        report.push(format!(
            "kind mismatch at '{}': {} vs {}",
            path_of(lhs),
            lhs.kind(),
            rhs.kind()
        ));
        return Ok(());
    }

    if let (Some(l), Some(r)) = (value_type_of(lhs), value_type_of(rhs)) {
        if l != r {
            report.push(format!("value type mismatch at '{}': {} vs {}", path_of(lhs), l, r));
            return Ok(());
        }
    }

    match lhs.kind() {
        ContextKind::Keyval => diff_keyval(lhs, rhs, report),
        ContextKind::Section | ContextKind::Config | ContextKind::Mold => diff_scope(lhs, rhs, report),
        _ => Ok(()),
    }
}

fn value_type_of(ctx: &Context) -> Option<crate::value::ValueType> {
    match &ctx.borrow().payload {
        Payload::Keyval(k) => Some(k.value.value_type()),
        _ => None,
    }
}

fn path_of(ctx: &Context) -> String {
    ctx.resolve_root_name().unwrap_or_else(|_| ctx.kind().to_string())
}

fn diff_keyval(lhs: &Context, rhs: &Context, report: &mut Vec<String>) -> Result<()> {
    let (lv, rv) = {
        let li = lhs.borrow();
        let ri = rhs.borrow();
        match (&li.payload, &ri.payload) {
            (Payload::Keyval(l), Payload::Keyval(r)) => (l.value.stringify(STRINGIFY_CAP), r.value.stringify(STRINGIFY_CAP)),
            _ => unreachable!("kind already matched"),
        }
    };
    if lv != rv {
        report.push(format!("value mismatch at '{}': '{lv}' vs '{rv}'", path_of(lhs)));
    }

    if lhs.root_is_mold() {
        diff_documentation_queue(lhs, rhs, report)?;
        diff_default_queue(lhs, rhs, report)?;
        diff_restriction_queue(lhs, rhs, report)?;
    }
    Ok(())
}

fn diff_scope(lhs: &Context, rhs: &Context, report: &mut Vec<String>) -> Result<()> {
    let lhs_names = scope_names(lhs);
    let rhs_names = scope_names(rhs);

    for name in &lhs_names {
        let left_children = scope_children(lhs, name);
        let right_children = scope_children(rhs, name);
        if !rhs_names.contains(name) {
            report.push(format!("'{name}' present at '{}' but missing on the right", path_of(lhs)));
            continue;
        }
        let max_len = left_children.len().max(right_children.len());
        for i in 0..max_len {
            match (left_children.get(i), right_children.get(i)) {
                (Some(l), Some(r)) => diff_into(l, r, report)?,
                (Some(l), None) => report.push(format!("'{name}'@{i} present at '{}' but missing on the right", path_of(l))),
                (None, Some(r)) => report.push(format!("'{name}'@{i} present at '{}' but missing on the left", path_of(r))),
                (None, None) => unreachable!(),
            }
        }
    }
    for name in &rhs_names {
        if !lhs_names.contains(name) {
            report.push(format!("'{name}' present at '{}' but missing on the left", path_of(rhs)));
        }
    }
    Ok(())
}

fn scope_names(ctx: &Context) -> Vec<String> {
    let inner = ctx.borrow();
    let elements = match &inner.payload {
        Payload::Mold(m) => &m.elements,
        Payload::Config(c) => &c.elements,
        Payload::Section(s) => &s.elements,
        _ => return Vec::new(),
    };
    elements.names().into_iter().map(str::to_string).collect()
}

fn scope_children(ctx: &Context, name: &str) -> Vec<Context> {
    let inner = ctx.borrow();
    let elements = match &inner.payload {
        Payload::Mold(m) => &m.elements,
        Payload::Config(c) => &c.elements,
        Payload::Section(s) => &s.elements,
        _ => return Vec::new(),
    };
    elements.get(name).map(crate::collection::Collection::into_vec).unwrap_or_default()
}

fn diff_documentation_queue(lhs: &Context, rhs: &Context, report: &mut Vec<String>) -> Result<()> {
    let left = documentation_entries(lhs);
    let right = documentation_entries(rhs);
    diff_queue(&left, &right, "documentation", lhs, report, |(lv, lt), (rv, rt)| {
        if lv != rv || lt != rt {
            Some(format!("documentation at {lv} differs: '{lt}' vs '{rt}' (right version {rv})"))
        } else {
            None
        }
    });
    Ok(())
}

fn documentation_entries(ctx: &Context) -> Vec<(Version, String)> {
    match &ctx.borrow().payload {
        Payload::Mold(m) => m.documentation.iter().map(documentation_pair).collect(),
        Payload::Section(s) => s.documentation.iter().map(documentation_pair).collect(),
        Payload::Keyval(k) => k.documentation.iter().map(documentation_pair).collect(),
        _ => Vec::new(),
    }
}

fn documentation_pair(ctx: &Context) -> (Version, String) {
    match &ctx.borrow().payload {
        Payload::Documentation(d) => (d.introduced, d.text.clone()),
        _ => unreachable!(),
    }
}

fn diff_default_queue(lhs: &Context, rhs: &Context, report: &mut Vec<String>) -> Result<()> {
    let left = default_entries(lhs);
    let right = default_entries(rhs);
    diff_queue(&left, &right, "default", lhs, report, |(lv, lt), (rv, rt)| {
        if lv != rv || lt != rt {
            Some(format!("default at {lv} differs: '{lt}' vs '{rt}' (right version {rv})"))
        } else {
            None
        }
    });
    Ok(())
}

fn default_entries(ctx: &Context) -> Vec<(Version, String)> {
    match &ctx.borrow().payload {
        Payload::Keyval(k) => k
            .defaults
            .iter()
            .map(|d| match &d.borrow().payload {
                Payload::Default(dd) => (dd.introduced, dd.value.stringify(STRINGIFY_CAP)),
                _ => unreachable!(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn diff_restriction_queue(lhs: &Context, rhs: &Context, report: &mut Vec<String>) -> Result<()> {
    let left = restriction_entries(lhs);
    let right = restriction_entries(rhs);
    diff_queue(&left, &right, "restriction", lhs, report, |(lv, lt), (rv, rt)| {
        if lv != rv || lt != rt {
            Some(format!("restriction at {lv} differs: '{lt}' vs '{rt}' (right version {rv})"))
        } else {
            None
        }
    });
    Ok(())
}

fn restriction_entries(ctx: &Context) -> Vec<(Version, String)> {
    match &ctx.borrow().payload {
        Payload::Keyval(k) => k.restrictions.iter().map(restriction_pair).collect(),
        Payload::Section(s) => s.restrictions.iter().map(restriction_pair).collect(),
        _ => Vec::new(),
    }
}

fn restriction_pair(ctx: &Context) -> (Version, String) {
    match &ctx.borrow().payload {
        Payload::Restriction(r) => {
            let content = match r.kind {
                crate::context::payload::RestrictionKind::EntriesMin | crate::context::payload::RestrictionKind::EntriesMax => {
                    format!("{:?}={}", r.kind, r.numeric.unwrap_or_default())
                }
                crate::context::payload::RestrictionKind::ValueNumeric => format!("{:?}={}", r.kind, r.numeric.unwrap_or_default()),
                crate::context::payload::RestrictionKind::ValueRange => {
                    let (lo, hi) = r.range.unwrap_or_default();
                    format!("{:?}={lo}..{hi}", r.kind)
                }
                crate::context::payload::RestrictionKind::ValueEnum => {
                    format!("{:?}={}", r.kind, r.enum_value.clone().unwrap_or_default())
                }
            };
            (r.introduced, content)
        }
        _ => unreachable!(),
    }
}

/// Walks two already version-sorted entry lists in lockstep, emitting a
/// per-position mismatch via `mismatch` and reporting any length
/// difference once per excess entry (spec §4.9 point 5).
fn diff_queue<T: Clone>(
    left: &[T],
    right: &[T],
    label: &str,
    owner: &Context,
    report: &mut Vec<String>,
    mismatch: impl Fn(T, T) -> Option<String>,
) {
    let shared = left.len().min(right.len());
    for i in 0..shared {
        if let Some(msg) = mismatch(left[i].clone(), right[i].clone()) {
            report.push(msg);
        }
    }
    if left.len() > right.len() {
        for _ in right.len()..left.len() {
            report.push(format!("{label} queue at '{}' has an entry missing on the right", path_of(owner)));
        }
    } else if right.len() > left.len() {
        for _ in left.len()..right.len() {
            report.push(format!("{label} queue at '{}' has an entry missing on the left", path_of(owner)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{self, payload::ContextKind};
    use crate::value::Value;

    fn build_config_with_port(port_value: i64) -> (Context, Context) {
        let mold = context::mold_begin();
        let port = context::begin(&mold, ContextKind::Keyval).unwrap();
        port.set_name("port").unwrap();
        {
            let mut inner = port.borrow_mut();
            if let Payload::Keyval(k) = &mut inner.payload {
                k.value = Value::Integer(0);
            }
        }
        let default = context::begin(&port, ContextKind::Default).unwrap();
        {
            let mut inner = default.borrow_mut();
            if let Payload::Default(d) = &mut inner.payload {
                d.value = Value::Integer(8080);
            }
        }
        context::finalize(&default).unwrap();
        context::finalize(&port).unwrap();
        context::mold_finalize(&mold).unwrap();

        let config = context::config_begin(&mold).unwrap();
        let config_port = context::begin(&config, ContextKind::Keyval).unwrap();
        config_port.set_name("port").unwrap();
        {
            let mut inner = config_port.borrow_mut();
            if let Payload::Keyval(k) = &mut inner.payload {
                k.value = Value::Integer(port_value);
            }
        }
        context::finalize(&config_port).unwrap();
        context::config_finalize(&config).unwrap();
        (mold, config)
    }

    #[test]
    fn identical_configs_diff_empty() {
        let (_m1, c1) = build_config_with_port(8080);
        let (_m2, c2) = build_config_with_port(8080);
        assert!(compare(&c1, &c2).unwrap().is_empty());
        assert!(!has_conflict(&c1, &c2).unwrap());
    }

    #[test]
    fn differing_keyval_value_is_reported() {
        let (_m1, c1) = build_config_with_port(8080);
        let (_m2, c2) = build_config_with_port(9090);
        let report = compare(&c1, &c2).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report[0].contains("8080"));
        assert!(report[0].contains("9090"));
        assert!(has_conflict(&c1, &c2).unwrap());
    }

    #[test]
    fn root_kind_mismatch_short_circuits() {
        let (mold, _config) = build_config_with_port(8080);
        let (_mold2, config2) = build_config_with_port(8080);
        let report = compare(&mold, &config2).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report[0].contains("root kind mismatch"));
    }
}
