//! The flat operation surface named by spec §6, as free functions over
//! `mold-core`'s `Context` methods. A CLI or plugin calls these rather
//! than reaching into `mold_core::context` directly — this module is the
//! stable, documented entry point.

use mold_core::context::payload::{ContextKind, RestrictionKind};
use mold_core::context::{self, shortcuts, Context};
use mold_core::error::Result;
use mold_core::value::Value;
use mold_core::version::Version;
use mold_core::{collection::Collection, diff};

// --- Context operations (§4.5) ---

pub fn begin(parent: &Context, kind: ContextKind) -> Result<Context> {
    context::begin(parent, kind)
}

pub fn finalize(child: &Context) -> Result<()> {
    context::finalize(child)
}

pub fn destroy(ctx: &Context) -> Result<()> {
    context::destroy(ctx)
}

pub fn put(ctx: Context) -> Result<()> {
    context::put(ctx)
}

pub fn valid(ctx: &Context) -> Result<bool> {
    ctx.valid()
}

pub fn error(ctx: &Context) -> Option<String> {
    ctx.error()
}

pub fn fatal_error(ctx: &Context, message: impl Into<String>) -> Result<()> {
    ctx.fatal_error(message)
}

// --- Metadata (§4.6 / §6) ---

pub fn set_name(ctx: &Context, name: &str) -> Result<()> {
    ctx.set_name(name)
}

pub fn get_name(ctx: &Context) -> Result<String> {
    ctx.get_name()
}

pub fn resolve_root_name(ctx: &Context) -> Result<String> {
    ctx.resolve_root_name()
}

pub fn add_introduced(ctx: &Context, version: Version) -> Result<()> {
    ctx.add_introduced(version)
}

pub fn add_deprecated(ctx: &Context, version: Version) -> Result<()> {
    ctx.add_deprecated(version)
}

pub fn get_introduced(ctx: &Context) -> Result<Version> {
    ctx.get_introduced()
}

pub fn get_deprecated(ctx: &Context) -> Result<Option<Version>> {
    ctx.get_deprecated()
}

pub fn set_version(ctx: &Context, version: Version) -> Result<()> {
    ctx.set_version(version)
}

pub fn get_version(ctx: &Context) -> Result<Version> {
    ctx.get_version()
}

// --- Documentation, default, restriction (§4.6 / §6) ---

pub fn add_documentation(ctx: &Context, text: &str) -> Result<Context> {
    ctx.add_documentation(text)
}

pub fn get_documentation(ctx: &Context, version: Version) -> Result<(String, Version)> {
    ctx.get_documentation(version)
}

pub fn add_default(ctx: &Context, value: Value, version: Version) -> Result<Context> {
    ctx.add_default(value, version)
}

pub fn get_default(ctx: &Context, version: Version) -> Result<String> {
    ctx.get_default(version)
}

pub fn get_default_contexts(ctx: &Context) -> Result<Collection> {
    ctx.get_default_contexts()
}

pub fn set_restriction_type(ctx: &Context, kind: RestrictionKind) -> Result<()> {
    ctx.set_restriction_type(kind)
}

pub fn get_restriction_type(ctx: &Context) -> Result<RestrictionKind> {
    ctx.get_restriction_type()
}

pub fn set_restriction_string(ctx: &Context, s: &str) -> Result<()> {
    ctx.set_restriction_string(s)
}

pub fn get_restriction_string(ctx: &Context) -> Result<Option<String>> {
    ctx.get_restriction_string()
}

pub fn set_restriction_range(ctx: &Context, lo: f64, hi: f64) -> Result<()> {
    ctx.set_restriction_range(lo, hi)
}

pub fn get_restriction_range(ctx: &Context) -> Result<Option<(f64, f64)>> {
    ctx.get_restriction_range()
}

pub fn set_restriction_numeric(ctx: &Context, n: f64) -> Result<()> {
    ctx.set_restriction_numeric(n)
}

pub fn get_restriction_numeric(ctx: &Context) -> Result<Option<f64>> {
    ctx.get_restriction_numeric()
}

pub fn add_restriction_value_enum(ctx: &Context, value: &str, version: Version) -> Result<Context> {
    ctx.add_restriction_value_enum(value, version)
}

pub fn add_restriction_value_range(ctx: &Context, lo: f64, hi: f64, version: Version) -> Result<Context> {
    ctx.add_restriction_value_range(lo, hi, version)
}

pub fn add_restriction_value_numeric(ctx: &Context, n: f64, version: Version) -> Result<Context> {
    ctx.add_restriction_value_numeric(n, version)
}

pub fn add_restriction_entries_min(ctx: &Context, n: i64, version: Version) -> Result<Context> {
    ctx.add_restriction_entries_min(n, version)
}

pub fn add_restriction_entries_max(ctx: &Context, n: i64, version: Version) -> Result<Context> {
    ctx.add_restriction_entries_max(n, version)
}

pub fn restriction_entries_minimum(ctx: &Context) -> Result<i64> {
    ctx.restriction_entries_minimum()
}

pub fn restriction_entries_maximum(ctx: &Context) -> Result<i64> {
    ctx.restriction_entries_maximum()
}

pub fn restriction_collection(ctx: &Context) -> Result<Collection> {
    ctx.restriction_collection()
}

// --- Traversal (§6) ---

pub fn get_elements(ctx: &Context) -> Result<Collection> {
    ctx.elements()
}

pub fn find_elements(ctx: &Context, name: &str) -> Result<Collection> {
    ctx.find_elements(name)
}

pub fn find_element(ctx: &Context, name: &str, index: usize) -> Result<Context> {
    ctx.find_element(name, index)
}

pub fn query_resolve_context(parent: &Context, path: &str) -> Result<Context> {
    mold_core::query::query_resolve_context(parent, path)
}

// --- Keyval shortcuts (§6) ---

pub fn add_keyval_string(parent: &Context, name: &str, default: &str, doc: &str, version: Version) -> Result<Context> {
    shortcuts::add_keyval_string(parent, name, default, doc, version)
}

pub fn add_keyval_integer(parent: &Context, name: &str, default: i64, doc: &str, version: Version) -> Result<Context> {
    shortcuts::add_keyval_integer(parent, name, default, doc, version)
}

pub fn add_keyval_float(parent: &Context, name: &str, default: f64, doc: &str, version: Version) -> Result<Context> {
    shortcuts::add_keyval_float(parent, name, default, doc, version)
}

pub fn add_keyval_boolean(parent: &Context, name: &str, default: bool, doc: &str, version: Version) -> Result<Context> {
    shortcuts::add_keyval_boolean(parent, name, default, doc, version)
}

pub fn add_keyval_enum(parent: &Context, name: &str, default: &str, doc: &str, version: Version) -> Result<Context> {
    shortcuts::add_keyval_enum(parent, name, default, doc, version)
}

// --- Roots (§6) ---

pub fn mold_begin() -> Context {
    context::mold_begin()
}

pub fn mold_finalize(mold: &Context) -> Result<()> {
    context::mold_finalize(mold)
}

pub fn config_begin(mold: &Context) -> Result<Context> {
    context::config_begin(mold)
}

pub fn config_finalize(config: &Context) -> Result<()> {
    context::config_finalize(config)
}

pub fn config_get_version(config: &Context) -> Result<Version> {
    config.get_version()
}

pub fn mold_get_version(mold: &Context) -> Result<Version> {
    mold.get_version()
}

pub fn free_text_create(text: &str) -> Context {
    shortcuts::free_text_create(text)
}

// --- Comparison (§4.9 / §6) ---

/// `compare(lhs, rhs, report)→conflict|ok`. `report`, when given, is
/// filled with the diagnostic strings produced; the return value is
/// `true` on conflict.
pub fn compare(lhs: &Context, rhs: &Context, report: Option<&mut Vec<String>>) -> Result<bool> {
    let entries = diff::compare(lhs, rhs)?;
    let conflict = !entries.is_empty();
    if let Some(out) = report {
        *out = entries;
    }
    Ok(conflict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_surface_builds_a_minimal_mold_keyval() {
        let mold = mold_begin();
        let port = add_keyval_integer(&mold, "port", 8080, "listening port", Version::initial()).unwrap();
        assert_eq!(get_name(&port).unwrap(), "port");
        mold_finalize(&mold).unwrap();
        assert_eq!(mold_get_version(&mold).unwrap(), Version::initial());
    }

    #[test]
    fn compare_reports_root_kind_mismatch() {
        let mold = mold_begin();
        let _port = add_keyval_integer(&mold, "port", 8080, "", Version::initial()).unwrap();
        mold_finalize(&mold).unwrap();
        let config = config_begin(&mold).unwrap();
        config_finalize(&config).unwrap();

        let mut report = Vec::new();
        let conflict = compare(&mold, &config, Some(&mut report)).unwrap();
        assert!(conflict);
        assert_eq!(report.len(), 1);
    }
}
