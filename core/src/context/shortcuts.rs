//! Documentation/Default/Restriction attachment and Keyval shortcuts
//! (spec §4.6, §6). Each performs begin/set-value/finalize in one step;
//! on an invalid or wrong-kinded parent, the shortcut surfaces the same
//! status the explicit sequence would.

use super::payload::{ContextKind, Payload, RestrictionKind};
use super::{begin, finalize, Context};
use crate::collection::Collection;
use crate::error::{bail, MoldError, Result, Status};
use crate::value::{Value, ValueType};
use crate::version::Version;

impl Context {
    /// `add_documentation(ctx, text)` at version 1.0. Spec §8 boundary
    /// behavior: a second Documentation at the same introduced version
    /// returns `Exists` via this shortcut (the explicit begin/finalize
    /// sequence instead surfaces `ConflictingVersion`, masked as
    /// `InvalidContext` while the parent is still `Constructing`).
    pub fn add_documentation(&self, text: &str) -> Result<Context> {
        if self.has_documentation_at(Version::initial()) {
            bail!(Status::Exists, "a documentation entry already exists at version {}", Version::initial());
        }
        let doc = begin(self, ContextKind::Documentation)?;
        {
            let mut inner = doc.borrow_mut();
            if let Payload::Documentation(d) = &mut inner.payload {
                d.text = text.to_string();
            }
        }
        finalize(&doc)?;
        Ok(doc)
    }

    fn has_documentation_at(&self, version: Version) -> bool {
        match &self.borrow().payload {
            Payload::Mold(m) => m.documentation.iter().any(|d| documentation_introduced(d) == version),
            Payload::Section(s) => s.documentation.iter().any(|d| documentation_introduced(d) == version),
            Payload::Keyval(k) => k.documentation.iter().any(|d| documentation_introduced(d) == version),
            _ => false,
        }
    }

    /// `get_documentation(ctx, version)→(string, found_version)`.
    pub fn get_documentation(&self, version: Version) -> Result<(String, Version)> {
        crate::resolution::resolve_documentation(self, version)
    }

    /// `add_default_*(ctx, value, version)`: attaches a Default to a mold
    /// Keyval. `value` must already match the keyval's bound type.
    pub fn add_default(&self, value: Value, version: Version) -> Result<Context> {
        self.ensure_keyval()?;
        let own_type = self.keyval_value_type()?;
        if value.value_type() != own_type {
            bail!(Status::WrongValueType, "default value type {} does not match keyval type {own_type}", value.value_type());
        }
        let default = begin(self, ContextKind::Default)?;
        {
            let mut inner = default.borrow_mut();
            if let Payload::Default(d) = &mut inner.payload {
                d.value = value;
            }
        }
        default.add_introduced(version)?;
        finalize(&default)?;
        Ok(default)
    }

    /// `get_default(ctx, version)→stringified`.
    pub fn get_default(&self, version: Version) -> Result<String> {
        Ok(crate::resolution::resolve_default(self, version)?.stringify(usize::MAX))
    }

    /// `set_value(ctx, value)`: binds a Keyval's own value, typically a
    /// config-side Keyval once its mold-equivalent has pinned a type via
    /// `set_name`. Only legal while `Constructing` (spec §5).
    pub fn set_value(&self, value: Value) -> Result<()> {
        self.ensure_keyval()?;
        if self.state() != super::NodeState::Constructing {
            bail!(Status::ContextInWrongState, "cannot set the value of a finalized keyval");
        }
        let own_type = self.keyval_value_type()?;
        if value.value_type() != own_type {
            bail!(Status::WrongValueType, "value type {} does not match keyval type {own_type}", value.value_type());
        }
        let mut inner = self.borrow_mut();
        if let Payload::Keyval(k) = &mut inner.payload {
            k.value = value;
        }
        Ok(())
    }

    /// `get_value(ctx)`: a Keyval's own bound value.
    pub fn get_value(&self) -> Result<Value> {
        self.ensure_keyval()?;
        match &self.borrow().payload {
            Payload::Keyval(k) => Ok(k.value.clone()),
            _ => unreachable!(),
        }
    }

    /// `get_default_contexts(ctx)→collection`.
    pub fn get_default_contexts(&self) -> Result<Collection> {
        match &self.borrow().payload {
            Payload::Keyval(k) => Ok(Collection::from_vec(k.defaults.iter().cloned().collect())),
            other => bail!(Status::WrongContext, "{} has no default queue", other.kind()),
        }
    }

    /// `set_restriction_type(ctx, kind)`. Only legal while `Constructing`.
    pub fn set_restriction_type(&self, kind: RestrictionKind) -> Result<()> {
        self.ensure_restriction_constructing()?;
        let mut inner = self.borrow_mut();
        if let Payload::Restriction(r) = &mut inner.payload {
            r.kind = kind;
        }
        Ok(())
    }

    /// `get_restriction_type(ctx)`.
    pub fn get_restriction_type(&self) -> Result<RestrictionKind> {
        match &self.borrow().payload {
            Payload::Restriction(r) => Ok(r.kind),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `set_restriction_string(ctx, s)`: the enum value of a ValueEnum
    /// restriction.
    pub fn set_restriction_string(&self, s: &str) -> Result<()> {
        self.ensure_restriction_constructing()?;
        let mut inner = self.borrow_mut();
        match &mut inner.payload {
            Payload::Restriction(r) if r.kind == RestrictionKind::ValueEnum => {
                r.enum_value = Some(s.to_string());
                Ok(())
            }
            Payload::Restriction(r) => bail!(Status::WrongContext, "{:?} restriction has no string value", r.kind),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `get_restriction_string(ctx)`.
    pub fn get_restriction_string(&self) -> Result<Option<String>> {
        match &self.borrow().payload {
            Payload::Restriction(r) => Ok(r.enum_value.clone()),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `set_restriction_range(ctx, lo, hi)`: the bounds of a ValueRange
    /// restriction.
    pub fn set_restriction_range(&self, lo: f64, hi: f64) -> Result<()> {
        self.ensure_restriction_constructing()?;
        let mut inner = self.borrow_mut();
        match &mut inner.payload {
            Payload::Restriction(r) if r.kind == RestrictionKind::ValueRange => {
                r.range = Some((lo, hi));
                Ok(())
            }
            Payload::Restriction(r) => bail!(Status::WrongContext, "{:?} restriction has no range", r.kind),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `get_restriction_range(ctx)`.
    pub fn get_restriction_range(&self) -> Result<Option<(f64, f64)>> {
        match &self.borrow().payload {
            Payload::Restriction(r) => Ok(r.range),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `set_restriction_numeric(ctx, n)`: the scalar of an EntriesMin,
    /// EntriesMax, or ValueNumeric restriction.
    pub fn set_restriction_numeric(&self, n: f64) -> Result<()> {
        self.ensure_restriction_constructing()?;
        let mut inner = self.borrow_mut();
        if let Payload::Restriction(r) = &mut inner.payload {
            r.numeric = Some(n);
        }
        Ok(())
    }

    /// `get_restriction_numeric(ctx)`.
    pub fn get_restriction_numeric(&self) -> Result<Option<f64>> {
        match &self.borrow().payload {
            Payload::Restriction(r) => Ok(r.numeric),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `add_restriction_value_enum(ctx, value, version)`: attach a
    /// ValueEnum restriction to a mold-side Keyval. Spec §3.2 invariant 5:
    /// ValueEnum requires a parent Keyval of enum type; §8 boundary
    /// behavior: a non-enum parent returns `WrongValueType`.
    pub fn add_restriction_value_enum(&self, value: &str, version: Version) -> Result<Context> {
        self.ensure_keyval_of_type(ValueType::Enum)?;
        let r = self.begin_restriction(RestrictionKind::ValueEnum, version)?;
        r.set_restriction_string(value)?;
        finalize(&r)?;
        Ok(r)
    }

    /// `add_restriction_value_range(ctx, lo, hi, version)`. Spec §3.2
    /// invariant 5: ValueRange requires a parent Keyval of Integer or
    /// Float type.
    pub fn add_restriction_value_range(&self, lo: f64, hi: f64, version: Version) -> Result<Context> {
        self.ensure_keyval_of_numeric_type()?;
        let r = self.begin_restriction(RestrictionKind::ValueRange, version)?;
        r.set_restriction_range(lo, hi)?;
        finalize(&r)?;
        Ok(r)
    }

    /// `add_restriction_value_numeric(ctx, n, version)`. Spec §3.2
    /// invariant 5: ValueNumeric requires a parent Keyval of Integer or
    /// Float type.
    pub fn add_restriction_value_numeric(&self, n: f64, version: Version) -> Result<Context> {
        self.ensure_keyval_of_numeric_type()?;
        let r = self.begin_restriction(RestrictionKind::ValueNumeric, version)?;
        r.set_restriction_numeric(n)?;
        finalize(&r)?;
        Ok(r)
    }

    fn ensure_keyval_of_type(&self, wanted: ValueType) -> Result<()> {
        self.ensure_keyval()?;
        let own = self.keyval_value_type()?;
        if own != wanted {
            bail!(Status::WrongValueType, "a {wanted} restriction requires a {wanted} keyval, got {own}");
        }
        Ok(())
    }

    fn ensure_keyval_of_numeric_type(&self) -> Result<()> {
        self.ensure_keyval()?;
        let own = self.keyval_value_type()?;
        if !matches!(own, ValueType::Integer | ValueType::Float) {
            bail!(Status::WrongValueType, "a numeric restriction requires an integer or float keyval, got {own}");
        }
        Ok(())
    }

    /// `add_restriction_entries_min(ctx, n, version)`.
    pub fn add_restriction_entries_min(&self, n: i64, version: Version) -> Result<Context> {
        let r = self.begin_restriction(RestrictionKind::EntriesMin, version)?;
        r.set_restriction_numeric(n as f64)?;
        finalize(&r)?;
        Ok(r)
    }

    /// `add_restriction_entries_max(ctx, n, version)`.
    pub fn add_restriction_entries_max(&self, n: i64, version: Version) -> Result<Context> {
        let r = self.begin_restriction(RestrictionKind::EntriesMax, version)?;
        r.set_restriction_numeric(n as f64)?;
        finalize(&r)?;
        Ok(r)
    }

    fn begin_restriction(&self, kind: RestrictionKind, version: Version) -> Result<Context> {
        let r = begin(self, ContextKind::Restriction)?;
        r.set_restriction_type(kind)?;
        r.add_introduced(version)?;
        Ok(r)
    }

    fn ensure_restriction_constructing(&self) -> Result<()> {
        if self.kind() != ContextKind::Restriction {
            bail!(Status::WrongContext, "expected a restriction, got {}", self.kind());
        }
        if self.state() != super::NodeState::Constructing {
            bail!(Status::ContextInWrongState, "cannot mutate a finalized restriction");
        }
        Ok(())
    }

    /// `restriction_entries_minimum(ctx)→int`: the numeric scalar of an
    /// EntriesMin restriction.
    pub fn restriction_entries_minimum(&self) -> Result<i64> {
        self.restriction_entries_scalar(RestrictionKind::EntriesMin)
    }

    /// `restriction_entries_maximum(ctx)→int`: the numeric scalar of an
    /// EntriesMax restriction.
    pub fn restriction_entries_maximum(&self) -> Result<i64> {
        self.restriction_entries_scalar(RestrictionKind::EntriesMax)
    }

    fn restriction_entries_scalar(&self, want: RestrictionKind) -> Result<i64> {
        match &self.borrow().payload {
            Payload::Restriction(r) if r.kind == want => Ok(r.numeric.unwrap_or(0.0) as i64),
            Payload::Restriction(r) => bail!(Status::WrongContext, "restriction is {:?}, not {want:?}", r.kind),
            other => bail!(Status::WrongContext, "{} is not a restriction", other.kind()),
        }
    }

    /// `restriction_collection(ctx)→collection`: the restriction queue of
    /// a Section or Keyval, in stored order.
    pub fn restriction_collection(&self) -> Result<Collection> {
        Ok(Collection::from_vec(crate::resolution::restriction_queue(self)?))
    }

    fn ensure_keyval(&self) -> Result<()> {
        if self.kind() != ContextKind::Keyval {
            bail!(Status::WrongContext, "expected a keyval, got {}", self.kind());
        }
        Ok(())
    }

    fn keyval_value_type(&self) -> Result<ValueType> {
        match &self.borrow().payload {
            Payload::Keyval(k) => Ok(k.value.value_type()),
            other => bail!(Status::WrongContext, "{} is not a keyval", other.kind()),
        }
    }
}

fn documentation_introduced(ctx: &Context) -> Version {
    match &ctx.borrow().payload {
        Payload::Documentation(d) => d.introduced,
        _ => unreachable!(),
    }
}

/// One mold-side keyval, built in one step: begins a Keyval under
/// `parent`, binds its name and value type, attaches a Default and (if
/// `doc` is non-empty) a Documentation child, and finalizes it (spec §6
/// "Keyval shortcuts").
fn add_keyval(parent: &Context, name: &str, default: Value, doc: &str, version: Version) -> Result<Context> {
    let keyval = begin(parent, ContextKind::Keyval)?;
    {
        let mut inner = keyval.borrow_mut();
        if let Payload::Keyval(k) = &mut inner.payload {
            k.value = Value::empty(default.value_type());
        }
    }
    keyval.set_name(name)?;
    keyval.add_introduced(version)?;
    keyval.add_default(default, version)?;
    if !doc.is_empty() {
        keyval.add_documentation(doc)?;
    }
    finalize(&keyval)?;
    Ok(keyval)
}

/// `add_keyval_string(parent, name, default, doc, version)→ctx`.
pub fn add_keyval_string(parent: &Context, name: &str, default: &str, doc: &str, version: Version) -> Result<Context> {
    add_keyval(parent, name, Value::String(if default.is_empty() { None } else { Some(default.to_string()) }), doc, version)
}

/// `add_keyval_integer(parent, name, default, doc, version)→ctx`.
pub fn add_keyval_integer(parent: &Context, name: &str, default: i64, doc: &str, version: Version) -> Result<Context> {
    add_keyval(parent, name, Value::Integer(default), doc, version)
}

/// `add_keyval_float(parent, name, default, doc, version)→ctx`.
pub fn add_keyval_float(parent: &Context, name: &str, default: f64, doc: &str, version: Version) -> Result<Context> {
    add_keyval(parent, name, Value::Float(default), doc, version)
}

/// `add_keyval_boolean(parent, name, default, doc, version)→ctx`.
pub fn add_keyval_boolean(parent: &Context, name: &str, default: bool, doc: &str, version: Version) -> Result<Context> {
    add_keyval(parent, name, Value::Boolean(default), doc, version)
}

/// `add_keyval_enum(parent, name, default, doc, version)→ctx`.
pub fn add_keyval_enum(parent: &Context, name: &str, default: &str, doc: &str, version: Version) -> Result<Context> {
    add_keyval(parent, name, Value::Enum(if default.is_empty() { None } else { Some(default.to_string()) }), doc, version)
}

/// `free_text_create(text)→ctx`: an out-of-tree string holder with no
/// parent, for callers that need a context handle around a string
/// without attaching it anywhere.
#[must_use]
pub fn free_text_create(text: &str) -> Context {
    Context::root_from_rc(|weak| {
        std::cell::RefCell::new(super::Inner {
            payload: Payload::FreeText(super::payload::FreeTextData { text: text.to_string() }),
            state: super::NodeState::Finalized,
            flags: super::Flags::default(),
            parent: None,
            root: weak,
            error_message: None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context;

    #[test]
    fn add_documentation_attaches_at_default_version() {
        let mold = context::mold_begin();
        mold.add_documentation("top-level mold").unwrap();
        let (text, version) = mold.get_documentation(Version::initial()).unwrap();
        assert_eq!(text, "top-level mold");
        assert_eq!(version, Version::initial());
    }

    #[test]
    fn add_documentation_twice_is_exists() {
        let mold = context::mold_begin();
        mold.add_documentation("first").unwrap();
        let err = mold.add_documentation("second").unwrap_err();
        assert_eq!(err.status, Status::Exists);
    }

    #[test]
    fn add_keyval_integer_builds_a_complete_mold_keyval() {
        let mold = context::mold_begin();
        let port = add_keyval_integer(&mold, "port", 8080, "listening port", Version::initial()).unwrap();
        assert_eq!(port.get_name().unwrap(), "port");
        assert_eq!(port.get_default(Version::initial()).unwrap(), "8080");
        let (doc, _) = port.get_documentation(Version::initial()).unwrap();
        assert_eq!(doc, "listening port");
    }

    #[test]
    fn restriction_scalars_round_trip() {
        let mold = context::mold_begin();
        let port = add_keyval_integer(&mold, "port", 8080, "", Version::initial()).unwrap();
        let min = port.add_restriction_entries_min(2, Version::initial()).unwrap();
        assert_eq!(min.restriction_entries_minimum().unwrap(), 2);
        let err = min.restriction_entries_maximum().unwrap_err();
        assert_eq!(err.status, Status::WrongContext);
    }

    #[test]
    fn value_enum_restriction_on_a_non_enum_keyval_is_wrong_value_type() {
        let mold = context::mold_begin();
        let port = add_keyval_integer(&mold, "port", 8080, "", Version::initial()).unwrap();
        let err = port.add_restriction_value_enum("on", Version::initial()).unwrap_err();
        assert_eq!(err.status, Status::WrongValueType);
    }

    #[test]
    fn value_range_restriction_on_a_string_keyval_is_wrong_value_type() {
        let mold = context::mold_begin();
        let name = add_keyval_string(&mold, "name", "x", "", Version::initial()).unwrap();
        let err = name.add_restriction_value_range(0.0, 10.0, Version::initial()).unwrap_err();
        assert_eq!(err.status, Status::WrongValueType);
    }

    #[test]
    fn set_value_rejects_a_mismatched_type() {
        // A freshly begun Keyval is placeholder-typed String until a
        // mold-equivalent (config side) or a shortcut (mold side) pins
        // its real type.
        let mold = context::mold_begin();
        let port = context::begin(&mold, ContextKind::Keyval).unwrap();
        port.set_name("port").unwrap();
        port.set_value(Value::String(Some("ok".into()))).unwrap();
        let err = port.set_value(Value::Integer(8080)).unwrap_err();
        assert_eq!(err.status, Status::WrongValueType);
    }

    #[test]
    fn set_value_round_trips_on_a_matching_type() {
        let mold = context::mold_begin();
        let port = context::begin(&mold, ContextKind::Keyval).unwrap();
        port.set_name("port").unwrap();
        port.set_value(Value::String(Some("hello".into()))).unwrap();
        assert_eq!(port.get_value().unwrap().get_string().unwrap(), Some("hello"));
    }

    #[test]
    fn free_text_holds_its_string_out_of_tree() {
        let ft = free_text_create("hello");
        assert_eq!(ft.kind(), ContextKind::FreeText);
        assert!(ft.parent().unwrap().is_none());
    }
}
