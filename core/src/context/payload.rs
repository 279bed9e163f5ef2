//! Per-kind payloads carried by a [`super::Context`] (spec §3.1).

use crate::context::ContextRef;
use crate::element_storage::ElementStorage;
use crate::value::{Value, ValueType};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The kind tag of a context. Every [`Payload`] variant carries exactly
/// one of these, so the tag and the payload can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    Config,
    Mold,
    Section,
    Keyval,
    Documentation,
    Default,
    Restriction,
    FreeText,
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContextKind::Config => "config",
            ContextKind::Mold => "mold",
            ContextKind::Section => "section",
            ContextKind::Keyval => "keyval",
            ContextKind::Documentation => "documentation",
            ContextKind::Default => "default",
            ContextKind::Restriction => "restriction",
            ContextKind::FreeText => "free_text",
        };
        f.write_str(name)
    }
}

/// The restriction kind tag (spec §3.1). `EntriesMin`/`EntriesMax` are
/// inclusive cardinality bounds; the rest are exclusive value constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictionKind {
    EntriesMin,
    EntriesMax,
    ValueEnum,
    ValueRange,
    ValueNumeric,
}

impl RestrictionKind {
    #[must_use]
    pub const fn is_inclusive(self) -> bool {
        matches!(self, RestrictionKind::EntriesMin | RestrictionKind::EntriesMax)
    }
}

/// `struct disir_mold` in the source: version, documentation queue,
/// element storage of keyval/section children.
#[derive(Debug)]
pub struct MoldData {
    pub version: Version,
    pub documentation: VecDeque<ContextRef>,
    pub elements: ElementStorage,
}

impl MoldData {
    pub(crate) fn new() -> Self {
        Self {
            version: Version::initial(),
            documentation: VecDeque::new(),
            elements: ElementStorage::new(),
        }
    }
}

/// `struct disir_config`: version (<= mold version), mold pointer,
/// element storage, optional origin-plugin tag.
pub struct ConfigData {
    pub version: Version,
    pub mold: ContextRef,
    pub elements: ElementStorage,
    pub origin_plugin: Option<String>,
}

impl std::fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigData")
            .field("version", &self.version)
            .field("origin_plugin", &self.origin_plugin)
            .finish_non_exhaustive()
    }
}

/// `struct disir_section`: name, introduced/deprecated, documentation
/// queue, restriction queue, element storage, and (config-rooted) a
/// non-owning mold-equivalent back-reference.
#[derive(Debug)]
pub struct SectionData {
    pub name: String,
    pub introduced: Version,
    pub deprecated: Option<Version>,
    pub documentation: VecDeque<ContextRef>,
    pub restrictions: VecDeque<ContextRef>,
    pub elements: ElementStorage,
    pub mold_equiv: Option<ContextRef>,
}

impl SectionData {
    pub(crate) fn new() -> Self {
        Self {
            name: String::new(),
            introduced: Version::initial(),
            deprecated: None,
            documentation: VecDeque::new(),
            restrictions: VecDeque::new(),
            elements: ElementStorage::new(),
            mold_equiv: None,
        }
    }
}

/// `struct disir_keyval`: name, value (type fixed at bind-time),
/// documentation/default/restriction queues (default/restriction are
/// mold-only), deprecated version, and (config-rooted) a mold-equivalent
/// back-reference.
#[derive(Debug)]
pub struct KeyvalData {
    pub name: String,
    pub value: Value,
    pub introduced: Version,
    pub deprecated: Option<Version>,
    pub documentation: VecDeque<ContextRef>,
    pub defaults: VecDeque<ContextRef>,
    pub restrictions: VecDeque<ContextRef>,
    pub mold_equiv: Option<ContextRef>,
}

impl KeyvalData {
    pub(crate) fn new(value_type: ValueType) -> Self {
        Self {
            name: String::new(),
            value: Value::empty(value_type),
            introduced: Version::initial(),
            deprecated: None,
            documentation: VecDeque::new(),
            defaults: VecDeque::new(),
            restrictions: VecDeque::new(),
            mold_equiv: None,
        }
    }
}

/// `struct disir_default`: a version-tagged value, type pinned to the
/// owning keyval's type.
#[derive(Debug)]
pub struct DefaultData {
    pub value: Value,
    pub introduced: Version,
}

/// `struct disir_documentation`: a version-tagged string.
#[derive(Debug)]
pub struct DocumentationData {
    pub text: String,
    pub introduced: Version,
}

/// `struct disir_restriction`: kind plus the payload fields used
/// according to that kind.
#[derive(Debug)]
pub struct RestrictionData {
    pub kind: RestrictionKind,
    pub introduced: Version,
    pub deprecated: Option<Version>,
    /// Used by `EntriesMin`/`EntriesMax`/`ValueNumeric`.
    pub numeric: Option<f64>,
    /// Used by `ValueRange`.
    pub range: Option<(f64, f64)>,
    /// Used by `ValueEnum`.
    pub enum_value: Option<String>,
}

/// An out-of-tree free-standing string holder, for callers that need a
/// context handle around a string without attaching it anywhere (spec §6,
/// `free_text_create`).
#[derive(Debug)]
pub struct FreeTextData {
    pub text: String,
}

/// The tagged union of all context payloads (spec §3.1, "tagged-variant
/// context node").
#[derive(Debug)]
pub enum Payload {
    Mold(MoldData),
    Config(ConfigData),
    Section(SectionData),
    Keyval(KeyvalData),
    Documentation(DocumentationData),
    Default(DefaultData),
    Restriction(RestrictionData),
    FreeText(FreeTextData),
}

impl Payload {
    #[must_use]
    pub fn kind(&self) -> ContextKind {
        match self {
            Payload::Mold(_) => ContextKind::Mold,
            Payload::Config(_) => ContextKind::Config,
            Payload::Section(_) => ContextKind::Section,
            Payload::Keyval(_) => ContextKind::Keyval,
            Payload::Documentation(_) => ContextKind::Documentation,
            Payload::Default(_) => ContextKind::Default,
            Payload::Restriction(_) => ContextKind::Restriction,
            Payload::FreeText(_) => ContextKind::FreeText,
        }
    }
}
