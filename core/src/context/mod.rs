//! The tagged-variant context node and its lifecycle (spec §3, §4.5).

pub mod metadata;
pub mod payload;
pub mod shortcuts;

use crate::error::{bail, MoldError, Result, Status};
use crate::version::Version;
use payload::{
    ContextKind, DefaultData, DocumentationData, FreeTextData, KeyvalData, MoldData, Payload,
    RestrictionData, RestrictionKind, SectionData,
};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

/// `state` of §3.1: a context has never been finalized, or has been.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Constructing,
    Finalized,
}

/// The orthogonal flag bits of §3.1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flags {
    pub invalid: bool,
    pub destroyed: bool,
    pub in_parent: bool,
    pub fatal: bool,
}

#[derive(Debug)]
pub struct Inner {
    pub payload: Payload,
    pub state: NodeState,
    pub flags: Flags,
    pub parent: Option<Weak<RefCell<Inner>>>,
    pub root: Weak<RefCell<Inner>>,
    pub error_message: Option<String>,
}

/// A handle to a context node. Cloning bumps the underlying reference
/// count (spec §3.2 invariant 3: refcount >= 1 while any caller holds a
/// reference or while the context is `InParent`); Rust's `Rc` enforces
/// this for us instead of a manually maintained counter.
#[derive(Clone)]
pub struct Context(pub(crate) Rc<RefCell<Inner>>);

/// Alias used by payload fields that hold child/back-reference handles.
pub type ContextRef = Context;

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        write!(
            f,
            "Context({}, {:?}, {:?})",
            inner.payload.kind(),
            inner.state,
            inner.flags
        )
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Context {}

impl Context {
    fn new_child(
        parent: &Context,
        root: Weak<RefCell<Inner>>,
        payload: Payload,
    ) -> Self {
        Context(Rc::new(RefCell::new(Inner {
            payload,
            state: NodeState::Constructing,
            flags: Flags::default(),
            parent: Some(Rc::downgrade(&parent.0)),
            root,
            error_message: None,
        })))
    }

    pub(crate) fn borrow(&self) -> Ref<'_, Inner> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, Inner> {
        self.0.borrow_mut()
    }

    #[must_use]
    pub fn kind(&self) -> ContextKind {
        self.borrow().payload.kind()
    }

    #[must_use]
    pub fn state(&self) -> NodeState {
        self.borrow().state
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.borrow().flags.destroyed
    }

    #[must_use]
    pub fn is_in_parent(&self) -> bool {
        self.borrow().flags.in_parent
    }

    /// Snapshot of the logical reference count: the number of live
    /// handles (tree-owned plus caller-held) pointing at this node.
    #[must_use]
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(MoldError::new(
                Status::DestroyedContext,
                format!("{} context has been destroyed", self.kind()),
            ));
        }
        Ok(())
    }

    /// `parent(ctx)`: `None` for roots, the enclosing context otherwise.
    pub fn parent(&self) -> Result<Option<Context>> {
        self.ensure_live()?;
        match &self.borrow().parent {
            None => Ok(None),
            Some(weak) => match weak.upgrade() {
                Some(rc) => Ok(Some(Context(rc))),
                None => Err(MoldError::new(
                    Status::DestroyedContext,
                    "parent context has been destroyed",
                )),
            },
        }
    }

    /// `root(ctx)`: the enclosing Mold/Config (a root returns itself).
    pub fn root(&self) -> Result<Context> {
        self.ensure_live()?;
        self.borrow()
            .root
            .upgrade()
            .map(Context)
            .ok_or_else(|| MoldError::new(Status::DestroyedContext, "root context has been destroyed"))
    }

    #[must_use]
    pub fn root_is_config(&self) -> bool {
        self.root()
            .map(|r| r.kind() == ContextKind::Config)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn root_is_mold(&self) -> bool {
        self.root()
            .map(|r| r.kind() == ContextKind::Mold)
            .unwrap_or(false)
    }

    /// `valid(ctx)`: false once an invalid construction step has marked
    /// the node, independent of whether it has been finalized yet.
    pub fn valid(&self) -> Result<bool> {
        self.ensure_live()?;
        Ok(!self.borrow().flags.invalid)
    }

    /// `error(ctx)`: the most recently recorded diagnostic message, if
    /// any. Available even on a destroyed context so callers can see why.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.borrow().error_message.clone()
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        self.borrow_mut().error_message = Some(message.into());
    }

    pub(crate) fn mark_invalid(&self, message: impl Into<String>) {
        let mut inner = self.borrow_mut();
        inner.flags.invalid = true;
        inner.error_message = Some(message.into());
    }

    /// `fatal_error(ctx, msg)`: records a fatal error that persists across
    /// subsequent operations and forces `FatalContext` on validation.
    pub fn fatal_error(&self, message: impl Into<String>) -> Result<()> {
        self.ensure_live()?;
        let mut inner = self.borrow_mut();
        inner.flags.fatal = true;
        inner.flags.invalid = true;
        inner.error_message = Some(message.into());
        Ok(())
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.borrow().flags.fatal
    }

    /// All direct children across every queue/ElementStorage the payload
    /// carries, in no particular cross-queue order. Shared by teardown
    /// and validation, which both need to walk "everything under here".
    pub(crate) fn direct_children(&self) -> Vec<Context> {
        let inner = self.borrow();
        match &inner.payload {
            Payload::Mold(m) => {
                let mut v: Vec<Context> = m.documentation.iter().cloned().collect();
                v.extend(m.elements.get_all_owned());
                v
            }
            Payload::Config(c) => c.elements.get_all_owned(),
            Payload::Section(s) => {
                let mut v: Vec<Context> = s.documentation.iter().cloned().collect();
                v.extend(s.restrictions.iter().cloned());
                v.extend(s.elements.get_all_owned());
                v
            }
            Payload::Keyval(k) => {
                let mut v: Vec<Context> = k.documentation.iter().cloned().collect();
                v.extend(k.defaults.iter().cloned());
                v.extend(k.restrictions.iter().cloned());
                v
            }
            Payload::Documentation(_)
            | Payload::Default(_)
            | Payload::Restriction(_)
            | Payload::FreeText(_) => Vec::new(),
        }
    }
}

/// Legality table for `begin` (spec §4.5: "validates that the requested
/// child kind is legal under the parent kind").
fn child_kind_allowed(parent_kind: ContextKind, child_kind: ContextKind, root_is_config: bool) -> bool {
    use ContextKind::*;
    match (parent_kind, child_kind) {
        (Mold, Section | Keyval | Documentation) => true,
        (Config, Section | Keyval) => true,
        (Section, Section | Keyval | Documentation) => true,
        (Section, Restriction) => !root_is_config,
        (Keyval, Documentation) => true,
        (Keyval, Default | Restriction) => !root_is_config,
        _ => false,
    }
}

/// `begin(parent, kind)`: create a `Constructing` child under `parent`.
pub fn begin(parent: &Context, kind: ContextKind) -> Result<Context> {
    parent.ensure_live()?;
    if parent.state() != NodeState::Constructing {
        bail!(
            Status::ContextInWrongState,
            "cannot begin a new {kind} child: parent {} is already finalized",
            parent.kind()
        );
    }
    let root_is_config = parent.root_is_config();
    if !child_kind_allowed(parent.kind(), kind, root_is_config) {
        bail!(
            Status::WrongContext,
            "a {kind} context cannot be begun under a {} parent",
            parent.kind()
        );
    }

    let root_weak = parent.borrow().root.clone();
    let payload = match kind {
        ContextKind::Section => Payload::Section(SectionData::new()),
        ContextKind::Keyval => {
            // Value type is bound later (by set_name's mold-equivalent
            // resolution on the config side, or by the dedicated
            // add_keyval_* shortcuts on the mold side); start as a
            // placeholder string until pinned.
            Payload::Keyval(KeyvalData::new(crate::value::ValueType::String))
        }
        ContextKind::Documentation => Payload::Documentation(DocumentationData {
            text: String::new(),
            introduced: Version::initial(),
        }),
        ContextKind::Default => Payload::Default(DefaultData {
            value: crate::value::Value::String(None),
            introduced: Version::initial(),
        }),
        ContextKind::Restriction => Payload::Restriction(RestrictionData {
            kind: RestrictionKind::EntriesMin,
            introduced: Version::initial(),
            deprecated: None,
            numeric: None,
            range: None,
            enum_value: None,
        }),
        ContextKind::FreeText => Payload::FreeText(FreeTextData { text: String::new() }),
        ContextKind::Mold | ContextKind::Config => {
            bail!(Status::WrongContext, "{kind} can only be created with its dedicated root begin operation")
        }
    };

    let child = Context::new_child(parent, root_weak, payload);
    // parent refcount increases implicitly: the child holds a Weak to
    // the parent, so parent aliveness is instead guaranteed by whoever
    // holds the child; nothing further to bump here.
    tracing::debug!(parent_kind = %parent.kind(), child_kind = %kind, "begin");
    Ok(child)
}

/// `mold_begin()`: create a new `Constructing` mold root.
#[must_use]
pub fn mold_begin() -> Context {
    Context::root_from_rc(|weak| {
        RefCell::new(Inner {
            payload: Payload::Mold(MoldData::new()),
            state: NodeState::Constructing,
            flags: Flags::default(),
            parent: None,
            root: weak,
            error_message: None,
        })
    })
}

/// `config_begin(mold)`: create a new `Constructing` config root bound to
/// `mold` at the mold's current version.
pub fn config_begin(mold: &Context) -> Result<Context> {
    mold.ensure_live()?;
    if mold.kind() != ContextKind::Mold {
        bail!(Status::WrongContext, "config_begin requires a mold context, got {}", mold.kind());
    }
    let version = match &mold.borrow().payload {
        Payload::Mold(m) => m.version,
        _ => unreachable!(),
    };
    Ok(Context::root_from_rc(|weak| {
        RefCell::new(Inner {
            payload: Payload::Config(payload::ConfigData {
                version,
                mold: mold.clone(),
                elements: crate::element_storage::ElementStorage::new(),
                origin_plugin: None,
            }),
            state: NodeState::Constructing,
            flags: Flags::default(),
            parent: None,
            root: weak,
            error_message: None,
        })
    }))
}

impl Context {
    /// Helper for building a self-rooted context with `Rc::new_cyclic`,
    /// used by both `mold_begin` and `config_begin`.
    fn root_from_rc(f: impl FnOnce(Weak<RefCell<Inner>>) -> RefCell<Inner>) -> Context {
        Context(Rc::new_cyclic(f))
    }
}

/// `destroy(ctx)`: tear down the subtree rooted at `ctx`.
pub fn destroy(ctx: &Context) -> Result<()> {
    if ctx.is_destroyed() {
        return Ok(());
    }
    if ctx.is_in_parent() {
        if let Some(parent) = ctx.parent()? {
            detach_from_parent(&parent, ctx)?;
        }
    }
    destroy_children(ctx)?;
    let mut inner = ctx.borrow_mut();
    inner.flags.destroyed = true;
    inner.flags.in_parent = false;
    drop(inner);
    tracing::debug!(kind = %ctx.kind(), "destroy");
    Ok(())
}

fn destroy_children(ctx: &Context) -> Result<()> {
    let children = ctx.direct_children();
    for child in &children {
        if !child.is_destroyed() {
            destroy_children(child)?;
            let mut inner = child.borrow_mut();
            inner.flags.destroyed = true;
            inner.flags.in_parent = false;
        }
    }
    Ok(())
}

fn detach_from_parent(parent: &Context, child: &Context) -> Result<()> {
    let mut inner = parent.borrow_mut();
    match &mut inner.payload {
        Payload::Mold(m) => {
            m.documentation.retain(|d| d != child);
            m.elements.remove_identity(child);
        }
        Payload::Config(c) => c.elements.remove_identity(child),
        Payload::Section(s) => {
            s.documentation.retain(|d| d != child);
            s.restrictions.retain(|d| d != child);
            s.elements.remove_identity(child);
        }
        Payload::Keyval(k) => {
            k.documentation.retain(|d| d != child);
            k.defaults.retain(|d| d != child);
            k.restrictions.retain(|d| d != child);
        }
        Payload::Documentation(_) | Payload::Default(_) | Payload::Restriction(_) | Payload::FreeText(_) => {}
    }
    Ok(())
}

/// `put(ctx)`: release the caller's reference, destroying the subtree if
/// this was the last handle outstanding.
pub fn put(ctx: Context) -> Result<()> {
    if Rc::strong_count(&ctx.0) <= 1 {
        destroy(&ctx)?;
    }
    drop(ctx);
    Ok(())
}

/// `finalize(ctx)`: validate `ctx` (and its subtree) and, on success,
/// insert it into its parent's storage/queue and mark it `InParent`. A
/// non-root context always has a parent; use `mold_finalize`/
/// `config_finalize` for roots.
///
/// On failure, the caller's reference is retained either way (spec §4.5).
/// If the parent is still `Constructing`, the specific failure status is
/// masked behind `InvalidContext` so a caller mid-build gets the generic
/// "something here is invalid" signal and can keep going; once the
/// parent is already `Finalized`, the original status is surfaced
/// verbatim (spec §7, "the original failure status is surfaced
/// verbatim").
pub fn finalize(ctx: &Context) -> Result<()> {
    ctx.ensure_live()?;
    if ctx.state() != NodeState::Constructing {
        bail!(Status::ContextInWrongState, "{} is already finalized", ctx.kind());
    }
    let parent = ctx
        .parent()?
        .ok_or_else(|| MoldError::new(Status::WrongContext, "use mold_finalize/config_finalize for a root context"))?;

    match crate::validation::validate(ctx) {
        Ok(()) => {
            insert_into_parent(&parent, ctx)?;
            let mut inner = ctx.borrow_mut();
            inner.state = NodeState::Finalized;
            inner.flags.in_parent = true;
            tracing::debug!(kind = %ctx.kind(), "finalize ok");
            Ok(())
        }
        Err(e) if parent.state() == NodeState::Constructing => {
            tracing::warn!(kind = %ctx.kind(), status = %e.status, "finalize rejected, parent still constructing");
            Err(MoldError::new(Status::InvalidContext, format!("finalize failed: {e}")))
        }
        Err(e) => {
            tracing::warn!(kind = %ctx.kind(), status = %e.status, "finalize failed against a finalized parent");
            Err(e)
        }
    }
}

/// Inserts `ctx` into `queue` ahead of the first entry whose introduced
/// version is greater, keeping the queue in the version-sorted order the
/// diff algorithm walks (spec §4.9, "stored (version-sorted) order").
fn insert_sorted_by_introduced(queue: &mut VecDeque<Context>, ctx: Context, introduced: Version) {
    let position = queue
        .iter()
        .position(|existing| existing.get_introduced().map_or(false, |v| v > introduced))
        .unwrap_or(queue.len());
    queue.insert(position, ctx);
}

fn insert_into_parent(parent: &Context, ctx: &Context) -> Result<()> {
    let introduced = ctx.get_introduced();
    let mut inner = parent.borrow_mut();
    match (&mut inner.payload, ctx.kind()) {
        (Payload::Mold(m), ContextKind::Documentation) => {
            insert_sorted_by_introduced(&mut m.documentation, ctx.clone(), introduced?);
            Ok(())
        }
        (Payload::Mold(m), ContextKind::Section | ContextKind::Keyval) => {
            let name = ctx.get_name()?;
            m.elements.add(&name, ctx.clone());
            Ok(())
        }
        (Payload::Config(c), ContextKind::Section | ContextKind::Keyval) => {
            let name = ctx.get_name()?;
            c.elements.add(&name, ctx.clone());
            Ok(())
        }
        (Payload::Section(s), ContextKind::Documentation) => {
            insert_sorted_by_introduced(&mut s.documentation, ctx.clone(), introduced?);
            Ok(())
        }
        (Payload::Section(s), ContextKind::Restriction) => {
            insert_sorted_by_introduced(&mut s.restrictions, ctx.clone(), introduced?);
            Ok(())
        }
        (Payload::Section(s), ContextKind::Section | ContextKind::Keyval) => {
            let name = ctx.get_name()?;
            s.elements.add(&name, ctx.clone());
            Ok(())
        }
        (Payload::Keyval(k), ContextKind::Documentation) => {
            insert_sorted_by_introduced(&mut k.documentation, ctx.clone(), introduced?);
            Ok(())
        }
        (Payload::Keyval(k), ContextKind::Default) => {
            insert_sorted_by_introduced(&mut k.defaults, ctx.clone(), introduced?);
            Ok(())
        }
        (Payload::Keyval(k), ContextKind::Restriction) => {
            insert_sorted_by_introduced(&mut k.restrictions, ctx.clone(), introduced?);
            Ok(())
        }
        _ => Err(MoldError::new(
            Status::WrongContext,
            format!("{} cannot be finalized under a {}", ctx.kind(), parent.kind()),
        )),
    }
}

/// `mold_finalize(mold)`: validate and seal a mold root.
pub fn mold_finalize(mold: &Context) -> Result<()> {
    if mold.kind() != ContextKind::Mold {
        bail!(Status::WrongContext, "mold_finalize requires a mold, got {}", mold.kind());
    }
    finalize_root(mold)
}

/// `config_finalize(config)`: validate and seal a config root.
pub fn config_finalize(config: &Context) -> Result<()> {
    if config.kind() != ContextKind::Config {
        bail!(Status::WrongContext, "config_finalize requires a config, got {}", config.kind());
    }
    finalize_root(config)
}

fn finalize_root(ctx: &Context) -> Result<()> {
    ctx.ensure_live()?;
    if ctx.state() != NodeState::Constructing {
        bail!(Status::ContextInWrongState, "{} is already finalized", ctx.kind());
    }
    crate::validation::validate(ctx)?;
    ctx.borrow_mut().state = NodeState::Finalized;
    Ok(())
}
