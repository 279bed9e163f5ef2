//! Name, introduced/deprecated, and root-version metadata operations
//! (spec §6 "Metadata").

use super::payload::{ContextKind, Payload};
use super::Context;
use crate::error::{bail, MoldError, Result, Status};
use crate::version::Version;

impl Context {
    /// `set_name(ctx, name)`. Only legal on a `Constructing` Keyval or
    /// Section. When the root is a Config, resolves the mold-equivalent
    /// sibling by name: failure marks the node `Invalid` but is reported
    /// non-fatally (spec §4.5) so construction can continue; success pins
    /// the keyval's value type from the mold-equivalent.
    pub fn set_name(&self, name: &str) -> Result<()> {
        self.ensure_name_capable()?;
        {
            let mut inner = self.borrow_mut();
            match &mut inner.payload {
                Payload::Section(s) => s.name = name.to_string(),
                Payload::Keyval(k) => k.name = name.to_string(),
                _ => unreachable!("ensure_name_capable guarantees Section or Keyval"),
            }
        }

        if self.root_is_config() {
            match self.resolve_mold_equivalent(name) {
                Ok(equiv) => self.pin_to_mold_equivalent(&equiv),
                Err(e) => self.mark_invalid(format!("mold-equivalent lookup for '{name}' failed: {e}")),
            }
        }
        Ok(())
    }

    fn ensure_name_capable(&self) -> Result<()> {
        self.ensure_live()?;
        if !matches!(self.kind(), ContextKind::Section | ContextKind::Keyval) {
            bail!(Status::WrongContext, "set_name is only valid on a section or keyval, got {}", self.kind());
        }
        if self.state() != super::NodeState::Constructing {
            bail!(Status::ContextInWrongState, "cannot rename a finalized {}", self.kind());
        }
        Ok(())
    }

    fn resolve_mold_equivalent(&self, name: &str) -> Result<Context> {
        let parent = self
            .parent()?
            .ok_or_else(|| MoldError::new(Status::MoldMissing, "context has no parent to resolve against"))?;
        let equiv = match &parent.borrow().payload {
            Payload::Config(c) => c.mold.elements_get_first(name)?,
            Payload::Section(s) => {
                let scope = s
                    .mold_equiv
                    .clone()
                    .ok_or_else(|| MoldError::new(Status::MoldMissing, "parent section has no mold-equivalent"))?;
                scope.elements_get_first(name)?
            }
            _ => bail!(Status::MoldMissing, "parent kind cannot carry a mold-equivalent"),
        };
        if equiv.kind() != self.kind() {
            bail!(Status::MoldMissing, "mold-equivalent for '{name}' is a {}, not a {}", equiv.kind(), self.kind());
        }
        Ok(equiv)
    }

    fn pin_to_mold_equivalent(&self, equiv: &Context) {
        let mut inner = self.borrow_mut();
        match &mut inner.payload {
            Payload::Section(s) => s.mold_equiv = Some(equiv.clone()),
            Payload::Keyval(k) => {
                k.mold_equiv = Some(equiv.clone());
                if let Payload::Keyval(ek) = &equiv.borrow().payload {
                    k.value = crate::value::Value::empty(ek.value.value_type());
                }
            }
            _ => {}
        }
    }

    /// `get_name(ctx)`.
    pub fn get_name(&self) -> Result<String> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Section(s) => Ok(s.name.clone()),
            Payload::Keyval(k) => Ok(k.name.clone()),
            other => bail!(Status::WrongContext, "{} has no name", other.kind()),
        }
    }

    /// The context's mold-equivalent, if any (config-rooted section/keyval
    /// that successfully resolved one at `set_name` time).
    #[must_use]
    pub fn mold_equivalent(&self) -> Option<Context> {
        match &self.borrow().payload {
            Payload::Section(s) => s.mold_equiv.clone(),
            Payload::Keyval(k) => k.mold_equiv.clone(),
            _ => None,
        }
    }

    /// `resolve_root_name(ctx)`: the dotted path from the root to this
    /// context, with an `@index` suffix on any path segment whose context
    /// is not the first same-named sibling under its parent (index 0 is
    /// omitted). Spec §8 scenario 6: a keyval nested at `a.b[1].c` resolves
    /// to `"a.b@1.c"`.
    pub fn resolve_root_name(&self) -> Result<String> {
        self.ensure_live()?;
        let mut segments = Vec::new();
        let mut current = self.clone();
        loop {
            let parent = match current.parent()? {
                Some(p) => p,
                None => break,
            };
            let name = current.get_name().unwrap_or_else(|_| current.kind().to_string());
            let index = parent.sibling_index(&current).unwrap_or(0);
            segments.push(if index == 0 { name } else { format!("{name}@{index}") });
            current = parent;
        }
        segments.reverse();
        Ok(segments.join("."))
    }

    /// Zero-based position of `child` among same-named siblings under
    /// `self`'s element storage.
    fn sibling_index(&self, child: &Context) -> Option<usize> {
        let name = child.get_name().ok()?;
        let inner = self.borrow();
        let storage = match &inner.payload {
            Payload::Mold(m) => &m.elements,
            Payload::Config(c) => &c.elements,
            Payload::Section(s) => &s.elements,
            _ => return None,
        };
        let siblings = storage.get(&name).ok()?.into_vec();
        siblings.iter().position(|c| c == child)
    }

    /// `add_introduced(ctx, version)`. A mold's own version auto-advances
    /// to the greatest version observed among its descendants (spec §3.1),
    /// so this bumps the owning mold root when `version` exceeds it.
    pub fn add_introduced(&self, version: Version) -> Result<()> {
        self.ensure_live()?;
        {
            let mut inner = self.borrow_mut();
            match &mut inner.payload {
                Payload::Section(s) => s.introduced = version,
                Payload::Keyval(k) => k.introduced = version,
                Payload::Default(d) => d.introduced = version,
                Payload::Documentation(d) => d.introduced = version,
                Payload::Restriction(r) => r.introduced = version,
                other => bail!(Status::WrongContext, "{} has no introduced version", other.kind()),
            }
        }
        self.bump_mold_version(version);
        Ok(())
    }

    /// Raises the context's mold root version to `version` if it falls
    /// behind, and is a no-op when the context is config-rooted or the
    /// version does not advance anything.
    fn bump_mold_version(&self, version: Version) {
        if self.root_is_mold() {
            if let Ok(root) = self.root() {
                let mut inner = root.borrow_mut();
                if let Payload::Mold(m) = &mut inner.payload {
                    if version > m.version {
                        m.version = version;
                    }
                }
            }
        }
    }

    /// `get_introduced(ctx)`.
    pub fn get_introduced(&self) -> Result<Version> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Section(s) => Ok(s.introduced),
            Payload::Keyval(k) => Ok(k.introduced),
            Payload::Default(d) => Ok(d.introduced),
            Payload::Documentation(d) => Ok(d.introduced),
            Payload::Restriction(r) => Ok(r.introduced),
            other => bail!(Status::WrongContext, "{} has no introduced version", other.kind()),
        }
    }

    /// `add_deprecated(ctx, version)`. Supersedes the source library's
    /// typoed, unimplemented `dc_add_deprecrated` (spec §9 Open Questions)
    /// with a single well-named operation.
    pub fn add_deprecated(&self, version: Version) -> Result<()> {
        self.ensure_live()?;
        {
            let mut inner = self.borrow_mut();
            match &mut inner.payload {
                Payload::Section(s) => s.deprecated = Some(version),
                Payload::Keyval(k) => k.deprecated = Some(version),
                Payload::Restriction(r) => r.deprecated = Some(version),
                other => bail!(Status::WrongContext, "{} cannot be deprecated", other.kind()),
            }
        }
        self.bump_mold_version(version);
        Ok(())
    }

    /// `get_deprecated(ctx)`.
    pub fn get_deprecated(&self) -> Result<Option<Version>> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Section(s) => Ok(s.deprecated),
            Payload::Keyval(k) => Ok(k.deprecated),
            Payload::Restriction(r) => Ok(r.deprecated),
            other => bail!(Status::WrongContext, "{} cannot be deprecated", other.kind()),
        }
    }

    /// `set_version(ctx, version)` (roots only). Setting a config's
    /// version above its mold's returns `ConflictingVersion` (spec §8
    /// boundary behavior).
    pub fn set_version(&self, version: Version) -> Result<()> {
        self.ensure_live()?;
        let mut inner = self.borrow_mut();
        match &mut inner.payload {
            Payload::Mold(m) => {
                m.version = version;
                Ok(())
            }
            Payload::Config(c) => {
                let mold_version = match &c.mold.borrow().payload {
                    Payload::Mold(m) => m.version,
                    _ => unreachable!(),
                };
                if version > mold_version {
                    bail!(
                        Status::ConflictingVersion,
                        "config version {version} exceeds mold version {mold_version}"
                    );
                }
                c.version = version;
                Ok(())
            }
            other => bail!(Status::WrongContext, "set_version is only valid on a root, got {}", other.kind()),
        }
    }

    /// `get_version(ctx)` (roots only).
    pub fn get_version(&self) -> Result<Version> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Mold(m) => Ok(m.version),
            Payload::Config(c) => Ok(c.version),
            other => bail!(Status::WrongContext, "get_version is only valid on a root, got {}", other.kind()),
        }
    }
}

impl Context {
    /// Internal helper used by mold-equivalent resolution: look up a
    /// direct child by name in this context's own element storage
    /// (legal on Mold/Config/Section).
    pub(crate) fn elements_get_first(&self, name: &str) -> Result<Context> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Mold(m) => m.elements.get_first(name),
            Payload::Config(c) => c.elements.get_first(name),
            Payload::Section(s) => s.elements.get_first(name),
            other => bail!(Status::WrongContext, "{} has no elements", other.kind()),
        }
    }

    /// `get_elements`/`find_elements` building block: every direct child
    /// named `name`, insertion ordered (legal on Mold/Config/Section).
    pub(crate) fn elements_get(&self, name: &str) -> Result<crate::collection::Collection> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Mold(m) => m.elements.get(name),
            Payload::Config(c) => c.elements.get(name),
            Payload::Section(s) => s.elements.get(name),
            other => bail!(Status::WrongContext, "{} has no elements", other.kind()),
        }
    }

    /// `get_elements(ctx)`: every direct child, insertion ordered (legal
    /// on Mold/Config/Section).
    pub fn elements(&self) -> Result<crate::collection::Collection> {
        self.ensure_live()?;
        match &self.borrow().payload {
            Payload::Mold(m) => Ok(m.elements.get_all()),
            Payload::Config(c) => Ok(c.elements.get_all()),
            Payload::Section(s) => Ok(s.elements.get_all()),
            other => bail!(Status::WrongContext, "{} has no elements", other.kind()),
        }
    }

    /// `find_elements(ctx, name)`: every direct child named `name`.
    pub fn find_elements(&self, name: &str) -> Result<crate::collection::Collection> {
        self.elements_get(name)
    }

    /// `find_element(ctx, name, index)`: the child named `name` at
    /// zero-based `index` among its same-named siblings.
    pub fn find_element(&self, name: &str, index: usize) -> Result<Context> {
        self.elements_get(name)?
            .into_vec()
            .into_iter()
            .nth(index)
            .ok_or_else(|| MoldError::new(Status::NotExist, format!("no element '{name}' at index {index}")))
    }
}
