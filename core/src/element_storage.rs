//! Ordered multimap from name to child contexts (spec §4.3).

use crate::collection::Collection;
use crate::context::Context;
use crate::error::{MoldError, Result, Status};
use indexmap::IndexMap;

/// A multimap from name to an ordered list of same-named children, plus a
/// global insertion-ordered list spanning every name. Duplicates under one
/// name are legal (config keyvals/sections may repeat); the mold side
/// simply never populates more than one per name.
#[derive(Debug, Default)]
pub struct ElementStorage {
    by_name: IndexMap<String, Vec<Context>>,
    order: Vec<Context>,
}

impl ElementStorage {
    #[must_use]
    pub fn new() -> Self {
        Self { by_name: IndexMap::new(), order: Vec::new() }
    }

    /// `add(name, ctx)`: appends to both the per-name list and the global
    /// list. Does not enforce uniqueness.
    pub fn add(&mut self, name: &str, ctx: Context) {
        self.by_name.entry(name.to_string()).or_default().push(ctx.clone());
        self.order.push(ctx);
    }

    /// `get(name)`: insertion-ordered contexts with that name.
    pub fn get(&self, name: &str) -> Result<Collection> {
        match self.by_name.get(name) {
            Some(v) if !v.is_empty() => Ok(Collection::from_vec(v.clone())),
            _ => Err(MoldError::new(Status::NotExist, format!("no element named '{name}'"))),
        }
    }

    /// `get_first(name)`: convenience for the mold path, where at most one
    /// child per name exists.
    pub fn get_first(&self, name: &str) -> Result<Context> {
        self.by_name
            .get(name)
            .and_then(|v| v.first().cloned())
            .ok_or_else(|| MoldError::new(Status::NotExist, format!("no element named '{name}'")))
    }

    /// `get_all()`: global insertion order.
    #[must_use]
    pub fn get_all(&self) -> Collection {
        Collection::from_vec(self.order.clone())
    }

    pub(crate) fn get_all_owned(&self) -> Vec<Context> {
        self.order.clone()
    }

    /// `remove(name, ctx)`: removes by identity from both lists. Removing
    /// the last entry for a name drops the name from the map entirely.
    pub fn remove(&mut self, name: &str, ctx: &Context) -> Result<()> {
        let had = self.by_name.get_mut(name).map(|v| {
            let before = v.len();
            v.retain(|c| c != ctx);
            before != v.len()
        });
        if had != Some(true) {
            return Err(MoldError::new(Status::NotExist, format!("'{name}' does not contain that context")));
        }
        if self.by_name.get(name).is_some_and(|v| v.is_empty()) {
            self.by_name.shift_remove(name);
        }
        self.order.retain(|c| c != ctx);
        Ok(())
    }

    /// Removes `ctx` wherever it lives, regardless of name; used during
    /// teardown where the name is already known to the caller only
    /// indirectly (through the context's own payload).
    pub(crate) fn remove_identity(&mut self, ctx: &Context) {
        for v in self.by_name.values_mut() {
            v.retain(|c| c != ctx);
        }
        self.by_name.retain(|_, v| !v.is_empty());
        self.order.retain(|c| c != ctx);
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.by_name.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{self, payload::ContextKind};

    #[test]
    fn remove_last_entry_drops_the_name() {
        let mold = context::mold_begin();
        let s = context::begin(&mold, ContextKind::Section).unwrap();
        let mut storage = ElementStorage::new();
        storage.add("server", s.clone());
        assert_eq!(storage.count("server"), 1);
        storage.remove("server", &s).unwrap();
        assert_eq!(storage.count("server"), 0);
        assert!(storage.get("server").is_err());
        assert!(!storage.names().contains(&"server"));
    }

    #[test]
    fn duplicate_names_preserve_insertion_order() {
        let mold = context::mold_begin();
        let a = context::begin(&mold, ContextKind::Keyval).unwrap();
        let b = context::begin(&mold, ContextKind::Keyval).unwrap();
        let mut storage = ElementStorage::new();
        storage.add("slot", a.clone());
        storage.add("slot", b.clone());
        let mut all = storage.get_all();
        assert_eq!(all.next().unwrap(), a);
        assert_eq!(all.next().unwrap(), b);
    }
}
