//! Ordered, resettable snapshot iterator over contexts (spec §4.4).

use crate::context::Context;
use crate::error::{MoldError, Result, Status};

/// A `Collection` is a snapshot: it clones the reference count of every
/// context it holds at construction time (spec §4.3, "every collection
/// returned is an independent snapshot that increments each contained
/// context's refcount"), so later destruction elsewhere is invisible to
/// an in-flight iteration except through the coalesce-on-`next` skip of
/// already-destroyed entries.
#[derive(Debug, Default, Clone)]
pub struct Collection {
    items: Vec<Context>,
    cursor: usize,
}

impl Collection {
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new(), cursor: 0 }
    }

    #[must_use]
    pub fn from_vec(items: Vec<Context>) -> Self {
        Self { items, cursor: 0 }
    }

    /// Internal: append one more context to the snapshot.
    pub(crate) fn push(&mut self, ctx: Context) {
        self.items.push(ctx);
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Yield the next live context, skipping any that were destroyed
    /// since the snapshot was taken. Returns `Status::Exhausted` once no
    /// live entries remain.
    pub fn next(&mut self) -> Result<Context> {
        while self.cursor < self.items.len() {
            let candidate = self.items[self.cursor].clone();
            self.cursor += 1;
            if !candidate.is_destroyed() {
                return Ok(candidate);
            }
        }
        Err(MoldError::new(Status::Exhausted, "collection is exhausted"))
    }

    /// Release the snapshot's held references. After this call the
    /// collection is empty; it is also implicit on `Drop`.
    pub fn finished(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Context] {
        &self.items
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Context> {
        self.items
    }
}

impl IntoIterator for Collection {
    type Item = Context;
    type IntoIter = std::vec::IntoIter<Context>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{self, payload::ContextKind};

    #[test]
    fn next_skips_destroyed_entries() {
        let mold = context::mold_begin();
        let s1 = context::begin(&mold, ContextKind::Section).unwrap();
        let s2 = context::begin(&mold, ContextKind::Section).unwrap();
        let mut c = Collection::from_vec(vec![s1.clone(), s2.clone()]);
        context::destroy(&s1).unwrap();
        assert_eq!(c.next().unwrap(), s2);
        assert!(c.next().is_err());
    }
}
