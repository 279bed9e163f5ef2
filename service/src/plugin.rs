//! The plugin contract (spec §6, "External collaborator contracts").
//! A plugin owns the I/O side of reading and writing Mold/Config
//! documents; the core never touches a filesystem, network socket, or
//! database directly. Nothing in this workspace implements this trait —
//! it exists purely as the seam a concrete plugin crate builds against.

use async_trait::async_trait;
use mold_core::context::Context;
use mold_core::error::Result;

/// Reads and writes Mold/Config documents and enumerates/queries their
/// entries, on behalf of some concrete storage (a file, a database row,
/// a remote config service).
///
/// `Context` is `Rc`-based and deliberately `!Send` (spec §5, "strictly
/// single-threaded per tree"), so this trait opts out of async-trait's
/// default `Send`-future bound rather than fighting the tree's own
/// concurrency model.
#[async_trait(?Send)]
pub trait Plugin {
    /// Reads a Config document identified by `group`/`entry_id`, bound
    /// against `mold`.
    async fn config_read(&self, group: &str, entry_id: &str, mold: &Context) -> Result<Context>;

    /// Persists `config` under `group`/`entry_id`.
    async fn config_write(&self, group: &str, entry_id: &str, config: &Context) -> Result<()>;

    /// Lists the entry identifiers available under `group`.
    async fn config_entries(&self, group: &str) -> Result<Vec<String>>;

    /// Resolves a dotted query path against the Config identified by
    /// `group`/`entry_id`, without requiring the caller to read the
    /// whole document first.
    async fn config_query(&self, group: &str, entry_id: &str, path: &str) -> Result<Context>;

    /// Reads a Mold document identified by `group`/`entry_id`.
    async fn mold_read(&self, group: &str, entry_id: &str) -> Result<Context>;

    /// Persists `mold` under `group`/`entry_id`.
    async fn mold_write(&self, group: &str, entry_id: &str, mold: &Context) -> Result<()>;

    /// Lists the entry identifiers available under `group`.
    async fn mold_entries(&self, group: &str) -> Result<Vec<String>>;

    /// Resolves a dotted query path against the Mold identified by
    /// `group`/`entry_id`.
    async fn mold_query(&self, group: &str, entry_id: &str, path: &str) -> Result<Context>;
}
