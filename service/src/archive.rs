//! The archive backend contract (spec §6). An archive streams versioned
//! entries to and from some transport (a tarball, an object store, a
//! network feed); the core is oblivious to the transport. Nothing in
//! this workspace implements this trait — it documents the seam an
//! archive transport crate builds against.

use async_trait::async_trait;
use mold_core::error::Result;
use mold_core::version::Version;

/// One serialized entry in an archive: its group, entry id, the version
/// it was produced at, and the opaque payload bytes.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub group: String,
    pub entry_id: String,
    pub version: Version,
    pub blob: Vec<u8>,
}

/// Streams `ArchiveEntry` values in and out of some transport. A backend
/// decides its own framing, compression, and durability; it hands the
/// core (via a `Plugin`) fully materialized blobs.
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// The next entry in the stream, or `None` once exhausted.
    async fn next_entry(&mut self) -> Result<Option<ArchiveEntry>>;

    /// Appends `entry` to the archive.
    async fn put_entry(&mut self, entry: ArchiveEntry) -> Result<()>;
}
