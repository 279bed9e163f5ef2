//! `mold-service`: the flat operation surface of §6 over `mold-core`,
//! plus the external collaborator contracts (`Plugin`, `ArchiveBackend`)
//! that a CLI, plugin, or I/O backend is built against. This crate
//! performs no I/O itself; it is the documented seam those components
//! implement against.

pub mod archive;
pub mod ops;
pub mod plugin;

pub use archive::ArchiveBackend;
pub use plugin::Plugin;
