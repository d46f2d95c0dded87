//! Read, create and edit Besiege mod manifests (`Mod.xml`).

pub mod besiege_mod;
pub mod document;
pub mod error;
pub mod manifest;
pub mod store;

pub use besiege_mod::{Mod, ObjectManifest, Resource};
pub use error::{ModError, ModState, Result};
pub use manifest::{Manifest, ManifestTemplate, ManifestValue};
pub use store::{DiskStore, FileStore, MemoryStore};
