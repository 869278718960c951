//! Durable storage for accepted submission images.
//!
//! The `Storage` trait abstracts the content store so the request pipeline can
//! be tested against an in-memory stub; `LocalStorage` is the filesystem
//! backend used in production.

pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
