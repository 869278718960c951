//! Postgres persistence for the submission gallery.

pub mod submission;

pub use submission::{StoreError, SubmissionRepository, SubmissionStore};
