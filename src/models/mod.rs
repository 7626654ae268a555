//! Domain models for skynotes.
//!
//! # Core Concepts
//!
//! - [`Note`]: a visitor note in normalized form. The only persisted entity.
//! - [`NoteDraft`]: untrusted input that normalizes into a [`Note`] or is rejected.
//!
//! The same normalization rules apply to request bodies, stored rows and
//! locally cached entries, so partial data from any source converges to the
//! same shape or is discarded.

mod note;

pub use note::*;
