//! Catalog domain types shared by every component.
//!
//! A catalog item is either a movie or an episodic series. Both variants carry
//! the same metadata shape, and callers dispatch on [`MediaKind`] explicitly.

mod types;

pub use types::*;
