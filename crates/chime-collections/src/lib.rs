#![forbid(unsafe_code)]

//! Collections for chime.
//!
//! - [`MultiGroupMap`]: key → non-empty ordered group of values, where adding
//!   a value for an unseen key creates its group implicitly.

pub mod multi_group;

pub use multi_group::MultiGroupMap;
