//! Whisper model catalog and on-disk lookup.

pub mod catalog;
pub mod store;
