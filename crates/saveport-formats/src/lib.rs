//! Wire formats and content addressing for the saveport sync client
//!
//! This crate provides the data representations every other saveport crate
//! builds on:
//!
//! - **Bundle**: the `3DSS` transfer container carrying one title's save
//!   files with per-file integrity hashes and a zlib-compressed payload
//! - **ContentHash**: SHA-256 content addressing over save data and ordered
//!   file lists
//! - **TitleId**: the 64-bit title identifier and its wire encodings,
//!   including the synthesized ids for external-handheld titles
//! - **SaveFile**: one (path, bytes) entry of an ordered save file list
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: bundles can be built and parsed
//! - **Type Safety**: identifiers and hashes are newtypes, not bare strings
//! - **Round-Trip Guarantee**: `decode(encode(files))` yields an equal list

#![warn(missing_docs)]

pub mod bundle;
pub mod file_list;
pub mod hash;
pub mod title;

pub use file_list::SaveFile;
pub use hash::{ContentHash, ContentHasher, ZERO_HASH_HEX};
pub use title::TitleId;
