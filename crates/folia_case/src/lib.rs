//! Case - the type case for Folia.
//!
//! This crate provides the foundational utilities shared by every Folia
//! crate, much like a compositor's type case holds the sorts every job is
//! set from.
//!
//! # Modules
//!
//! - **HTML tag configuration**: void/block/restrictive tag tables used by
//!   both renderers
//! - **Hashing**: xxHash3 content hashing and stable ordering keys

pub mod hash;
pub mod html_tag_config;

// Re-export compact_str::CompactString as the workspace string type
pub use compact_str::format_compact;
pub use compact_str::CompactString;
pub use compact_str::CompactString as Str;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

pub use hash::*;
pub use html_tag_config::*;
