//! Generic utility primitives with zero server knowledge.
//!
//! - `url` - URL joining, component encoding, and query-string assembly
//! - `value` - Presence checks, property lookup, and GUID comparison over JSON values

pub mod url;
pub mod value;
