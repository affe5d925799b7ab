//! `stocklog-catalog` — item identity and descriptive metadata.
//!
//! No component outside this crate mutates item identity fields; the
//! mutation engine and query service consume it read-only (plus the
//! activation flag flips routed through it).

pub mod item;

pub use item::{Item, ItemCatalog, ItemUpdate};
