//! ElementTree backend for the xmlhand adapter abstraction
//!
//! Wraps a tree in the lxml/libxml2 mould, where text is stored on elements
//! and namespace maps are fixed at creation, to implement the
//! xml-adapter-traits interfaces.

pub mod etree;
pub mod tree;

// Re-export main types
pub use etree::{ElementTree, EtreeError, Item, QName};
pub use tree::{EtreeAdapter, EtreeHandle, TextSlot};
