//! DOM backend for the xmlhand adapter abstraction
//!
//! Wraps a W3C DOM style tree, where every text run and attribute is a node
//! of its own, to implement the xml-adapter-traits interfaces.

pub mod dom;
pub mod tree;

// Re-export main types
pub use dom::{DomDocument, DomError, DomNode};
pub use tree::DomAdapter;

// Handles are arena ids
pub use indextree::NodeId;
