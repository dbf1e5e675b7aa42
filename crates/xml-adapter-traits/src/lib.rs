//! Core abstractions shared by every XML tree backend.
//!
//! This crate defines the adapter contract that tree engines implement,
//! the node kinds they expose, and the namespace resolution rules that all
//! of them must follow.

pub mod error;
pub mod names;
pub mod tree;

pub use error::{Error, Result};
pub use names::{
    AutoPrefixes, NamespaceBinding, RawName, Resolution, ResolvedName, XML_URI, XMLNS_URI,
};
pub use tree::{check_comment, check_instruction, Feature, NodeKind, XmlAdapter};
