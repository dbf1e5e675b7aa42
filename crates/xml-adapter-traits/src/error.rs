//! Error types for adapter and node operations

/// Result type for adapter and node operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type shared by every backend adapter
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A namespace prefix was used that no ancestor declares
    #[error("Undefined namespace prefix: {0}")]
    UndefinedNamespacePrefix(String),

    /// The active backend does not implement the requested capability
    #[error("Feature not supported by the {backend} backend: {feature}")]
    UnsupportedFeature {
        backend: &'static str,
        feature: String,
    },

    /// A dynamic argument did not have one of the accepted shapes
    #[error("Argument {value} is not one of the expected types: {}", .expected.join(", "))]
    InvalidArgumentType {
        value: String,
        expected: Vec<&'static str>,
    },

    /// A query or removal targeted a node that is not in the tree
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// An operation was applied to a node of the wrong kind
    #[error("Node access error: {0}")]
    NodeAccess(String),

    /// A handle created by one backend was passed to another
    #[error("Handle belongs to a different backend: {0}")]
    WrongBackend(String),

    /// XML parsing failed
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new undefined prefix error
    pub fn undefined_prefix<S: Into<String>>(prefix: S) -> Self {
        Error::UndefinedNamespacePrefix(prefix.into())
    }

    /// Create a new unsupported feature error
    pub fn unsupported<S: Into<String>>(backend: &'static str, feature: S) -> Self {
        Error::UnsupportedFeature {
            backend,
            feature: feature.into(),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(value: S, expected: &[&'static str]) -> Self {
        Error::InvalidArgumentType {
            value: value.into(),
            expected: expected.to_vec(),
        }
    }

    /// Create a new node-not-found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NodeNotFound(msg.into())
    }

    /// Create a new node access error
    pub fn node_access<S: Into<String>>(msg: S) -> Self {
        Error::NodeAccess(msg.into())
    }

    /// Create a new parse error
    pub fn xml_parse<S: Into<String>>(msg: S) -> Self {
        Error::XmlParse(msg.into())
    }

    /// True for errors a caller may catch and degrade around
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedFeature { .. })
    }
}
