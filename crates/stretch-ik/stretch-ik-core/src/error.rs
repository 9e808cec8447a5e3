//! Error types for schema construction, node access, registration and configuration.

use crate::schema::ParamKind;

/// Raised while building a [`Schema`](crate::schema::Schema). Never raised by a compute.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SchemaError {
    /// `min` is greater than `max`.
    #[error("parameter '{name}' has inverted domain [{min}, {max}]")]
    InvertedDomain { name: String, min: f64, max: f64 },

    /// The same parameter id was declared twice.
    #[error("parameter '{name}' is declared more than once")]
    DuplicateId { name: String },

    /// A long or short name is already taken by another parameter.
    #[error("parameter name '{name}' is already declared")]
    DuplicateName { name: String },

    /// Declared kind disagrees with the parameter id or its default value.
    #[error("parameter '{name}' declares a kind that does not match its id or default")]
    KindMismatch { name: String },

    /// An output id declared as an input, or the reverse.
    #[error("parameter '{name}' is declared with the wrong direction")]
    DirectionMismatch { name: String },

    /// Affects edge names a parameter the schema does not declare.
    #[error("affects edge references undeclared parameter '{name}'")]
    UndeclaredParameter { name: String },

    /// Affects edge does not run input → output.
    #[error("affects edge {input} -> {output} must run from an input to an output")]
    InvalidEdge { input: String, output: String },

    /// JSON export failed.
    #[error("schema export failed: {reason}")]
    Export { reason: String },
}

impl SchemaError {
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvertedDomain { .. } | Self::KindMismatch { .. } => "domain",
            Self::DuplicateId { .. }
            | Self::DuplicateName { .. }
            | Self::DirectionMismatch { .. }
            | Self::UndeclaredParameter { .. } => "declaration",
            Self::InvalidEdge { .. } => "affects",
            Self::Export { .. } => "serialization",
        }
    }
}

/// Errors surfaced to the host through the node accessors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum NodeError {
    /// Name matches neither a long nor a short parameter name.
    #[error("unknown parameter '{name}'")]
    UnknownParameter { name: String },

    /// Write to an output.
    #[error("parameter '{name}' is an output and cannot be written")]
    NotWritable { name: String },

    /// Output read or cache query on an input.
    #[error("parameter '{name}' is not an output")]
    NotAnOutput { name: String },

    /// Input read on an output.
    #[error("parameter '{name}' is not an input")]
    NotAnInput { name: String },

    /// Scalar written to a transform input, or the reverse.
    #[error("parameter '{name}' expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        name: String,
        expected: ParamKind,
        actual: ParamKind,
    },

    /// Schema was invalid when the node was created.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl NodeError {
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownParameter { .. } | Self::NotAnOutput { .. } | Self::NotAnInput { .. } => {
                "lookup"
            }
            Self::NotWritable { .. } | Self::TypeMismatch { .. } => "validation",
            Self::Schema(_) => "schema",
        }
    }
}

/// Errors raised while registering or instantiating node types.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RegistryError {
    /// Type id already taken.
    #[error("node type id {type_id:#x} is already registered")]
    DuplicateTypeId { type_id: u32 },

    /// Type name already taken under another id.
    #[error("node type '{name}' is already registered")]
    DuplicateTypeName { name: String },

    /// No type registered under this name.
    #[error("node type '{name}' is not registered")]
    UnknownType { name: String },

    /// Schema for the type failed validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Configuration for the type failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Node construction failed.
    #[error("failed to instantiate node: {0}")]
    Instantiate(#[from] NodeError),
}

impl RegistryError {
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::DuplicateTypeId { .. } | Self::DuplicateTypeName { .. } => "registration",
            Self::UnknownType { .. } => "lookup",
            Self::Schema(_) => "schema",
            Self::Config(_) => "config",
            Self::Instantiate(_) => "node",
        }
    }
}

/// Errors raised while loading a [`Config`](crate::config::Config).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Malformed JSON or a field of the wrong type.
    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    /// A field parsed but its value is not allowed.
    #[error("invalid config value {field} = {value}: {reason}")]
    Invalid {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl ConfigError {
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "serialization",
            Self::Invalid { .. } => "validation",
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
