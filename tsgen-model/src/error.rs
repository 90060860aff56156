//! Error types for metadata parsing and type graph construction.

use thiserror::Error;

/// Error type for metadata parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Malformed type expression such as `List<int`.
    #[error("invalid type expression '{expression}': {message}")]
    InvalidTypeExpression {
        /// The offending expression.
        expression: String,
        /// What went wrong.
        message: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition (type, member, etc.).
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// Invalid metadata structure.
    #[error("invalid metadata structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Malformed entity in an attribute value.
    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
}

/// Error type for type graph construction and validation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The requested root type is not known to the metadata provider.
    #[error("root type '{name}' not found")]
    RootNotFound {
        /// Requested type name.
        name: String,
    },

    /// A base type chain refers back to itself.
    #[error("circular base type chain: {path}")]
    CircularBase {
        /// The chain, joined with ` -> `.
        path: String,
    },

    /// A base type that is not a class or interface.
    #[error("type '{type_name}' cannot derive from '{base}'")]
    InvalidBase {
        /// Derived type.
        type_name: String,
        /// Offending base.
        base: String,
    },

    /// A base type that was not fully constructed before its derived type.
    #[error("base type of '{type_name}' was not built before it")]
    IncompleteBase {
        /// Derived type.
        type_name: String,
    },

    /// Two members with the same name on one type.
    #[error("duplicate member '{member}' on type '{type_name}'")]
    DuplicateMember {
        /// Owning type.
        type_name: String,
        /// Member name.
        member: String,
    },

    /// A UI hint whose parameters cannot be interpreted.
    #[error("invalid UI hint on '{member}': {message}")]
    InvalidUiHint {
        /// Member carrying the hint.
        member: String,
        /// Error message.
        message: String,
    },

    /// A declarative constraint whose parameters cannot be interpreted.
    #[error("invalid constraint on '{member}': {message}")]
    InvalidConstraint {
        /// Member carrying the constraint.
        member: String,
        /// Error message.
        message: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid type expression error.
    pub fn type_expression(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTypeExpression {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl ModelError {
    /// Creates an invalid constraint error.
    pub fn constraint(member: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            member: member.into(),
            message: message.into(),
        }
    }
}
