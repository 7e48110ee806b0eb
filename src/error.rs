//! Errors for the antlered-elk library
use thiserror::Error;

/// Error for the antlered-elk library
#[derive(Debug, Error)]
pub enum AntleredError {
    /// An IO Error
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    /// An error found during the parsing of an underlying format
    #[error("Parsing Error: {0}")]
    ParserError(#[from] Box<dyn std::error::Error>),

    /// Data has been given that we cannot make sense of or that would
    /// result in an invalid ontology
    #[error("Validity Error: {0}")]
    ValidityError(String),

    /// A command has been given that is invalid
    #[error("Command Error: {0}")]
    CommandError(String),

    /// A prefix name is already bound to a different IRI
    #[error("Prefix Conflict: {name} is bound to {bound}, cannot rebind to {requested}")]
    PrefixConflict {
        name: String,
        bound: String,
        requested: String,
    },

    /// A subsumption query named a class the ontology does not declare
    #[error("Unknown Class: {0}")]
    UnknownClass(String),

    /// A subsumption query named an object property the ontology does
    /// not declare
    #[error("Unknown Object Property: {0}")]
    UnknownProperty(String),

    /// A query term used a prefix the query does not declare
    #[error("Unknown Prefix: {0}")]
    UnknownPrefix(String),

    /// A query pattern contained a literal term
    #[error("Literals are not supported in query patterns")]
    LiteralsUnsupported,

    /// ORDER BY referred to something other than a pattern variable
    #[error("Unsupported expression in ORDER BY: {0}")]
    UnsupportedExpressionInOrderBy(String),
}

macro_rules! invalid {
    ($($arg:tt)*) => {
        $crate::error::AntleredError::ValidityError(format!($($arg)*))
    }
}
pub(crate) use invalid;

impl From<quick_xml::Error> for AntleredError {
    fn from(e: quick_xml::Error) -> Self {
        Self::ParserError(e.into())
    }
}

impl From<quick_xml::events::attributes::AttrError> for AntleredError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::ParserError(e.into())
    }
}
