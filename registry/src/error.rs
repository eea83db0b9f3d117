//! Registry error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Level;

/// Errors raised while reading the registry or assembling its model.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be opened.
    #[error("failed to open registry {}: {source}", path.display())]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The XML tokenizer rejected the document.
    #[error("malformed registry XML near byte {position}: {source}")]
    Xml {
        /// Byte offset reported by the tokenizer.
        position: u64,
        /// Underlying tokenizer error.
        source: quick_xml::Error,
    },

    /// A required attribute is absent.
    #[error("<{element}> near byte {position} is missing attribute `{attribute}`")]
    MissingAttribute {
        /// Element tag.
        element: String,
        /// Attribute name.
        attribute: &'static str,
        /// Byte offset of the element.
        position: u64,
    },

    /// A numeric attribute does not parse.
    #[error("<{element}> near byte {position}: attribute `{attribute}` is not a number: {value:?}")]
    InvalidNumber {
        /// Element tag.
        element: String,
        /// Attribute name.
        attribute: &'static str,
        /// Raw attribute value.
        value: String,
        /// Byte offset of the element.
        position: u64,
    },

    /// A classification node was opened under a parent of the wrong level.
    #[error("{child:?} cannot be nested under {parent:?}")]
    LevelMismatch {
        /// Level of the open parent (`None` for the tree root).
        parent: Option<Level>,
        /// Level of the rejected child.
        child: Level,
    },

    /// A node's resolved name was assigned twice.
    #[error("resolved name of classification node {0} is already set")]
    NameAlreadySet(usize),

    /// The document ended while elements were still open.
    #[error("registry ended inside <{0}>")]
    UnexpectedEof(String),
}
