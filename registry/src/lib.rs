//! SISO enumeration registry encoded as typed Rust data.
//!
//! The `disenum-registry` crate provides the data model for the enumerations
//! registry (scalar enumerations, bitfields, dictionaries and the entity,
//! object and jammer classification trees) together with a streaming reader
//! that turns the registry XML into a flat sequence of [`RegistryEvent`]s.
//!
//! # Entry Point
//!
//! ```
//! use disenum_registry::{ElementKind, RegistryEvent, RegistryReader};
//!
//! let xml = r#"<ebv><enum uid="7" name="Entity Kind" size="8"/></ebv>"#;
//! let mut reader = RegistryReader::from_str(xml);
//! let mut kinds = Vec::new();
//! while let RegistryEvent::Start(element) = reader.next_event()? {
//!     kinds.push(element.kind);
//!     if element.kind == ElementKind::Enum {
//!         break;
//!     }
//! }
//! assert_eq!(kinds.last(), Some(&ElementKind::Enum));
//! # Ok::<(), disenum_registry::RegistryError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod error;
pub mod model;
pub mod reader;

pub use error::RegistryError;
pub use model::{
    uids, BitSize, BitfieldRow, BitfieldType, ClassificationNode, ClassificationTree,
    CrossReference, DictionaryRow, DictionaryType, EnumerationRow, EnumerationType, Hierarchy,
    Level, NodeId, RegistryModel, Revision,
};
pub use reader::{Element, ElementKind, RegistryEvent, RegistryReader};
