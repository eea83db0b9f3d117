//! Run configuration and override tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CodegenError;
use crate::mapping::TargetLanguage;
use crate::overflow::ROW_CEILING;

const BUILTIN_OVERRIDES: &str = include_str!("../resources/overrides.toml");

/// Renames rows of one enumeration by numeric value.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValueAliases {
    /// UID of the enumeration the aliases apply to.
    pub uid: String,
    /// Value (as text) → row identifier.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

/// Name disambiguation tables consumed by the resolver.
///
/// The tables are authoritative: an entry always wins over the name that
/// would be derived from registry text.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    /// UID → type name.
    pub uid_names: BTreeMap<String, String>,
    /// Row aliases for one enumeration.
    pub value_aliases: Option<ValueAliases>,
    /// Subtree UID → (raw description → identifier).
    pub special_cases: BTreeMap<String, BTreeMap<String, String>>,
}

impl Overrides {
    /// Returns the tables shipped with the generator.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::InvalidOverrides`] if the embedded table does
    /// not parse.
    pub fn builtin() -> Result<Self, CodegenError> {
        Self::from_toml_str(BUILTIN_OVERRIDES, "<built-in>")
    }

    /// Loads tables from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::MissingOverrides`] if the file cannot be read
    /// and [`CodegenError::InvalidOverrides`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, CodegenError> {
        let text = fs::read_to_string(path).map_err(|source| CodegenError::MissingOverrides {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Parses tables from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CodegenError::InvalidOverrides`] on syntax errors or when an
    /// alias key is not an integer.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, CodegenError> {
        let overrides: Overrides =
            toml::from_str(text).map_err(|e| CodegenError::InvalidOverrides {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;
        if let Some(aliases) = &overrides.value_aliases {
            if let Some(bad) = aliases.values.keys().find(|k| k.trim().parse::<i64>().is_err()) {
                return Err(CodegenError::InvalidOverrides {
                    origin: origin.to_string(),
                    message: format!("value alias key {bad:?} is not an integer"),
                });
            }
        }
        Ok(overrides)
    }

    /// Override type name for a UID.
    #[must_use]
    pub fn uid_name(&self, uid: &str) -> Option<&str> {
        self.uid_names.get(uid).map(String::as_str)
    }

    /// Alias for one row of the aliased enumeration.
    #[must_use]
    pub fn value_alias(&self, uid: &str, value: i64) -> Option<&str> {
        let aliases = self.value_aliases.as_ref().filter(|a| a.uid == uid)?;
        aliases
            .values
            .iter()
            .find(|(k, _)| k.trim().parse::<i64>().ok() == Some(value))
            .map(|(_, v)| v.as_str())
    }

    /// Fixed identifier for a description inside the subtree `scope_uid`.
    #[must_use]
    pub fn special_case(&self, scope_uid: &str, description: &str) -> Option<&str> {
        self.special_cases
            .get(scope_uid)?
            .get(description.trim())
            .map(String::as_str)
    }

    /// Fixed identifier for one enumeration row: its value alias, else a
    /// special case keyed by the enumeration's UID.
    #[must_use]
    pub fn enumeration_row(&self, uid: &str, value: i64, description: &str) -> Option<&str> {
        self.value_alias(uid, value)
            .or_else(|| self.special_case(uid, description))
    }
}

/// Everything one generation run needs.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Registry XML file.
    pub registry: PathBuf,
    /// Target language.
    pub language: TargetLanguage,
    /// Output root directory.
    pub out_dir: PathBuf,
    /// Root package / namespace, dot- or `::`-separated.
    pub root_namespace: String,
    /// Override tables.
    pub overrides: Overrides,
    /// Maximum rows per emitted enumeration.
    pub row_ceiling: usize,
}

impl GeneratorConfig {
    /// Creates a configuration with the built-in override tables and the
    /// default row ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in override table is invalid.
    pub fn new(
        registry: impl Into<PathBuf>,
        language: TargetLanguage,
        out_dir: impl Into<PathBuf>,
    ) -> Result<Self, CodegenError> {
        Ok(Self {
            registry: registry.into(),
            language,
            out_dir: out_dir.into(),
            root_namespace: language.default_root_namespace().to_string(),
            overrides: Overrides::builtin()?,
            row_ceiling: ROW_CEILING,
        })
    }

    /// Root namespace split into segments.
    #[must_use]
    pub fn root_segments(&self) -> Vec<String> {
        self.root_namespace
            .split(['.', ':', '/'])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
