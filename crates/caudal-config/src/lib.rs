//! Configuration tree for the caudal stream opener.
//!
//! The opener consumes two tables:
//!
//! - `[pcm.<name>]` — a named stream definition: a required `type`, an
//!   optional `stream` direction filter, and arbitrary backend-specific
//!   fields the factory interprets
//! - `[pcmtype.<type>]` — how to reach the factory for a type: an `open`
//!   symbol plus an optional `lib`; unknown fields are rejected
//!
//! The textual format is TOML and parsing is delegated entirely to the
//! `toml` crate; this crate only models the tree.
//!
//! # Example
//!
//! ```rust
//! use caudal_config::Config;
//!
//! let config = Config::parse(r#"
//!     [pcm.default]
//!     type = "plug"
//!     slave = "null"
//!
//!     [pcmtype.plug]
//!     open = "plug_open"
//! "#).unwrap();
//!
//! let def = config.pcm("default").unwrap();
//! assert_eq!(def.type_name, "plug");
//! assert_eq!(config.pcm_type("plug").unwrap().open, "plug_open");
//! ```

mod error;

pub use error::ConfigError;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Direction filter a named stream definition may impose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFilter {
    /// Only playback opens may use the definition.
    Playback,
    /// Only capture opens may use the definition.
    Capture,
}

/// A named stream definition under `[pcm.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct PcmDef {
    /// Backend type the definition resolves through.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Optional direction restriction.
    #[serde(default)]
    pub stream: Option<StreamFilter>,
    /// Backend-specific fields, passed to the factory untouched.
    #[serde(flatten)]
    pub fields: toml::Table,
}

impl PcmDef {
    /// A backend-specific string field, if present and a string.
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// A factory binding under `[pcmtype.<type>]`.
///
/// Unknown fields are a configuration error.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    /// Free-form description, ignored by the opener.
    #[serde(default)]
    pub comment: Option<String>,
    /// Library holding the factory; the built-in registry when absent.
    #[serde(default)]
    pub lib: Option<String>,
    /// Factory symbol name.
    pub open: String,
}

/// The configuration tree consumed by the opener.
///
/// Sections other than `pcm` and `pcmtype` are ignored, so the tree can live
/// inside a larger configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Named stream definitions.
    pub pcm: HashMap<String, PcmDef>,
    /// Factory bindings per backend type.
    pub pcmtype: HashMap<String, TypeDef>,
}

impl Config {
    /// An empty tree: every open falls through to the literal name grammar.
    pub fn empty() -> Config {
        Config::default()
    }

    /// Parse a tree from TOML text.
    pub fn parse(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a tree from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::read_file(path, source))?;
        Config::parse(&text)
    }

    /// Look up a named stream definition.
    pub fn pcm(&self, name: &str) -> Option<&PcmDef> {
        self.pcm.get(name)
    }

    /// Look up a factory binding.
    pub fn pcm_type(&self, type_name: &str) -> Option<&TypeDef> {
        self.pcmtype.get(type_name)
    }
}
