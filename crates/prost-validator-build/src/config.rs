use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Cause, ConfigError};
use crate::functions::template;
use crate::functions::{FunctionCall, FunctionRegistry, FunctionTemplate};

/// Options for configuring a [`Generator`](crate::Generator) at construction time.
#[non_exhaustive]
pub enum GeneratorOption {
    /// Path of the runtime support crate as written in generated code.
    /// Defaults to `::prost_validator`.
    RuntimeCrate(String),

    /// Registry consulted for functions that are not built in. May be given
    /// more than once; earlier registries win.
    Functions(Arc<dyn FunctionRegistry + Send + Sync>),

    /// Emit the "generated code" provenance comment. Enabled by default.
    Header(bool),
}

/// Generator configuration loaded from TOML.
///
/// ```toml
/// runtime_crate = "::prost_validator"
///
/// [function.is_upper]
/// template = "let {{source}} = crate::helpers::is_upper({{arg0}});"
/// import = "[crate::helpers::is_upper]"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the runtime support crate as written in generated code.
    pub runtime_crate: Option<String>,

    /// Emit the provenance comment.
    pub header: Option<bool>,

    /// User functions keyed by the name used in rules.
    pub function: BTreeMap<String, FunctionConfig>,
}

/// A user function defined by code templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionConfig {
    /// Statements binding `{{source}}` to the function's result.
    pub template: String,

    /// Import paths the rendered code needs, one bracketed path per line.
    #[serde(default)]
    pub import: Option<String>,
}

impl Config {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Convert into generator options. The configuration itself becomes the
    /// function registry.
    #[must_use]
    pub fn into_options(self) -> Vec<GeneratorOption> {
        let mut options = Vec::new();
        if let Some(runtime) = &self.runtime_crate {
            options.push(GeneratorOption::RuntimeCrate(runtime.clone()));
        }
        if let Some(header) = self.header {
            options.push(GeneratorOption::Header(header));
        }
        if !self.function.is_empty() {
            options.push(GeneratorOption::Functions(Arc::new(self)));
        }
        options
    }
}

impl FunctionRegistry for Config {
    fn lookup(&self, name: &str) -> Option<&dyn FunctionTemplate> {
        self.function
            .get(name)
            .map(|function| function as &dyn FunctionTemplate)
    }
}

impl FunctionTemplate for FunctionConfig {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        template::render(&call.function.name, &self.template, call)
    }

    fn imports(&self, call: &FunctionCall<'_>) -> Result<Vec<String>, Cause> {
        let Some(import) = &self.import else {
            return Ok(Vec::new());
        };
        let rendered = template::render(&call.function.name, import, call)?;
        Ok(template::parse_imports(&call.function.name, &rendered))
    }
}
