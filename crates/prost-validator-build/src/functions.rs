//! Computed operands.
//!
//! A rule operand may be a function call such as `len(tags)` or
//! `add(min, 1)`. Every function, built in or user supplied, renders a code
//! fragment that binds its result to a fresh local. User functions are
//! looked up through a [`FunctionRegistry`], usually a
//! [`Config`](crate::Config) loaded from TOML.

mod builtin;
pub(crate) mod template;

use prost_validator::RuleKind;

use crate::error::Cause;
use crate::rules::ToolFunction;

pub(crate) use builtin::{lookup as builtin, returns_bool};

/// Everything a function needs to render one call site.
#[derive(Debug, Clone, Copy)]
pub struct FunctionCall<'a> {
    /// Local the fragment must bind, e.g. `_src3`.
    pub source: &'a str,
    /// Protobuf package of the schema file.
    pub package: &'a str,
    /// Path of the schema file.
    pub file: &'a str,
    /// Rust path of the message being validated, relative to its package module.
    pub message: &'a str,
    /// The call as written in the rule.
    pub function: &'a ToolFunction,
    /// Rendered argument expressions, in call order.
    pub args: &'a [String],
    /// Path of the runtime support crate, e.g. `::prost_validator`.
    pub runtime: &'a str,
    /// Rule the call is an operand of.
    pub rule: RuleKind,
    /// `&str` expression naming the field a failure is reported on.
    pub label: &'a str,
}

/// A function that can appear in rule operands.
pub trait FunctionTemplate {
    /// Render statements binding `call.source` to the function's result.
    ///
    /// # Errors
    ///
    /// Returns a [`Cause`] when the arguments do not fit the function or the
    /// template is malformed. Generation of the schema file is aborted.
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause>;

    /// Paths the rendered code needs in scope, e.g. `crate::helpers::is_upper`.
    ///
    /// # Errors
    ///
    /// A failure here is logged and the imports are skipped.
    fn imports(&self, _call: &FunctionCall<'_>) -> Result<Vec<String>, Cause> {
        Ok(Vec::new())
    }
}

/// Looks up user-supplied functions by name.
pub trait FunctionRegistry {
    /// The function registered as `name`, if any.
    fn lookup(&self, name: &str) -> Option<&dyn FunctionTemplate>;
}

impl<T: FunctionRegistry + ?Sized> FunctionRegistry for std::sync::Arc<T> {
    fn lookup(&self, name: &str) -> Option<&dyn FunctionTemplate> {
        (**self).lookup(name)
    }
}
