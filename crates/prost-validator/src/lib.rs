//! Runtime support for validators generated by
//! [`prost-validator-build`](https://crates.io/crates/prost-validator-build).
//!
//! The build-time generator compiles per-field rules attached to protobuf
//! schemas into plain Rust `impl Validate for Message` blocks. No reflection
//! happens at runtime: generated code reads struct fields directly and only
//! calls into this crate to build errors and to match regular expressions.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use prost_validator::Validate;
//!
//! let person = Person { age: 151, ..Default::default() };
//! match person.validate() {
//!     Ok(()) => { /* valid */ }
//!     Err(e) => eprintln!("{} failed on {}", e.rule_kind(), e.path()),
//! }
//! ```
//!
//! # Error chain
//!
//! A failure inside a nested message is reported as
//! [`ValidationError::Nested`] wrapping the inner failure, so
//! [`std::error::Error::source`] walks from the outermost field down to the
//! rule that failed. [`ValidationError::path`] flattens that chain into a
//! dotted field path.

#![warn(missing_docs)]

mod error;
mod rule;
pub mod runtime;

pub use error::ValidationError;
pub use rule::{ParseRuleKindError, RuleKind};

/// Implemented by generated code for every message in a compiled schema.
pub trait Validate {
    /// Check every rule attached to this message, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, wrapped once per enclosing message
    /// field when the violation is inside a nested message.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        (**self).validate()
    }
}

impl<T: Validate + ?Sized> Validate for &T {
    fn validate(&self) -> Result<(), ValidationError> {
        (**self).validate()
    }
}
