//! Compile per-field validation rules on protobuf schemas into Rust
//! `impl Validate` blocks for `prost`-generated message structs.
//!
//! Rules are attached to fields and messages of a
//! [`prost_reflect::DescriptorPool`] through a [`RuleProvider`]. The
//! generator resolves everything at build time: field reads, enum
//! constants, literal types, regular expressions and function calls. The
//! emitted code does no reflection and depends only on the
//! [`prost-validator`](https://docs.rs/prost-validator) runtime crate.
//!
//! # Quick start
//!
//! In `build.rs`, after `prost-build` has produced the message structs:
//!
//! ```rust,no_run
//! use prost_validator_build::{Generator, Rule, RuleSet};
//! # fn build(pool: prost_reflect::DescriptorPool) -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleSet::new()
//!     .field("example.v1.Person.age", vec![Rule::ge(0), Rule::le(150)])
//!     .field("example.v1.Person.tags", vec![
//!         Rule::max_size(3),
//!         Rule::element(vec![Rule::min_size(1)]),
//!     ]);
//! let generator = Generator::new(pool, rules);
//! for file in generator.generate_files(["example/v1/person.proto"])? {
//!     let out = std::path::Path::new(&std::env::var("OUT_DIR")?).join(&file.name);
//!     if let Some(dir) = out.parent() {
//!         std::fs::create_dir_all(dir)?;
//!     }
//!     std::fs::write(out, file.content)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The output is then `include!`d into the module holding the prost types
//! of the same package.
//!
//! # Error types
//!
//! | Type | When |
//! |------|------|
//! | [`CompilationError`] | A rule cannot be compiled for its field; names file, message, field and rule |
//! | [`ConfigError`] | A TOML configuration cannot be read or parsed |
//!
//! Both are unified under [`Error`].

#![warn(missing_docs)]

mod config;
mod error;
mod functions;
mod generator;
mod rules;

pub use config::{Config, FunctionConfig, GeneratorOption};
pub use error::{Cause, CompilationError, ConfigError, Error, Location};
pub use functions::{FunctionCall, FunctionRegistry, FunctionTemplate};
pub use generator::{DEFAULT_RUNTIME_CRATE, GeneratedFile, Generator};
pub use rules::{Rule, RuleKind, RuleOperand, RuleProvider, RuleSet, ToolFunction, ValidationValue};
