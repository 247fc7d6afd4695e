use std::fmt;

use prost_validator::RuleKind;

/// Top-level error type returned by generation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A rule could not be compiled into validation code.
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A schema file named for generation is not in the descriptor pool.
    #[error("file {0} not found in descriptor pool")]
    FileNotFound(String),
}

/// Where in the schema a compilation error was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Schema file path, e.g. `example/v1/person.proto`.
    pub file: String,
    /// Fully-qualified message name.
    pub message: Option<String>,
    /// Field path inside the message, e.g. `tags` or `labels.value`.
    pub field: Option<String>,
    /// The rule being compiled.
    pub rule: Option<RuleKind>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file)?;
        if let Some(message) = &self.message {
            write!(f, ": message {message}")?;
        }
        if let Some(field) = &self.field {
            write!(f, ", field {field}")?;
        }
        if let Some(rule) = self.rule {
            write!(f, ", rule {rule}")?;
        }
        Ok(())
    }
}

/// Returned when a rule cannot be compiled. Aborts generation of the file.
#[derive(Debug, thiserror::Error)]
#[error("compilation error in {location}: {cause}")]
pub struct CompilationError {
    /// Offending schema file, message, field and rule.
    pub location: Location,
    /// Why the rule failed to compile.
    pub cause: Cause,
}

/// The reason a rule failed to compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Cause {
    /// The rule kind has no meaning for the field's type category.
    #[error("rule `{rule}` is not supported for {category} fields")]
    UnsupportedRule {
        /// The rejected rule.
        rule: RuleKind,
        /// Type category of the field, e.g. `numeric`.
        category: &'static str,
    },

    /// The operand's value type cannot be used with the rule.
    #[error("{value} operand is not supported for rule `{rule}` on {category} fields")]
    UnsupportedValue {
        /// The rule carrying the operand.
        rule: RuleKind,
        /// Value type of the operand, e.g. `bool literal`.
        value: &'static str,
        /// Type category of the field.
        category: &'static str,
    },

    /// The rule carries an operand shape it cannot use (e.g. a list for `lt`).
    #[error("rule `{rule}` expects {expected}")]
    MissingOperand {
        /// The rule carrying the operand.
        rule: RuleKind,
        /// Operand shape the rule needs.
        expected: &'static str,
    },

    /// A dotted enum identifier does not name any known enum value.
    #[error("can not find enum value `{identifier}` in package `{package}`")]
    UnresolvedEnum {
        /// The identifier as written.
        identifier: String,
        /// Package the lookup was performed in.
        package: String,
    },

    /// A dotted enum identifier names a value of another enum than the field's.
    #[error("enum value `{identifier}` belongs to `{found}`, not to the field's enum `{expected}`")]
    EnumTypeMismatch {
        /// The identifier as written.
        identifier: String,
        /// Full name of the field's enum.
        expected: String,
        /// Full name of the enum the identifier resolved to.
        found: String,
    },

    /// A dotted enum identifier has too few segments.
    #[error("wrong format for enum rule `{0}`, expected `Enum.VALUE` or `pkg.Enum.VALUE`")]
    MalformedEnumReference(String),

    /// `no_sparse` on a map whose values are not messages.
    #[error("no_sparse rule is only applicable to maps with message values")]
    NoSparseOnScalar,

    /// A function is neither built in nor registered.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    /// A message `assert` calls a built-in that does not yield a bool.
    #[error("assert needs a function returning bool, `{0}` does not")]
    NonBooleanAssert(String),

    /// A function was called with the wrong arguments.
    #[error("function `{name}` {reason}")]
    FunctionArity {
        /// Function name.
        name: String,
        /// What was wrong with the arguments.
        reason: String,
    },

    /// A registered function template could not be rendered.
    #[error("execute function {name}'s template failed: {reason}")]
    Template {
        /// Function name.
        name: String,
        /// What was malformed.
        reason: String,
    },

    /// A field reference names a field the message does not have.
    #[error("field reference `{0}` does not name a field of the message")]
    UnknownField(String),

    /// A literal does not fit the field's numeric type.
    #[error("literal {literal} is out of range for {ty}")]
    LiteralOutOfRange {
        /// Literal as written.
        literal: String,
        /// Rust type of the field.
        ty: &'static str,
    },

    /// A literal regular expression does not compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// The field kind cannot be used in this position.
    #[error("{0}")]
    UnsupportedKind(String),
}

impl Cause {
    /// Attach a location to this cause.
    pub(crate) fn at(self, location: Location) -> CompilationError {
        CompilationError {
            location,
            cause: self,
        }
    }
}

/// Returned when configuration cannot be loaded.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
