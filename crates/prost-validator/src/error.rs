use std::fmt::Write as _;

use crate::rule::RuleKind;

/// Returned by a generated `validate` procedure when a rule is violated.
///
/// Failures inside nested messages are wrapped in [`ValidationError::Nested`]
/// naming the enclosing field, so the chain can be walked from the outermost
/// field down to the rule that actually failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A rule on `field` failed for the current `value`.
    #[error("field {field} {rule} rule failed, current value: {value}")]
    Rule {
        /// Field label, e.g. `age`, `tags[2]` or `labels["k"]`.
        field: String,
        /// The violated rule.
        rule: RuleKind,
        /// Debug rendering of the offending value (or count, for size rules).
        value: String,
    },

    /// A nested message stored in `field` is not valid.
    #[error("field {field} not valid")]
    Nested {
        /// Label of the enclosing field.
        field: String,
        /// The failure reported by the nested message.
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Build a rule failure. Called from generated code.
    #[must_use]
    pub fn rule(rule: RuleKind, field: &str, value: String) -> Self {
        Self::Rule {
            field: field.to_string(),
            rule,
            value,
        }
    }

    /// Wrap the failure of a nested message stored in `field`. Called from generated code.
    #[must_use]
    pub fn nested(field: &str, source: ValidationError) -> Self {
        Self::Nested {
            field: field.to_string(),
            source: Box::new(source),
        }
    }

    /// Label of the field this error is reported on (outermost level).
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Rule { field, .. } | Self::Nested { field, .. } => field,
        }
    }

    /// The innermost failure in the chain; never a [`ValidationError::Nested`].
    #[must_use]
    pub fn innermost(&self) -> &ValidationError {
        let mut current = self;
        while let Self::Nested { source, .. } = current {
            current = source;
        }
        current
    }

    /// The rule that ultimately failed.
    #[must_use]
    pub fn rule_kind(&self) -> RuleKind {
        self.leaf().0
    }

    /// The offending value reported by the innermost failure.
    #[must_use]
    pub fn value(&self) -> &str {
        self.leaf().1
    }

    fn leaf(&self) -> (RuleKind, &str) {
        let mut current = self;
        loop {
            match current {
                Self::Rule { rule, value, .. } => return (*rule, value),
                Self::Nested { source, .. } => current = source,
            }
        }
    }

    /// Dot-separated field labels from the outermost field to the failing one,
    /// e.g. `addr.zip`.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::new();
        let mut current = self;
        loop {
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(current.field());
            match current {
                Self::Nested { source, .. } => current = source,
                Self::Rule { .. } => return path,
            }
        }
    }

    /// Render the whole chain on one line, outermost first.
    #[must_use]
    pub fn chain_to_string(&self) -> String {
        let mut out = self.to_string();
        let mut current = self;
        while let Self::Nested { source, .. } = current {
            let _ = write!(out, ": {source}");
            current = source;
        }
        out
    }
}
