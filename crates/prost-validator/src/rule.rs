use std::fmt;
use std::str::FromStr;

/// The closed set of rule kinds a field or message can carry.
///
/// Shared between the generator, which dispatches on it, and the generated
/// code, which reports it in [`ValidationError`](crate::ValidationError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum RuleKind {
    /// The field must be set (message-typed fields only).
    NotNil,
    /// The field must equal the operand.
    Const,
    /// Strict upper bound.
    Lt,
    /// Inclusive upper bound.
    Le,
    /// Strict lower bound.
    Gt,
    /// Inclusive lower bound.
    Ge,
    /// The field must equal one of the listed operands.
    In,
    /// The field must not equal any of the listed operands.
    NotIn,
    /// Inclusive lower bound on length or element count.
    MinSize,
    /// Inclusive upper bound on length or element count.
    MaxSize,
    /// Text or bytes must start with the operand.
    Prefix,
    /// Text or bytes must end with the operand.
    Suffix,
    /// Text or bytes must contain the operand.
    Contains,
    /// Text or bytes must not contain the operand.
    NotContains,
    /// Text or bytes must match the regular expression operand.
    Pattern,
    /// Enum value must be one of the declared constants.
    DefinedOnly,
    /// Suppresses recursive validation of a message field.
    Skip,
    /// Message-level boolean assertion.
    Assert,
    /// Map values must all be set.
    NoSparse,
    /// Inner rules applied to every map key.
    MapKey,
    /// Inner rules applied to every map value.
    MapValue,
    /// Inner rules applied to every list element.
    Element,
}

impl RuleKind {
    /// Every rule kind, in declaration order.
    pub const ALL: [Self; 22] = [
        Self::NotNil,
        Self::Const,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::In,
        Self::NotIn,
        Self::MinSize,
        Self::MaxSize,
        Self::Prefix,
        Self::Suffix,
        Self::Contains,
        Self::NotContains,
        Self::Pattern,
        Self::DefinedOnly,
        Self::Skip,
        Self::Assert,
        Self::NoSparse,
        Self::MapKey,
        Self::MapValue,
        Self::Element,
    ];

    /// The annotation spelling of this rule, e.g. `min_size`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotNil => "not_nil",
            Self::Const => "const",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::MinSize => "min_size",
            Self::MaxSize => "max_size",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::Pattern => "pattern",
            Self::DefinedOnly => "defined_only",
            Self::Skip => "skip",
            Self::Assert => "assert",
            Self::NoSparse => "no_sparse",
            Self::MapKey => "map_key",
            Self::MapValue => "map_value",
            Self::Element => "element",
        }
    }

    /// The Rust variant name, used when emitting `RuleKind::<Variant>` paths.
    #[must_use]
    pub const fn variant_name(self) -> &'static str {
        match self {
            Self::NotNil => "NotNil",
            Self::Const => "Const",
            Self::Lt => "Lt",
            Self::Le => "Le",
            Self::Gt => "Gt",
            Self::Ge => "Ge",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::MinSize => "MinSize",
            Self::MaxSize => "MaxSize",
            Self::Prefix => "Prefix",
            Self::Suffix => "Suffix",
            Self::Contains => "Contains",
            Self::NotContains => "NotContains",
            Self::Pattern => "Pattern",
            Self::DefinedOnly => "DefinedOnly",
            Self::Skip => "Skip",
            Self::Assert => "Assert",
            Self::NoSparse => "NoSparse",
            Self::MapKey => "MapKey",
            Self::MapValue => "MapValue",
            Self::Element => "Element",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown rule name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule kind `{0}`")]
pub struct ParseRuleKindError(pub String);

impl FromStr for RuleKind {
    type Err = ParseRuleKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseRuleKindError(s.to_string()))
    }
}
