//! The parsed constraint model consumed by the generator.
//!
//! Rules are produced by an annotation parser outside this crate and handed
//! over through [`RuleProvider`]. [`RuleSet`] is the in-memory provider.

use std::collections::HashMap;

use prost_reflect::{FieldDescriptor, MessageDescriptor};

pub use prost_validator::RuleKind;

/// A single operand value. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationValue {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Double(f64),
    /// Boolean literal.
    Bool(bool),
    /// String literal; also used for bytes, patterns and dotted enum identifiers.
    Binary(String),
    /// Another field of the same message, by proto field name.
    FieldReference(String),
    /// A computed value.
    Function(ToolFunction),
}

impl ValidationValue {
    /// Short description of the value type, used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer literal",
            Self::Double(_) => "floating literal",
            Self::Bool(_) => "bool literal",
            Self::Binary(_) => "binary literal",
            Self::FieldReference(_) => "field reference",
            Self::Function(_) => "function call",
        }
    }

    /// Reference another field of the same message.
    pub fn field(name: impl Into<String>) -> Self {
        Self::FieldReference(name.into())
    }

    /// Call a built-in or registered function.
    pub fn call(name: impl Into<String>, arguments: Vec<ValidationValue>) -> Self {
        Self::Function(ToolFunction::new(name, arguments))
    }
}

impl From<i64> for ValidationValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ValidationValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ValidationValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for ValidationValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ValidationValue {
    fn from(v: &str) -> Self {
        Self::Binary(v.to_string())
    }
}

impl From<String> for ValidationValue {
    fn from(v: String) -> Self {
        Self::Binary(v)
    }
}

impl From<ToolFunction> for ValidationValue {
    fn from(v: ToolFunction) -> Self {
        Self::Function(v)
    }
}

/// A function call operand: a name plus ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolFunction {
    /// Built-in name (`len`, `sprintf`, ...) or a registered function.
    pub name: String,
    /// Arguments in call order.
    pub arguments: Vec<ValidationValue>,
}

impl ToolFunction {
    /// Create a function call.
    pub fn new(name: impl Into<String>, arguments: Vec<ValidationValue>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The operand(s) attached to a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOperand {
    /// A single value (`const`, `lt`, `min_size`, ...).
    Specified(ValidationValue),
    /// An ordered list of values (`in`, `not_in`).
    Range(Vec<ValidationValue>),
    /// Rules applied one level deeper (`element`, `map_key`, `map_value`).
    Inner(Vec<Rule>),
}

/// One declarative constraint attached to a field or message.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// What the rule checks.
    pub kind: RuleKind,
    /// What it checks against.
    pub operand: RuleOperand,
}

impl Rule {
    /// A rule with a single operand.
    pub fn specified(kind: RuleKind, value: impl Into<ValidationValue>) -> Self {
        Self {
            kind,
            operand: RuleOperand::Specified(value.into()),
        }
    }

    /// A rule with a list of operands.
    #[must_use]
    pub fn range(kind: RuleKind, values: Vec<ValidationValue>) -> Self {
        Self {
            kind,
            operand: RuleOperand::Range(values),
        }
    }

    /// A composite rule carrying inner rules.
    #[must_use]
    pub fn inner(kind: RuleKind, rules: Vec<Rule>) -> Self {
        Self {
            kind,
            operand: RuleOperand::Inner(rules),
        }
    }

    /// `const` rule.
    pub fn r#const(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::Const, value)
    }

    /// `lt` rule.
    pub fn lt(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::Lt, value)
    }

    /// `le` rule.
    pub fn le(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::Le, value)
    }

    /// `gt` rule.
    pub fn gt(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::Gt, value)
    }

    /// `ge` rule.
    pub fn ge(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::Ge, value)
    }

    /// `min_size` rule.
    pub fn min_size(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::MinSize, value)
    }

    /// `max_size` rule.
    pub fn max_size(value: impl Into<ValidationValue>) -> Self {
        Self::specified(RuleKind::MaxSize, value)
    }

    /// `not_nil` rule.
    #[must_use]
    pub fn not_nil() -> Self {
        Self::specified(RuleKind::NotNil, true)
    }

    /// `element` rule.
    #[must_use]
    pub fn element(rules: Vec<Rule>) -> Self {
        Self::inner(RuleKind::Element, rules)
    }

    /// `map_key` rule.
    #[must_use]
    pub fn map_key(rules: Vec<Rule>) -> Self {
        Self::inner(RuleKind::MapKey, rules)
    }

    /// `map_value` rule.
    #[must_use]
    pub fn map_value(rules: Vec<Rule>) -> Self {
        Self::inner(RuleKind::MapValue, rules)
    }

    /// `assert` rule on a message.
    #[must_use]
    pub fn assert(function: ToolFunction) -> Self {
        Self::specified(RuleKind::Assert, function)
    }

    /// The single operand, if this rule carries one.
    #[must_use]
    pub fn specified_value(&self) -> Option<&ValidationValue> {
        match &self.operand {
            RuleOperand::Specified(v) => Some(v),
            _ => None,
        }
    }

    /// True when the operand is the boolean literal `true`.
    ///
    /// Flag rules (`not_nil`, `skip`, `defined_only`, `no_sparse`) are
    /// inactive when set to `false`.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.operand,
            RuleOperand::Specified(ValidationValue::Bool(true))
        )
    }
}

/// Supplies the parsed rules for fields and messages.
pub trait RuleProvider {
    /// Rules attached to `field`, in declaration order.
    fn field_rules(&self, field: &FieldDescriptor) -> &[Rule];

    /// Rules attached to the message itself (`assert`), in declaration order.
    fn message_rules(&self, message: &MessageDescriptor) -> &[Rule];
}

/// In-memory [`RuleProvider`] keyed by fully-qualified names.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: HashMap<String, Vec<Rule>>,
    messages: HashMap<String, Vec<Rule>>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach rules to a field, e.g. `example.v1.Person.age`.
    /// Rules are appended after any already attached to the field.
    #[must_use]
    pub fn field(mut self, full_name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.fields.entry(full_name.into()).or_default().extend(rules);
        self
    }

    /// Attach message-level rules, e.g. to `example.v1.Person`.
    #[must_use]
    pub fn message(mut self, full_name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.messages
            .entry(full_name.into())
            .or_default()
            .extend(rules);
        self
    }

    /// Returns true when no rules are attached anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.messages.is_empty()
    }
}

impl RuleProvider for RuleSet {
    fn field_rules(&self, field: &FieldDescriptor) -> &[Rule] {
        self.fields.get(field.full_name()).map_or(&[], Vec::as_slice)
    }

    fn message_rules(&self, message: &MessageDescriptor) -> &[Rule] {
        self.messages
            .get(message.full_name())
            .map_or(&[], Vec::as_slice)
    }
}
