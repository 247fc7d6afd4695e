//! Materializing rule operands: literals, reads of sibling fields, and
//! function calls bound to temporaries.

use prost_reflect::{Cardinality, FieldDescriptor};
use prost_validator::RuleKind;

use crate::error::Cause;
use crate::functions::{self, FunctionCall, FunctionTemplate};
use crate::rules::{ToolFunction, ValidationValue};

use super::context::Emitter;
use super::kind::{Access, FieldKind, Numeric};
use super::naming;

/// True when prost stores the field as `Option<T>` next to a getter.
pub(crate) fn has_optional_storage(field: &FieldDescriptor) -> bool {
    field.supports_presence()
        && field.cardinality() != Cardinality::Required
        && field.containing_oneof().is_none_or(|oneof| oneof.is_synthetic())
}

/// Canonical read of a singular or repeated field outside any oneof.
pub(crate) fn read_field(field: &FieldDescriptor, kind: &FieldKind) -> String {
    let ident = naming::to_snake(field.name());
    let place = format!("self.{ident}");
    if !has_optional_storage(field) || matches!(kind, FieldKind::Message(_)) {
        return kind.read(Access::Owned(&place));
    }
    match kind {
        FieldKind::Enum(e) => {
            let default = field
                .field_descriptor_proto()
                .default_value
                .as_deref()
                .and_then(|name| e.get_value_by_name(name))
                .unwrap_or_else(|| e.default_value())
                .number();
            format!("{place}.unwrap_or({default}_i32)")
        }
        _ => format!("self.{ident}()"),
    }
}

/// Read of the sibling field `name`, for use as an operand.
fn sibling(em: &Emitter<'_>, name: &str) -> Result<(String, FieldKind), Cause> {
    let field = em
        .message
        .get_field_by_name(name)
        .ok_or_else(|| Cause::UnknownField(name.to_string()))?;
    if field
        .containing_oneof()
        .is_some_and(|oneof| !oneof.is_synthetic())
    {
        return Err(Cause::UnsupportedKind(format!(
            "field reference `{name}` names a oneof member"
        )));
    }
    let kind = FieldKind::of_field(&field);
    if let FieldKind::Message(_) = kind {
        return Err(Cause::UnsupportedKind(format!(
            "field reference `{name}` names a message field"
        )));
    }
    Ok((read_field(&field, &kind), kind))
}

/// The rule an operand belongs to and the field its failures are reported on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Subject<'a> {
    pub rule: RuleKind,
    /// `&str` expression naming the field.
    pub label: &'a str,
}

fn unsupported(rule: RuleKind, value: &ValidationValue, category: &'static str) -> Cause {
    Cause::UnsupportedValue {
        rule,
        value: value.type_name(),
        category,
    }
}

/// Typed literal for an integer operand.
pub(crate) fn int_literal(ty: Numeric, v: i64) -> Result<String, Cause> {
    let fits = match ty {
        Numeric::I32 => i32::try_from(v).is_ok(),
        Numeric::U32 => u32::try_from(v).is_ok(),
        Numeric::U64 => u64::try_from(v).is_ok(),
        Numeric::I64 | Numeric::F32 | Numeric::F64 => true,
    };
    if !fits {
        return Err(Cause::LiteralOutOfRange {
            literal: v.to_string(),
            ty: ty.rust_type(),
        });
    }
    #[allow(clippy::cast_precision_loss)]
    let literal = match ty {
        Numeric::F32 => format!("{:?}_f32", v as f32),
        Numeric::F64 => format!("{:?}_f64", v as f64),
        _ => format!("{v}_{}", ty.rust_type()),
    };
    Ok(literal)
}

/// Typed literal for a floating operand. Only float fields accept one.
pub(crate) fn float_literal(ty: Numeric, v: f64) -> Result<String, Cause> {
    let ty_name = ty.rust_type();
    if v.is_nan() {
        return Ok(format!("{ty_name}::NAN"));
    }
    if v.is_infinite() {
        let sign = if v < 0.0 { "NEG_" } else { "" };
        return Ok(format!("{ty_name}::{sign}INFINITY"));
    }
    if ty == Numeric::F32 && v.abs() > f64::from(f32::MAX) {
        return Err(Cause::LiteralOutOfRange {
            literal: v.to_string(),
            ty: ty_name,
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let literal = match ty {
        Numeric::F32 => format!("{:?}_f32", v as f32),
        _ => format!("{v:?}_f64"),
    };
    Ok(literal)
}

/// Expression of the field's numeric type for a numeric rule operand.
pub(crate) fn numeric(
    em: &mut Emitter<'_>,
    ty: Numeric,
    at: Subject<'_>,
    value: &ValidationValue,
) -> Result<String, Cause> {
    let rule = at.rule;
    let ty_name = ty.rust_type();
    match value {
        ValidationValue::Int(v) => int_literal(ty, *v),
        ValidationValue::Double(v) if ty.is_float() => float_literal(ty, *v),
        ValidationValue::FieldReference(name) => {
            let (read, kind) = sibling(em, name)?;
            match kind {
                FieldKind::Numeric(_) | FieldKind::Enum(_) => Ok(format!("({read}) as {ty_name}")),
                _ => Err(unsupported(rule, value, "numeric")),
            }
        }
        ValidationValue::Function(f) => {
            let source = em.ids.allocate("_src");
            call(em, at, &source, f)?;
            Ok(format!("({source}) as {ty_name}"))
        }
        ValidationValue::Double(_) | ValidationValue::Bool(_) | ValidationValue::Binary(_) => {
            Err(unsupported(rule, value, "numeric"))
        }
    }
}

/// Operand of a bool `const` rule: a literal or another bool field.
pub(crate) fn boolean(em: &Emitter<'_>, rule: RuleKind, value: &ValidationValue) -> Result<String, Cause> {
    match value {
        ValidationValue::Bool(b) => Ok(b.to_string()),
        ValidationValue::FieldReference(name) => match sibling(em, name)? {
            (read, FieldKind::Bool) => Ok(read),
            _ => Err(unsupported(rule, value, "bool")),
        },
        _ => Err(unsupported(rule, value, "bool")),
    }
}

/// Bind a text or byte-string operand to a new `&str` / `&[u8]` local.
/// Returns the local's name.
pub(crate) fn binary(
    em: &mut Emitter<'_>,
    text: bool,
    at: Subject<'_>,
    value: &ValidationValue,
) -> Result<String, Cause> {
    let rule = at.rule;
    let (ty, category) = if text { ("&str", "string") } else { ("&[u8]", "bytes") };
    let source = em.ids.allocate("_src");
    let expr = match value {
        ValidationValue::Binary(s) if text => naming::str_literal(s),
        ValidationValue::Binary(s) => naming::bytes_literal(s),
        ValidationValue::FieldReference(name) => {
            let (read, kind) = sibling(em, name)?;
            match (kind, text) {
                (FieldKind::String, true) | (FieldKind::Bytes, false) => read,
                (FieldKind::String, false) => format!("({read}).as_bytes()"),
                _ => return Err(unsupported(rule, value, category)),
            }
        }
        ValidationValue::Function(f) => {
            call(em, at, &source, f)?;
            let target = if text { "str" } else { "[u8]" };
            format!("::core::convert::AsRef::<{target}>::as_ref(&{source})")
        }
        _ => return Err(unsupported(rule, value, category)),
    };
    em.out.line(format!("let {source}: {ty} = {expr};"));
    Ok(source)
}

/// Bind a regular-expression operand to a new `&str` local.
/// A literal pattern is compiled now so a typo fails generation.
pub(crate) fn pattern(
    em: &mut Emitter<'_>,
    text: bool,
    label: &str,
    value: &ValidationValue,
) -> Result<String, Cause> {
    if let ValidationValue::Binary(p) = value {
        let compiled = if text {
            regex::Regex::new(p).map(drop)
        } else {
            regex::bytes::Regex::new(p).map(drop)
        };
        compiled.map_err(|e| Cause::InvalidPattern(e.to_string()))?;
    }
    // the pattern itself is always text
    let at = Subject {
        rule: RuleKind::Pattern,
        label,
    };
    binary(em, true, at, value)
}

/// A size bound, compared against `.len()`.
pub(crate) enum SizeBound {
    /// A `usize` literal.
    Literal(String),
    /// An `i128` expression.
    Computed(String),
}

impl SizeBound {
    /// Condition that holds when `len` violates the bound for `rule`.
    pub fn violated_by(&self, len: &str, rule: RuleKind) -> String {
        let op = if rule == RuleKind::MinSize { "<" } else { ">" };
        match self {
            Self::Literal(n) => format!("{len} {op} {n}"),
            Self::Computed(e) => format!("({len} as i128) {op} {e}"),
        }
    }
}

pub(crate) fn size(
    em: &mut Emitter<'_>,
    at: Subject<'_>,
    value: &ValidationValue,
    category: &'static str,
) -> Result<SizeBound, Cause> {
    let rule = at.rule;
    match value {
        ValidationValue::Int(v) => usize::try_from(*v)
            .map(|n| SizeBound::Literal(format!("{n}_usize")))
            .map_err(|_| Cause::LiteralOutOfRange {
                literal: v.to_string(),
                ty: "usize",
            }),
        ValidationValue::FieldReference(name) => {
            let (read, kind) = sibling(em, name)?;
            match kind {
                FieldKind::Numeric(n) if !n.is_float() => {
                    Ok(SizeBound::Computed(format!("(({read}) as i128)")))
                }
                _ => Err(unsupported(rule, value, category)),
            }
        }
        ValidationValue::Function(f) => {
            let source = em.ids.allocate("_src");
            call(em, at, &source, f)?;
            Ok(SizeBound::Computed(format!("(({source}) as i128)")))
        }
        _ => Err(unsupported(rule, value, category)),
    }
}

/// Render a function argument; nested calls are bound first.
fn argument(em: &mut Emitter<'_>, at: Subject<'_>, value: &ValidationValue) -> Result<String, Cause> {
    Ok(match value {
        ValidationValue::Int(v) => v.to_string(),
        ValidationValue::Double(v) if v.is_finite() => format!("{v:?}"),
        ValidationValue::Double(v) => float_literal(Numeric::F64, *v)?,
        ValidationValue::Bool(b) => b.to_string(),
        ValidationValue::Binary(s) => naming::str_literal(s),
        ValidationValue::FieldReference(name) => sibling(em, name)?.0,
        ValidationValue::Function(f) => {
            let source = em.ids.allocate("_src");
            call(em, at, &source, f)?;
            source
        }
    })
}

/// `format!` verbs render through `Display`, which byte strings lack.
fn check_format_arguments(em: &Emitter<'_>, function: &ToolFunction) -> Result<(), Cause> {
    for arg in function.arguments.iter().skip(1) {
        let ValidationValue::FieldReference(name) = arg else {
            continue;
        };
        if let (_, FieldKind::Bytes) = sibling(em, name)? {
            return Err(Cause::FunctionArity {
                name: function.name.clone(),
                reason: format!("cannot format bytes field `{name}`"),
            });
        }
    }
    Ok(())
}

/// Compile a function call into statements binding `source`.
/// A call that cannot produce a value fails validation with `at`.
pub(crate) fn call(
    em: &mut Emitter<'_>,
    at: Subject<'_>,
    source: &str,
    function: &ToolFunction,
) -> Result<(), Cause> {
    if function.name == "sprintf" {
        check_format_arguments(em, function)?;
    }
    let args = function
        .arguments
        .iter()
        .map(|arg| argument(em, at, arg))
        .collect::<Result<Vec<_>, _>>()?;

    let env = em.env;
    let builtin: Option<&dyn FunctionTemplate> = functions::builtin(&function.name);
    let template = builtin
        .or_else(|| env.lookup_function(&function.name))
        .ok_or_else(|| Cause::UnknownFunction(function.name.clone()))?;

    let call = FunctionCall {
        source,
        package: env.package,
        file: env.file,
        message: &em.message_path,
        function,
        args: &args,
        runtime: env.runtime,
        rule: at.rule,
        label: at.label,
    };
    let code = template.render(&call)?;
    if builtin.is_none() {
        tracing::trace!(function = %function.name, source, "rendered custom function");
        match template.imports(&call) {
            Ok(imports) => em.imports.extend(imports),
            Err(err) => {
                tracing::warn!(function = %function.name, %err, "failed to render imports, skipping");
            }
        }
    }
    em.out.fragment(&code);
    Ok(())
}
