use prost_reflect::EnumDescriptor;
use prost_validator::RuleKind;

use crate::error::Cause;
use crate::generator::context::{Emitter, ValidationContext};
use crate::generator::kind::{FieldKind, Numeric};
use crate::generator::{naming, value};
use crate::rules::{Rule, ValidationValue};

use super::{membership, range, specified, unsupported};

/// Enum fields are compared on their raw `i32` value.
pub(crate) fn compile_rule(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    rule: &Rule,
) -> Result<(), Cause> {
    let FieldKind::Enum(enum_type) = &ctx.kind else {
        return Err(unsupported(rule, ctx));
    };
    match rule.kind {
        RuleKind::Const => {
            let source = operand(em, ctx, enum_type, rule.kind, specified(rule)?)?;
            em.fail_if(
                &format!("{} != {source}", ctx.target),
                &ctx.label,
                rule.kind,
                &ctx.target,
            );
        }
        RuleKind::DefinedOnly => {
            if !rule.is_enabled() {
                return Ok(());
            }
            let path = naming::type_path(em.env.package, enum_type.full_name());
            em.fail_if(
                &format!(
                    "<{path} as ::core::convert::TryFrom<i32>>::try_from({}).is_err()",
                    ctx.target
                ),
                &ctx.label,
                rule.kind,
                &ctx.target,
            );
        }
        RuleKind::In | RuleKind::NotIn => {
            let items = range(rule)?
                .iter()
                .map(|v| operand(em, ctx, enum_type, rule.kind, v))
                .collect::<Result<Vec<_>, _>>()?;
            membership(em, ctx, rule.kind, "i32", &items);
        }
        RuleKind::NotNil => {}
        _ => return Err(unsupported(rule, ctx)),
    }
    Ok(())
}

/// A dotted identifier resolves to a constant of the field's own enum;
/// anything else is read as an `i32` the way numeric operands are.
fn operand(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    enum_type: &EnumDescriptor,
    rule: RuleKind,
    value: &ValidationValue,
) -> Result<String, Cause> {
    match value {
        ValidationValue::Binary(identifier) => {
            let package = em.env.package;
            let constant = em.env.symbols.resolve_enum(identifier, package)?;
            if constant.enum_type.full_name() != enum_type.full_name() {
                return Err(Cause::EnumTypeMismatch {
                    identifier: identifier.clone(),
                    expected: enum_type.full_name().to_string(),
                    found: constant.enum_type.full_name().to_string(),
                });
            }
            Ok(constant.render(package))
        }
        ValidationValue::Int(_) | ValidationValue::FieldReference(_) | ValidationValue::Function(_) => {
            value::numeric(em, Numeric::I32, ctx.subject(rule), value)
        }
        _ => Err(Cause::UnsupportedValue {
            rule,
            value: value.type_name(),
            category: "enum",
        }),
    }
}
