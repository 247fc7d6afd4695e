pub(crate) mod bool;
pub(crate) mod bytes;
pub(crate) mod enum_rules;
pub(crate) mod map_rules;
pub(crate) mod message;
pub(crate) mod number;
pub(crate) mod repeated;

use prost_validator::RuleKind;

use crate::error::{Cause, CompilationError};
use crate::rules::{Rule, RuleOperand, ValidationValue};

use super::context::{Emitter, ValidationContext};
use super::kind::FieldKind;

/// Compile every rule of `ctx`, dispatching on the value's kind.
/// Derived contexts recurse through here.
pub(crate) fn compile_value(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), CompilationError> {
    match &ctx.kind {
        FieldKind::Bool => each_rule(em, ctx, self::bool::compile_rule),
        FieldKind::Numeric(_) => each_rule(em, ctx, number::compile_rule),
        FieldKind::String | FieldKind::Bytes => each_rule(em, ctx, bytes::compile_rule),
        FieldKind::Enum(_) => each_rule(em, ctx, enum_rules::compile_rule),
        FieldKind::Message(_) => message::compile(em, ctx),
        FieldKind::List(_) => repeated::compile(em, ctx),
        FieldKind::Map(..) => map_rules::compile(em, ctx),
    }
}

/// Run a single-rule compiler over every rule, in declaration order.
fn each_rule(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    compile_rule: fn(&mut Emitter<'_>, &ValidationContext<'_>, &Rule) -> Result<(), Cause>,
) -> Result<(), CompilationError> {
    for rule in ctx.rules {
        compile_rule(em, ctx, rule).map_err(|cause| ctx.error(rule.kind, cause))?;
    }
    Ok(())
}

/// The single operand of `rule`.
pub(crate) fn specified(rule: &Rule) -> Result<&ValidationValue, Cause> {
    match &rule.operand {
        RuleOperand::Specified(value) => Ok(value),
        _ => Err(Cause::MissingOperand {
            rule: rule.kind,
            expected: "a single value",
        }),
    }
}

/// The value list of an `in` / `not_in` rule.
pub(crate) fn range(rule: &Rule) -> Result<&[ValidationValue], Cause> {
    match &rule.operand {
        RuleOperand::Range(values) => Ok(values),
        _ => Err(Cause::MissingOperand {
            rule: rule.kind,
            expected: "a list of values",
        }),
    }
}

/// The inner rules of an `element` / `map_key` / `map_value` rule.
pub(crate) fn inner(rule: &Rule) -> Result<&[Rule], Cause> {
    match &rule.operand {
        RuleOperand::Inner(rules) => Ok(rules),
        _ => Err(Cause::MissingOperand {
            rule: rule.kind,
            expected: "inner rules",
        }),
    }
}

pub(crate) fn unsupported(rule: &Rule, ctx: &ValidationContext<'_>) -> Cause {
    Cause::UnsupportedRule {
        rule: rule.kind,
        category: ctx.kind.category(),
    }
}

/// Bind `items` to an array local and check `ctx.target` against it.
/// An empty `in` set rejects every value; an empty `not_in` set accepts all.
pub(crate) fn membership(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    kind: RuleKind,
    element_type: &str,
    items: &[String],
) {
    let source = em.ids.allocate("_src");
    em.out.line(format!(
        "let {source}: [{element_type}; {}] = [{}];",
        items.len(),
        items.join(", ")
    ));
    let test = format!("{source}.contains(&({}))", ctx.target);
    if kind == RuleKind::In {
        let exist = em.ids.allocate("_exist");
        em.out.line(format!("let {exist} = {test};"));
        em.fail_if(&format!("!{exist}"), &ctx.label, kind, &ctx.target);
    } else {
        em.fail_if(&test, &ctx.label, kind, &ctx.target);
    }
}
