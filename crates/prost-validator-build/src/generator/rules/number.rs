use prost_validator::RuleKind;

use crate::error::Cause;
use crate::generator::context::{Emitter, ValidationContext};
use crate::generator::kind::FieldKind;
use crate::generator::value;
use crate::rules::Rule;

use super::{membership, range, specified, unsupported};

/// Numeric rules. Operands are cast to the field's own type before the
/// comparison; bounds are written as negated comparisons so NaN fails them.
pub(crate) fn compile_rule(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    rule: &Rule,
) -> Result<(), Cause> {
    let FieldKind::Numeric(ty) = &ctx.kind else {
        return Err(unsupported(rule, ctx));
    };
    let ty = *ty;
    let cond = match rule.kind {
        RuleKind::Const => {
            let source = value::numeric(em, ty, ctx.subject(rule.kind), specified(rule)?)?;
            format!("{} != {source}", ctx.target)
        }
        RuleKind::Lt | RuleKind::Le | RuleKind::Gt | RuleKind::Ge => {
            let op = match rule.kind {
                RuleKind::Lt => "<",
                RuleKind::Le => "<=",
                RuleKind::Gt => ">",
                _ => ">=",
            };
            let source = value::numeric(em, ty, ctx.subject(rule.kind), specified(rule)?)?;
            format!("!({} {op} {source})", ctx.target)
        }
        RuleKind::In | RuleKind::NotIn => {
            let items = range(rule)?
                .iter()
                .map(|v| value::numeric(em, ty, ctx.subject(rule.kind), v))
                .collect::<Result<Vec<_>, _>>()?;
            membership(em, ctx, rule.kind, ty.rust_type(), &items);
            return Ok(());
        }
        RuleKind::NotNil => return Ok(()),
        _ => return Err(unsupported(rule, ctx)),
    };
    em.fail_if(&cond, &ctx.label, rule.kind, &ctx.target);
    Ok(())
}
