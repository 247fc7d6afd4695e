use prost_validator::RuleKind;

use crate::error::Cause;
use crate::generator::context::{Emitter, ValidationContext};
use crate::generator::value;
use crate::rules::Rule;

use super::{specified, unsupported};

pub(crate) fn compile_rule(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    rule: &Rule,
) -> Result<(), Cause> {
    match rule.kind {
        RuleKind::Const => {
            let source = value::boolean(em, rule.kind, specified(rule)?)?;
            em.fail_if(
                &format!("{} != {source}", ctx.target),
                &ctx.label,
                rule.kind,
                &ctx.target,
            );
            Ok(())
        }
        RuleKind::NotNil => Ok(()),
        _ => Err(unsupported(rule, ctx)),
    }
}
