use prost_validator::RuleKind;

use crate::error::CompilationError;
use crate::generator::context::{Emitter, ValidationContext};

use super::unsupported;

/// Recurse into the nested message's own `validate`, wrapping its failure
/// with this field's label. `skip` suppresses the call.
pub(crate) fn compile(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), CompilationError> {
    let mut skip = false;
    for rule in ctx.rules {
        match rule.kind {
            RuleKind::Skip => skip |= rule.is_enabled(),
            RuleKind::NotNil => {}
            _ => return Err(ctx.error(rule.kind, unsupported(rule, ctx))),
        }
    }

    if skip {
        em.out.line(format!("// skip field {} check", ctx.path));
        return Ok(());
    }

    let rt = em.env.runtime;
    em.out.open(format!(
        "if let ::core::result::Result::Err(err) = {rt}::Validate::validate({})",
        ctx.target
    ));
    em.out.line(format!(
        "return ::core::result::Result::Err({rt}::ValidationError::nested({}, err));",
        ctx.label
    ));
    em.out.close();
    Ok(())
}
