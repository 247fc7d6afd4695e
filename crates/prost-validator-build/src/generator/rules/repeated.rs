use prost_validator::RuleKind;

use crate::error::{Cause, CompilationError};
use crate::generator::context::{Emitter, Selector, ValidationContext};
use crate::generator::kind::{Access, FieldKind};
use crate::generator::value;

use super::{compile_value, inner, specified, unsupported};

pub(crate) fn compile(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), CompilationError> {
    let FieldKind::List(element) = &ctx.kind else {
        return Err(ctx.error(RuleKind::Element, unsupported_kind(ctx)));
    };
    for rule in ctx.rules {
        let at = |cause| ctx.error(rule.kind, cause);
        match rule.kind {
            RuleKind::MinSize | RuleKind::MaxSize => {
                let operand = specified(rule).map_err(at)?;
                let bound = value::size(em, ctx.subject(rule.kind), operand, "list").map_err(at)?;
                let len = format!("({}).len()", ctx.target);
                em.fail_if(&bound.violated_by(&len, rule.kind), &ctx.label, rule.kind, &len);
            }
            RuleKind::Element => {
                let rules = inner(rule).map_err(at)?;
                if rules.is_empty() {
                    continue;
                }
                let idx = em.ids.allocate("_idx");
                let elem = em.ids.allocate("_elem");
                let child = ctx
                    .derive(
                        Selector::Element,
                        element.read(Access::Borrowed(&elem)),
                        format!("&::std::format!(\"{}[{{}}]\", {idx})", ctx.name),
                        rules,
                    )
                    .map_err(at)?;
                em.out.open(format!(
                    "for ({idx}, {elem}) in {}.iter().enumerate()",
                    ctx.target
                ));
                compile_value(em, &child)?;
                em.out.close();
            }
            RuleKind::NotNil => {}
            _ => return Err(at(unsupported(rule, ctx))),
        }
    }
    Ok(())
}

fn unsupported_kind(ctx: &ValidationContext<'_>) -> Cause {
    Cause::UnsupportedKind(format!("{} is not a list", ctx.path))
}
