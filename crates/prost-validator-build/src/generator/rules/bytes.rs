//! Rules shared by string and bytes fields. Strings are compared as `&str`,
//! bytes as `&[u8]`; sizes are byte lengths for both.

use prost_validator::RuleKind;

use crate::error::Cause;
use crate::generator::context::{Emitter, ValidationContext};
use crate::generator::kind::FieldKind;
use crate::generator::value;
use crate::rules::Rule;

use super::{membership, range, specified, unsupported};

pub(crate) fn compile_rule(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
    rule: &Rule,
) -> Result<(), Cause> {
    let text = match ctx.kind {
        FieldKind::String => true,
        FieldKind::Bytes => false,
        _ => return Err(unsupported(rule, ctx)),
    };
    let category = ctx.kind.category();
    let rt = em.env.runtime;
    let target = &ctx.target;

    let cond = match rule.kind {
        RuleKind::Const => {
            let source = value::binary(em, text, ctx.subject(rule.kind), specified(rule)?)?;
            format!("{target} != {source}")
        }
        RuleKind::Prefix => {
            let source = value::binary(em, text, ctx.subject(rule.kind), specified(rule)?)?;
            format!("!({target}).starts_with({source})")
        }
        RuleKind::Suffix => {
            let source = value::binary(em, text, ctx.subject(rule.kind), specified(rule)?)?;
            format!("!({target}).ends_with({source})")
        }
        RuleKind::Contains | RuleKind::NotContains => {
            let source = value::binary(em, text, ctx.subject(rule.kind), specified(rule)?)?;
            let test = if text {
                format!("({target}).contains({source})")
            } else {
                format!("{rt}::runtime::contains_bytes({target}, {source})")
            };
            if rule.kind == RuleKind::Contains {
                format!("!{test}")
            } else {
                test
            }
        }
        RuleKind::Pattern => {
            let source = value::pattern(em, text, &ctx.label, specified(rule)?)?;
            let matcher = if text { "matches_str" } else { "matches_bytes" };
            format!("!{rt}::runtime::{matcher}({source}, {target})")
        }
        RuleKind::MinSize | RuleKind::MaxSize => {
            let bound = value::size(em, ctx.subject(rule.kind), specified(rule)?, category)?;
            let len = format!("({target}).len()");
            em.fail_if(&bound.violated_by(&len, rule.kind), &ctx.label, rule.kind, &len);
            return Ok(());
        }
        RuleKind::In | RuleKind::NotIn => {
            let items = range(rule)?
                .iter()
                .map(|v| value::binary(em, text, ctx.subject(rule.kind), v))
                .collect::<Result<Vec<_>, _>>()?;
            let element_type = if text { "&str" } else { "&[u8]" };
            membership(em, ctx, rule.kind, element_type, &items);
            return Ok(());
        }
        RuleKind::NotNil => return Ok(()),
        _ => return Err(unsupported(rule, ctx)),
    };
    em.fail_if(&cond, &ctx.label, rule.kind, target);
    Ok(())
}
