use prost_validator::RuleKind;

use crate::error::{Cause, CompilationError};
use crate::generator::context::{Emitter, Selector, ValidationContext};
use crate::generator::kind::{Access, FieldKind};
use crate::generator::{naming, value};

use super::{compile_value, inner, specified, unsupported};

/// Map rules. prost maps store values inline, so an unset entry value
/// decodes to the message default and `no_sparse` compares against it.
pub(crate) fn compile(
    em: &mut Emitter<'_>,
    ctx: &ValidationContext<'_>,
) -> Result<(), CompilationError> {
    let FieldKind::Map(key_kind, value_kind) = &ctx.kind else {
        return Err(ctx.error(
            RuleKind::MapValue,
            Cause::UnsupportedKind(format!("{} is not a map", ctx.path)),
        ));
    };
    for rule in ctx.rules {
        let at = |cause| ctx.error(rule.kind, cause);
        match rule.kind {
            RuleKind::MinSize | RuleKind::MaxSize => {
                let operand = specified(rule).map_err(at)?;
                let bound = value::size(em, ctx.subject(rule.kind), operand, "map").map_err(at)?;
                let len = format!("({}).len()", ctx.target);
                em.fail_if(&bound.violated_by(&len, rule.kind), &ctx.label, rule.kind, &len);
            }
            RuleKind::NoSparse => {
                if !rule.is_enabled() {
                    continue;
                }
                let FieldKind::Message(message) = value_kind.as_ref() else {
                    return Err(at(Cause::NoSparseOnScalar));
                };
                let path = naming::type_path(em.env.package, message.full_name());
                let key = em.ids.allocate("_key");
                let val = em.ids.allocate("_val");
                em.out.open(format!("for ({key}, {val}) in {}.iter()", ctx.target));
                em.fail_if(
                    &format!("*{val} == <{path} as ::core::default::Default>::default()"),
                    &entry_label(ctx, &key),
                    rule.kind,
                    &key,
                );
                em.out.close();
            }
            RuleKind::MapKey => {
                let rules = inner(rule).map_err(at)?;
                if rules.is_empty() {
                    continue;
                }
                let key = em.ids.allocate("_key");
                let child = ctx
                    .derive(
                        Selector::Key,
                        key_kind.read(Access::Borrowed(&key)),
                        entry_label(ctx, &key),
                        rules,
                    )
                    .map_err(at)?;
                em.out.open(format!("for {key} in {}.keys()", ctx.target));
                compile_value(em, &child)?;
                em.out.close();
            }
            RuleKind::MapValue => {
                let rules = inner(rule).map_err(at)?;
                if rules.is_empty() {
                    continue;
                }
                let key = em.ids.allocate("_key");
                let val = em.ids.allocate("_val");
                let child = ctx
                    .derive(
                        Selector::Value,
                        value_kind.read(Access::Borrowed(&val)),
                        entry_label(ctx, &key),
                        rules,
                    )
                    .map_err(at)?;
                em.out.open(format!("for ({key}, {val}) in {}.iter()", ctx.target));
                compile_value(em, &child)?;
                em.out.close();
            }
            RuleKind::NotNil => {}
            _ => return Err(at(unsupported(rule, ctx))),
        }
    }
    Ok(())
}

/// `field[key]`, with the key rendered through `Debug`.
fn entry_label(ctx: &ValidationContext<'_>, key: &str) -> String {
    format!("&::std::format!(\"{}[{{:?}}]\", {key})", ctx.name)
}
