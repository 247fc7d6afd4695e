//! Compiles one message into its `impl Validate` block.

use prost_reflect::{FieldDescriptor, MessageDescriptor};
use prost_validator::RuleKind;

use crate::error::{Cause, CompilationError};
use crate::functions;
use crate::rules::{Rule, RuleProvider, ValidationValue};

use super::context::{Emitter, ValidationContext};
use super::kind::{Access, FieldKind};
use super::{naming, rules, value};

/// Emit `impl Validate for <message>`: message-level asserts first, then
/// each field with rules in declaration order. Fields without rules emit
/// nothing.
pub(crate) fn compile_message(
    em: &mut Emitter<'_>,
    provider: &dyn RuleProvider,
) -> Result<(), CompilationError> {
    let rt = em.env.runtime;
    let message = em.message.clone();

    em.out.line(
        "#[allow(unused_variables, unused_comparisons, unused_parens, clippy::all, clippy::pedantic)]",
    );
    em.out.open(format!("impl {rt}::Validate for {}", em.message_path));
    em.out.open(format!(
        "fn validate(&self) -> ::core::result::Result<(), {rt}::ValidationError>"
    ));

    process_message_rules(em, &message, provider.message_rules(&message))?;
    for field in message.fields() {
        process_field(em, &field, provider.field_rules(&field))?;
    }

    em.out.line("::core::result::Result::Ok(())");
    em.out.close();
    em.out.close();
    Ok(())
}

fn process_message_rules(
    em: &mut Emitter<'_>,
    message: &MessageDescriptor,
    rules: &[Rule],
) -> Result<(), CompilationError> {
    for rule in rules {
        let at = |cause: Cause| cause.at(em.location(None, Some(rule.kind)));
        if rule.kind != RuleKind::Assert {
            return Err(at(Cause::UnsupportedRule {
                rule: rule.kind,
                category: "message",
            }));
        }
        let Some(ValidationValue::Function(function)) = rule.specified_value() else {
            return Err(at(Cause::UnsupportedValue {
                rule: rule.kind,
                value: rule.specified_value().map_or("value list", ValidationValue::type_name),
                category: "message",
            }));
        };
        if functions::returns_bool(&function.name) == Some(false) {
            return Err(at(Cause::NonBooleanAssert(function.name.clone())));
        }
        let name = em.ids.allocate("_assert");
        let label = naming::str_literal(message.name());
        let subject = value::Subject {
            rule: rule.kind,
            label: &label,
        };
        if let Err(cause) = value::call(em, subject, &name, function) {
            return Err(cause.at(em.location(None, Some(rule.kind))));
        }
        em.fail_if(&format!("!{name}"), &label, rule.kind, &name);
    }
    Ok(())
}

fn process_field(
    em: &mut Emitter<'_>,
    field: &FieldDescriptor,
    rules: &[Rule],
) -> Result<(), CompilationError> {
    if rules.is_empty() {
        return Ok(());
    }
    tracing::trace!(field = field.full_name(), rules = rules.len(), "compiling field");

    let kind = FieldKind::of_field(field);
    let label = naming::str_literal(field.name());
    let oneof = field.containing_oneof().filter(|oneof| !oneof.is_synthetic());

    if rules
        .iter()
        .any(|rule| rule.kind == RuleKind::NotNil && rule.is_enabled())
    {
        if let Some(unset) = unset_condition(em, field, &kind) {
            em.fail_if(
                &unset,
                &label,
                RuleKind::NotNil,
                "::core::option::Option::<()>::None",
            );
        }
    }

    let mut opened = false;
    let target = if let Some(oneof) = &oneof {
        let binding = em.ids.allocate("_oneof");
        em.out.open(format!(
            "if let ::core::option::Option::Some({}({binding})) = &self.{}",
            oneof_variant(em, field),
            naming::to_snake(oneof.name())
        ));
        opened = true;
        kind.read(Access::Borrowed(&binding))
    } else if let FieldKind::Message(_) = kind {
        let binding = em.ids.allocate("_msg");
        em.out.open(format!(
            "if let ::core::option::Option::Some({binding}) = &self.{}",
            naming::to_snake(field.name())
        ));
        opened = true;
        kind.read(Access::Borrowed(&binding))
    } else {
        value::read_field(field, &kind)
    };

    let ctx = ValidationContext {
        path: field.name().to_string(),
        name: field.name().to_string(),
        label,
        target,
        kind,
        rules,
        location: em.location(Some(field.name()), None),
    };
    rules::compile_value(em, &ctx)?;

    if opened {
        em.out.close();
    }
    Ok(())
}

/// Condition that holds when a nilable field is unset. Lists, maps and
/// plain scalars are never nil.
fn unset_condition(em: &Emitter<'_>, field: &FieldDescriptor, kind: &FieldKind) -> Option<String> {
    if let Some(oneof) = field.containing_oneof().filter(|oneof| !oneof.is_synthetic()) {
        return Some(format!(
            "!::core::matches!(self.{}, ::core::option::Option::Some({}(_)))",
            naming::to_snake(oneof.name()),
            oneof_variant(em, field)
        ));
    }
    let nilable = matches!(kind, FieldKind::Message(_)) || value::has_optional_storage(field);
    nilable.then(|| format!("self.{}.is_none()", naming::to_snake(field.name())))
}

/// Path of the oneof enum variant holding `field`.
fn oneof_variant(em: &Emitter<'_>, field: &FieldDescriptor) -> String {
    let oneof = field
        .containing_oneof()
        .map(|oneof| oneof.name().to_string())
        .unwrap_or_default();
    let enum_path = naming::type_path(
        em.env.package,
        &format!("{}.{oneof}", em.message.full_name()),
    );
    format!("{enum_path}::{}", naming::to_upper_camel(field.name()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use prost_reflect::DescriptorPool;
    use prost_types::field_descriptor_proto::Type;
    use prost_types::{DescriptorProto, FileDescriptorProto, FileDescriptorSet, OneofDescriptorProto};

    use super::*;
    use crate::generator::context::FileEnv;
    use crate::generator::resolve::SymbolIndex;
    use crate::generator::rules::tests::{field, typed};
    use crate::rules::RuleSet;

    fn in_oneof(mut proto: prost_types::FieldDescriptorProto, index: i32) -> prost_types::FieldDescriptorProto {
        proto.oneof_index = Some(index);
        proto
    }

    /// `shop.v1.Order` with a plain scalar, a proto3 `optional` string, a
    /// message field and a real oneof.
    fn order() -> MessageDescriptor {
        let item = DescriptorProto {
            name: Some("Item".to_string()),
            field: vec![field("sku", 1, Type::String)],
            ..Default::default()
        };
        let mut note = in_oneof(field("note", 2, Type::String), 1);
        note.proto3_optional = Some(true);
        let order = DescriptorProto {
            name: Some("Order".to_string()),
            field: vec![
                field("id", 1, Type::Int64),
                note,
                typed(field("item", 3, Type::Message), ".shop.v1.Item"),
                in_oneof(field("card", 4, Type::String), 0),
                in_oneof(typed(field("voucher", 5, Type::Message), ".shop.v1.Item"), 0),
            ],
            oneof_decl: vec![
                OneofDescriptorProto {
                    name: Some("payment".to_string()),
                    ..Default::default()
                },
                OneofDescriptorProto {
                    name: Some("_note".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let file = FileDescriptorProto {
            name: Some("shop/v1/order.proto".to_string()),
            package: Some("shop.v1".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![item, order],
            ..Default::default()
        };
        DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
            .expect("fixture should be valid")
            .get_message_by_name("shop.v1.Order")
            .expect("fixture message should exist")
    }

    fn compile(rules: &RuleSet) -> Result<String, CompilationError> {
        let message = order();
        let symbols = SymbolIndex::build(message.parent_pool());
        let mut imports = BTreeSet::new();
        let env = FileEnv {
            file: "shop/v1/order.proto",
            package: "shop.v1",
            runtime: "::rt",
            symbols: &symbols,
            functions: &[],
        };
        let mut em = Emitter::new(env, message, "Order".to_string(), &mut imports);
        compile_message(&mut em, rules)?;
        Ok(em.finish())
    }

    #[test]
    fn fields_without_rules_emit_an_empty_procedure() {
        let out = compile(&RuleSet::new()).unwrap();
        assert_eq!(
            out,
            "#[allow(unused_variables, unused_comparisons, unused_parens, clippy::all, clippy::pedantic)]\n\
             impl ::rt::Validate for Order {\n    \
             fn validate(&self) -> ::core::result::Result<(), ::rt::ValidationError> {\n        \
             ::core::result::Result::Ok(())\n    \
             }\n\
             }\n"
        );
    }

    #[test]
    fn not_nil_guard_precedes_the_nested_call() {
        let rules = RuleSet::new().field("shop.v1.Order.item", vec![Rule::not_nil()]);
        let out = compile(&rules).unwrap();
        let guard = out.find("if self.item.is_none() {").expect("guard emitted");
        let nested = out
            .find("if let ::core::option::Option::Some(_msg1) = &self.item {")
            .expect("nested call emitted");
        assert!(guard < nested);
        assert!(out.contains("::rt::RuleKind::NotNil, \"item\", ::std::format!(\"{:?}\", ::core::option::Option::<()>::None)"));
        assert!(out.contains("::rt::Validate::validate(_msg1)"));
    }

    #[test]
    fn oneof_members_are_checked_when_selected() {
        let rules = RuleSet::new()
            .field("shop.v1.Order.card", vec![Rule::min_size(4)])
            .field("shop.v1.Order.voucher", vec![Rule::not_nil()]);
        let out = compile(&rules).unwrap();
        assert!(out.contains(
            "if let ::core::option::Option::Some(order::Payment::Card(_oneof1)) = &self.payment {"
        ));
        assert!(out.contains("if (_oneof1.as_str()).len() < 4_usize {"));
        assert!(out.contains(
            "if !::core::matches!(self.payment, ::core::option::Option::Some(order::Payment::Voucher(_))) {"
        ));
        assert!(out.contains("::rt::Validate::validate(_oneof2)"));
    }

    #[test]
    fn optional_scalars_read_through_the_getter() {
        let rules = RuleSet::new().field(
            "shop.v1.Order.note",
            vec![Rule::not_nil(), Rule::max_size(10)],
        );
        let out = compile(&rules).unwrap();
        assert!(out.contains("if self.note.is_none() {"));
        assert!(out.contains("if (self.note()).len() > 10_usize {"));
    }

    #[test]
    fn not_nil_on_plain_scalars_is_a_no_op() {
        let rules = RuleSet::new().field("shop.v1.Order.id", vec![Rule::not_nil()]);
        let out = compile(&rules).unwrap();
        assert!(!out.contains("is_none"));
    }

    #[test]
    fn asserts_run_before_field_rules() {
        let rules = RuleSet::new()
            .field("shop.v1.Order.id", vec![Rule::gt(0)])
            .message(
                "shop.v1.Order",
                vec![Rule::assert(crate::rules::ToolFunction::new(
                    "equal",
                    vec![ValidationValue::field("id"), ValidationValue::Int(7)],
                ))],
            );
        let out = compile(&rules).unwrap();
        let assert = out.find("let _assert1 = (self.id) == (7);").expect("assert bound");
        let bound = out.find("if !(self.id > 0_i64) {").expect("field rule emitted");
        assert!(assert < bound);
        assert!(out.contains("if !_assert1 {"));
        assert!(out.contains("::rt::RuleKind::Assert, \"Order\""));
    }

    #[test]
    fn message_level_errors_carry_no_field() {
        let rules = RuleSet::new().message("shop.v1.Order", vec![Rule::gt(0)]);
        let err = compile(&rules).unwrap_err();
        assert_eq!(err.location.message.as_deref(), Some("shop.v1.Order"));
        assert_eq!(err.location.field, None);
        assert_eq!(
            err.cause,
            Cause::UnsupportedRule {
                rule: RuleKind::Gt,
                category: "message",
            }
        );

        let unknown = RuleSet::new().message(
            "shop.v1.Order",
            vec![Rule::assert(crate::rules::ToolFunction::new("nope", Vec::new()))],
        );
        assert_eq!(
            compile(&unknown).unwrap_err().cause,
            Cause::UnknownFunction("nope".to_string())
        );
    }

    #[test]
    fn asserts_reject_non_boolean_built_ins() {
        for name in ["len", "sprintf", "add", "mod", "now_unix_nano"] {
            let rules = RuleSet::new().message(
                "shop.v1.Order",
                vec![Rule::assert(crate::rules::ToolFunction::new(
                    name,
                    vec![ValidationValue::field("id"), ValidationValue::Int(2)],
                ))],
            );
            let err = compile(&rules).unwrap_err();
            assert_eq!(err.cause, Cause::NonBooleanAssert(name.to_string()));
            assert_eq!(err.location.rule, Some(RuleKind::Assert));
        }
    }

    #[test]
    fn zero_divisor_in_an_assert_fails_the_assert() {
        let rules = RuleSet::new().message(
            "shop.v1.Order",
            vec![Rule::assert(crate::rules::ToolFunction::new(
                "equal",
                vec![
                    ValidationValue::call("mod", vec![ValidationValue::Int(10), ValidationValue::field("id")]),
                    ValidationValue::Int(0),
                ],
            ))],
        );
        let out = compile(&rules).unwrap();
        assert!(out.contains(
            "let ::core::option::Option::Some(_src2) = ::rt::runtime::checked_rem(10, self.id) else {\n"
        ));
        assert!(out.contains(
            "::rt::RuleKind::Assert, \"Order\", ::std::format!(\"{:?}\", self.id)));\n"
        ));
        assert!(out.contains("let _assert1 = (_src2) == (0);"));
    }

    #[test]
    fn field_errors_name_the_field() {
        let rules = RuleSet::new().field("shop.v1.Order.id", vec![Rule::specified(RuleKind::Prefix, "x")]);
        let err = compile(&rules).unwrap_err();
        assert_eq!(
            err.to_string(),
            "compilation error in shop/v1/order.proto: message shop.v1.Order, field id, rule prefix: \
             rule `prefix` is not supported for numeric fields"
        );
    }
}
