use std::collections::BTreeSet;
use std::sync::Arc;

use prost_reflect::MessageDescriptor;
use prost_validator::RuleKind;

use crate::error::{Cause, CompilationError, Location};
use crate::functions::{FunctionRegistry, FunctionTemplate};
use crate::rules::Rule;

use super::idents::IdentAllocator;
use super::kind::FieldKind;
use super::resolve::SymbolIndex;
use super::value::Subject;
use super::writer::CodeWriter;

/// Read-only inputs shared by every message of one schema file.
#[derive(Clone, Copy)]
pub(crate) struct FileEnv<'g> {
    pub file: &'g str,
    pub package: &'g str,
    pub runtime: &'g str,
    pub symbols: &'g SymbolIndex,
    pub functions: &'g [Arc<dyn FunctionRegistry + Send + Sync>],
}

impl<'g> FileEnv<'g> {
    /// First registered template for `name`.
    pub fn lookup_function(&self, name: &str) -> Option<&'g dyn FunctionTemplate> {
        self.functions.iter().find_map(|registry| registry.lookup(name))
    }
}

/// Per-message compilation state: the identifier scope, the output buffer
/// for the message's procedure, and the run-wide import accumulator.
pub(crate) struct Emitter<'g> {
    pub env: FileEnv<'g>,
    pub message: MessageDescriptor,
    /// Rust path of the message type, relative to the package module.
    pub message_path: String,
    pub ids: IdentAllocator,
    pub out: CodeWriter,
    pub imports: &'g mut BTreeSet<String>,
}

impl<'g> Emitter<'g> {
    pub fn new(
        env: FileEnv<'g>,
        message: MessageDescriptor,
        message_path: String,
        imports: &'g mut BTreeSet<String>,
    ) -> Self {
        Self {
            env,
            message,
            message_path,
            ids: IdentAllocator::new(),
            out: CodeWriter::new(),
            imports,
        }
    }

    pub fn location(&self, field: Option<&str>, rule: Option<RuleKind>) -> Location {
        Location {
            file: self.env.file.to_string(),
            message: Some(self.message.full_name().to_string()),
            field: field.map(str::to_string),
            rule,
        }
    }

    /// `return Err(rule failure)` with `value` rendered through `Debug`.
    /// `label` is a `&str` expression naming the field.
    pub fn fail(&mut self, label: &str, rule: RuleKind, value: &str) {
        let rt = self.env.runtime;
        self.out.line(format!(
            "return ::core::result::Result::Err({rt}::ValidationError::rule({rt}::RuleKind::{}, {label}, ::std::format!(\"{{:?}}\", {value})));",
            rule.variant_name(),
        ));
    }

    /// `if cond { return Err(rule failure) }`.
    pub fn fail_if(&mut self, cond: &str, label: &str, rule: RuleKind, value: &str) {
        self.out.open(format!("if {cond}"));
        self.fail(label, rule, value);
        self.out.close();
    }

    pub fn finish(self) -> String {
        self.out.finish()
    }
}

/// Which part of a composite field a derived context describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selector {
    Element,
    Key,
    Value,
}

impl Selector {
    fn name(self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Key => "key",
            Self::Value => "value",
        }
    }
}

/// One field occurrence being compiled: a declared field, or a list
/// element, map key or map value derived from one.
#[derive(Debug)]
pub(crate) struct ValidationContext<'r> {
    /// Field path used in generation-time diagnostics, e.g. `tags.element`.
    pub path: String,
    /// Field name as reported at runtime.
    pub name: String,
    /// Expression of type `&str` naming the field in runtime failures.
    pub label: String,
    /// Canonical read of the value, see [`FieldKind::read`].
    pub target: String,
    pub kind: FieldKind,
    pub rules: &'r [Rule],
    pub location: Location,
}

impl<'r> ValidationContext<'r> {
    /// Derived view of a list element, map key or map value, carrying the
    /// composite rule's inner rules.
    pub fn derive<'i>(
        &self,
        selector: Selector,
        target: String,
        label: String,
        rules: &'i [Rule],
    ) -> Result<ValidationContext<'i>, Cause> {
        let kind = match (&self.kind, selector) {
            (FieldKind::List(element), Selector::Element) => (**element).clone(),
            (FieldKind::Map(key, _), Selector::Key) => (**key).clone(),
            (FieldKind::Map(_, value), Selector::Value) => (**value).clone(),
            (kind, selector) => {
                return Err(Cause::UnsupportedKind(format!(
                    "{} fields have no {}",
                    kind.category(),
                    selector.name()
                )));
            }
        };
        let path = format!("{}.{}", self.path, selector.name());
        Ok(ValidationContext {
            location: Location {
                field: Some(path.clone()),
                ..self.location.clone()
            },
            path,
            name: self.name.clone(),
            label,
            target,
            kind,
            rules,
        })
    }

    /// Operands of `rule` report their runtime failures against this field.
    pub fn subject(&self, rule: RuleKind) -> Subject<'_> {
        Subject {
            rule,
            label: &self.label,
        }
    }

    pub fn error(&self, rule: RuleKind, cause: Cause) -> CompilationError {
        cause.at(Location {
            rule: Some(rule),
            ..self.location.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn list_context(rules: &[Rule]) -> ValidationContext<'_> {
        ValidationContext {
            path: "tags".to_string(),
            name: "tags".to_string(),
            label: "\"tags\"".to_string(),
            target: "self.tags".to_string(),
            kind: FieldKind::List(Box::new(FieldKind::String)),
            rules,
            location: Location {
                file: "a.proto".to_string(),
                message: Some("pkg.Msg".to_string()),
                field: Some("tags".to_string()),
                rule: None,
            },
        }
    }

    #[test]
    fn derived_element_inherits_location_and_inner_rules() {
        let inner = vec![Rule::min_size(1)];
        let outer = vec![Rule::element(inner.clone())];
        let parent = list_context(&outer);

        let element = parent
            .derive(
                Selector::Element,
                "_elem2.as_str()".to_string(),
                "&::std::format!(\"tags[{}]\", _idx1)".to_string(),
                &inner,
            )
            .expect("lists have elements");

        assert!(matches!(element.kind, FieldKind::String));
        assert_eq!(element.rules, inner.as_slice());
        assert_eq!(element.location.field.as_deref(), Some("tags.element"));
        assert_eq!(
            element.error(RuleKind::MinSize, Cause::InvalidPattern("x".into())).location.rule,
            Some(RuleKind::MinSize)
        );
    }

    #[test]
    fn lists_have_no_map_keys() {
        let rules = Vec::new();
        let parent = list_context(&rules);
        let err = parent
            .derive(Selector::Key, String::new(), String::new(), &rules)
            .unwrap_err();
        assert_eq!(err, Cause::UnsupportedKind("list fields have no key".to_string()));
    }
}
