use std::collections::BTreeSet;
use std::sync::Arc;

use prost_reflect::{DescriptorPool, FileDescriptor, MessageDescriptor};

use crate::config::GeneratorOption;
use crate::error::Error;
use crate::functions::FunctionRegistry;
use crate::rules::RuleProvider;

mod assembler;
mod builder;
mod context;
mod idents;
mod kind;
mod naming;
mod resolve;
mod rules;
mod value;
mod writer;

use assembler::Assembly;
use context::{Emitter, FileEnv};
use resolve::SymbolIndex;

/// Runtime crate path used when no [`GeneratorOption::RuntimeCrate`] is given.
pub const DEFAULT_RUNTIME_CRATE: &str = "::prost_validator";

/// Compiles the rules attached to a descriptor pool into Rust source.
///
/// The symbol index is built once at construction and shared by every file
/// generated afterwards. Generating a file never mutates the generator.
pub struct Generator {
    pool: DescriptorPool,
    rules: Box<dyn RuleProvider>,
    symbols: SymbolIndex,
    runtime: String,
    functions: Vec<Arc<dyn FunctionRegistry + Send + Sync>>,
    header: bool,
}

/// Generated validators for one schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Output file name: the schema path with `.proto` replaced by `_validate.rs`.
    pub name: String,
    /// Protobuf package of the schema file.
    pub package: String,
    /// Rust source, meant to be `include!`d next to the prost output for
    /// the same package.
    pub content: String,
}

impl Generator {
    /// Create a generator with default options.
    #[must_use]
    pub fn new(pool: DescriptorPool, rules: impl RuleProvider + 'static) -> Self {
        Self::with_options(pool, rules, &[])
    }

    /// Create a generator with the given options.
    #[must_use]
    pub fn with_options(
        pool: DescriptorPool,
        rules: impl RuleProvider + 'static,
        options: &[GeneratorOption],
    ) -> Self {
        let mut runtime = DEFAULT_RUNTIME_CRATE.to_string();
        let mut functions = Vec::new();
        let mut header = true;

        for opt in options {
            match opt {
                GeneratorOption::RuntimeCrate(path) => runtime.clone_from(path),
                GeneratorOption::Functions(registry) => functions.push(Arc::clone(registry)),
                GeneratorOption::Header(enabled) => header = *enabled,
            }
        }

        Self {
            symbols: SymbolIndex::build(&pool),
            pool,
            rules: Box::new(rules),
            runtime,
            functions,
            header,
        }
    }

    /// Generate validators for every message of `file`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Compilation`] on the first rule that cannot be
    /// compiled. No output is produced for the file in that case.
    pub fn generate_file(&self, file: &FileDescriptor) -> Result<GeneratedFile, Error> {
        let package = file.package_name();
        tracing::debug!(file = file.name(), package, "generating validators");

        let env = FileEnv {
            file: file.name(),
            package,
            runtime: &self.runtime,
            symbols: &self.symbols,
            functions: &self.functions,
        };
        let mut imports = BTreeSet::new();
        let mut procedures = Vec::new();
        for message in messages(file) {
            tracing::debug!(message = message.full_name(), "compiling message");
            let path = naming::type_path(package, message.full_name());
            let mut em = Emitter::new(env, message, path, &mut imports);
            builder::compile_message(&mut em, self.rules.as_ref())?;
            procedures.push(em.finish());
        }

        let content = Assembly {
            source: file.name(),
            package,
            runtime: &self.runtime,
            header: self.header,
        }
        .assemble(&procedures, &imports);

        Ok(GeneratedFile {
            name: output_name(file.name()),
            package: package.to_string(),
            content,
        })
    }

    /// Generate validators for the named schema files of the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] for a name missing from the pool, or
    /// the first compilation error.
    pub fn generate_files<I, S>(&self, names: I) -> Result<Vec<GeneratedFile>, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                let file = self
                    .pool
                    .get_file_by_name(name)
                    .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
                self.generate_file(&file)
            })
            .collect()
    }

    /// The descriptor pool this generator reads.
    #[must_use]
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

/// Messages of `file` in declaration order, each followed by its nested
/// messages. Map entry types are skipped.
fn messages(file: &FileDescriptor) -> Vec<MessageDescriptor> {
    fn walk(message: MessageDescriptor, out: &mut Vec<MessageDescriptor>) {
        if message.is_map_entry() {
            return;
        }
        let children: Vec<_> = message.child_messages().collect();
        out.push(message);
        for child in children {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    for message in file.messages() {
        walk(message, &mut out);
    }
    out
}

fn output_name(source: &str) -> String {
    format!("{}_validate.rs", source.strip_suffix(".proto").unwrap_or(source))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use prost_types::field_descriptor_proto::Type;
    use prost_types::{DescriptorProto, FileDescriptorProto, FileDescriptorSet};

    use super::*;
    use crate::config::Config;
    use crate::error::Cause;
    use crate::rules::{Rule, RuleSet, ValidationValue};
    use rules::tests::{field, map_entry, repeated, typed};

    /// `example.v1.Person` with a nested `Address` and a map, in
    /// `example/v1/person.proto`.
    fn pool() -> DescriptorPool {
        let address = DescriptorProto {
            name: Some("Address".to_string()),
            field: vec![field("city", 1, Type::String)],
            ..Default::default()
        };
        let person = DescriptorProto {
            name: Some("Person".to_string()),
            field: vec![
                field("age", 1, Type::Int32),
                typed(field("addr", 2, Type::Message), ".example.v1.Person.Address"),
                repeated(typed(field("attrs", 3, Type::Message), ".example.v1.Person.AttrsEntry")),
                field("name", 4, Type::String),
            ],
            nested_type: vec![
                address,
                map_entry("AttrsEntry", field("key", 1, Type::String), field("value", 2, Type::String)),
            ],
            ..Default::default()
        };
        let file = FileDescriptorProto {
            name: Some("example/v1/person.proto".to_string()),
            package: Some("example.v1".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![person],
            ..Default::default()
        };
        DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: vec![file] })
            .expect("fixture should be valid")
    }

    fn rules() -> RuleSet {
        RuleSet::new()
            .field("example.v1.Person.age", vec![Rule::ge(0), Rule::le(150)])
            .field("example.v1.Person.addr", vec![Rule::not_nil()])
            .field("example.v1.Person.Address.city", vec![Rule::min_size(1)])
    }

    #[test]
    fn nested_messages_follow_their_parent_and_map_entries_are_skipped() {
        let pool = pool();
        let file = pool.get_file_by_name("example/v1/person.proto").unwrap();
        let names: Vec<_> = messages(&file)
            .iter()
            .map(|m| m.full_name().to_string())
            .collect();
        assert_eq!(names, ["example.v1.Person", "example.v1.Person.Address"]);
    }

    #[test]
    fn file_contains_one_procedure_per_message() {
        let generator = Generator::with_options(pool(), rules(), &[GeneratorOption::Header(false)]);
        let files = generator.generate_files(["example/v1/person.proto"]).unwrap();
        assert_eq!(files.len(), 1);
        let file = &files[0];
        assert_eq!(file.name, "example/v1/person_validate.rs");
        assert_eq!(file.package, "example.v1");
        assert!(file.content.starts_with("// proto package: example.v1\n"));

        let person = file
            .content
            .find("impl ::prost_validator::Validate for Person {")
            .expect("Person procedure");
        let address = file
            .content
            .find("impl ::prost_validator::Validate for person::Address {")
            .expect("Address procedure");
        assert!(person < address);
        assert!(file.content.contains("if (self.city.as_str()).len() < 1_usize {"));
    }

    #[test]
    fn output_is_deterministic() {
        let generator = Generator::new(pool(), rules());
        let first = generator.generate_files(["example/v1/person.proto"]).unwrap();
        let second = generator.generate_files(["example/v1/person.proto"]).unwrap();
        assert_eq!(first, second);
        assert!(first[0].content.contains("// source: example/v1/person.proto\n"));
    }

    #[test]
    fn compilation_errors_abort_the_file() {
        let rules = rules().field("example.v1.Person.name", vec![Rule::lt(3)]);
        let generator = Generator::new(pool(), rules);
        let err = generator
            .generate_files(["example/v1/person.proto"])
            .unwrap_err();
        let Error::Compilation(err) = err else {
            panic!("expected a compilation error, got {err:?}");
        };
        assert_eq!(err.location.field.as_deref(), Some("name"));
        assert_eq!(
            err.cause,
            Cause::UnsupportedRule {
                rule: crate::rules::RuleKind::Lt,
                category: "string",
            }
        );
    }

    #[test]
    fn unknown_files_are_reported() {
        let generator = Generator::new(pool(), RuleSet::new());
        let err = generator.generate_files(["missing.proto"]).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(ref name) if name == "missing.proto"));
    }

    #[test]
    fn configured_functions_contribute_imports() {
        let config = Config::from_toml_str(
            r#"
runtime_crate = "crate::rt"

[function.is_title]
template = "let {{source}} = is_title({{arg0}});"
import = "[crate::helpers::is_title]"
"#,
        )
        .unwrap();
        let rules = RuleSet::new().message(
            "example.v1.Person",
            vec![Rule::assert(crate::rules::ToolFunction::new(
                "is_title",
                vec![ValidationValue::field("name")],
            ))],
        );
        let generator = Generator::with_options(pool(), rules, &config.into_options());
        let file = &generator.generate_files(["example/v1/person.proto"]).unwrap()[0];
        assert!(file.content.contains("impl crate::rt::Validate for Person {"));
        assert!(file.content.contains("let _assert1 = is_title(self.name.as_str());"));
        assert!(file
            .content
            .ends_with("#[allow(unused_imports)]\nuse crate::helpers::is_title;\n"));
    }
}
