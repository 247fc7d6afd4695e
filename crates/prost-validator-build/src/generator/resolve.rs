use std::collections::HashMap;

use prost_reflect::{DescriptorPool, EnumDescriptor, EnumValueDescriptor};

use crate::error::Cause;

use super::naming;

/// Name-indexed view of every enum in the descriptor pool, built once per
/// generator and shared read-only by all files it compiles.
#[derive(Debug, Default)]
pub(crate) struct SymbolIndex {
    enums: HashMap<String, EnumDescriptor>,
}

/// A resolved enum constant.
#[derive(Debug, Clone)]
pub(crate) struct EnumConstant {
    pub enum_type: EnumDescriptor,
    pub value: EnumValueDescriptor,
}

impl EnumConstant {
    /// The constant as an `i32` expression, seen from the module of `package`.
    pub fn render(&self, package: &str) -> String {
        format!(
            "{}::{} as i32",
            naming::type_path(package, self.enum_type.full_name()),
            naming::enum_variant(self.enum_type.name(), self.value.name())
        )
    }
}

impl SymbolIndex {
    pub fn build(pool: &DescriptorPool) -> Self {
        let enums = pool
            .all_enums()
            .map(|e| (e.full_name().to_string(), e))
            .collect();
        Self { enums }
    }

    /// Resolve a dotted enum constant such as `Status.ACTIVE`,
    /// `common.Status.ACTIVE` or `example.common.Status.ACTIVE`.
    ///
    /// The enum part is looked up following protobuf scoping: first inside
    /// `package`, then each enclosing package, then as a fully-qualified name.
    pub fn resolve_enum(&self, identifier: &str, package: &str) -> Result<EnumConstant, Cause> {
        let segments: Vec<&str> = identifier.split('.').collect();
        if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
            return Err(Cause::MalformedEnumReference(identifier.to_string()));
        }
        let (value_name, enum_path) = match segments.split_last() {
            Some((value, path)) => (*value, path.join(".")),
            None => return Err(Cause::MalformedEnumReference(identifier.to_string())),
        };

        let unresolved = || Cause::UnresolvedEnum {
            identifier: identifier.to_string(),
            package: if segments.len() == 2 {
                package.to_string()
            } else {
                segments[..segments.len() - 2].join(".")
            },
        };

        let enum_type = scopes(package)
            .find_map(|scope| {
                let candidate = if scope.is_empty() {
                    enum_path.clone()
                } else {
                    format!("{scope}.{enum_path}")
                };
                self.enums.get(&candidate)
            })
            .ok_or_else(unresolved)?;

        let value = enum_type
            .get_value_by_name(value_name)
            .ok_or_else(unresolved)?;

        Ok(EnumConstant {
            enum_type: enum_type.clone(),
            value,
        })
    }
}

/// `a.b.c`, `a.b`, `a`, then the root scope.
fn scopes(package: &str) -> impl Iterator<Item = &str> {
    let mut next = Some(package);
    std::iter::from_fn(move || {
        let current = next?;
        next = if current.is_empty() {
            None
        } else {
            Some(current.rfind('.').map_or("", |i| &current[..i]))
        };
        Some(current)
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use prost_reflect::DescriptorPool;
    use prost_types::{
        EnumDescriptorProto, EnumValueDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    };

    use super::*;

    pub(crate) fn enum_proto(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
        EnumDescriptorProto {
            name: Some(name.to_string()),
            value: values
                .iter()
                .map(|(n, v)| EnumValueDescriptorProto {
                    name: Some((*n).to_string()),
                    number: Some(*v),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn pool() -> DescriptorPool {
        let status = enum_proto(
            "Status",
            &[("STATUS_UNSPECIFIED", 0), ("STATUS_ACTIVE", 1)],
        );
        let common = FileDescriptorProto {
            name: Some("example/common/status.proto".to_string()),
            package: Some("example.common".to_string()),
            syntax: Some("proto3".to_string()),
            enum_type: vec![status],
            ..Default::default()
        };
        let local = FileDescriptorProto {
            name: Some("example/v1/level.proto".to_string()),
            package: Some("example.v1".to_string()),
            syntax: Some("proto3".to_string()),
            enum_type: vec![enum_proto("Level", &[("LOW", 0), ("HIGH", 5)])],
            ..Default::default()
        };
        DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
            file: vec![common, local],
        })
        .expect("descriptor set should be valid")
    }

    #[test]
    fn same_package_and_qualified_spellings_agree() {
        let index = SymbolIndex::build(&pool());
        let short = index
            .resolve_enum("Status.STATUS_ACTIVE", "example.common")
            .expect("same-package lookup");
        let long = index
            .resolve_enum("example.common.Status.STATUS_ACTIVE", "example.common")
            .expect("qualified lookup");
        let relative = index
            .resolve_enum("common.Status.STATUS_ACTIVE", "example.v1")
            .expect("sibling-package lookup");

        assert_eq!(short.value.number(), 1);
        assert_eq!(long.value.number(), short.value.number());
        assert_eq!(relative.value.number(), short.value.number());
    }

    #[test]
    fn rendered_constant_is_relative_to_the_current_module() {
        let index = SymbolIndex::build(&pool());
        let constant = index
            .resolve_enum("common.Status.STATUS_ACTIVE", "example.v1")
            .expect("sibling-package lookup");
        assert_eq!(
            constant.render("example.v1"),
            "super::common::Status::Active as i32"
        );
        let level = index
            .resolve_enum("Level.HIGH", "example.v1")
            .expect("local lookup");
        assert_eq!(level.render("example.v1"), "Level::High as i32");
    }

    #[test]
    fn unknown_values_name_identifier_and_package() {
        let index = SymbolIndex::build(&pool());
        assert_eq!(
            index.resolve_enum("Status.GONE", "example.common").unwrap_err(),
            Cause::UnresolvedEnum {
                identifier: "Status.GONE".to_string(),
                package: "example.common".to_string(),
            }
        );
        assert_eq!(
            index.resolve_enum("other.Status.STATUS_ACTIVE", "example.v1").unwrap_err(),
            Cause::UnresolvedEnum {
                identifier: "other.Status.STATUS_ACTIVE".to_string(),
                package: "other".to_string(),
            }
        );
    }

    #[test]
    fn single_segment_identifiers_are_malformed() {
        let index = SymbolIndex::build(&pool());
        assert_eq!(
            index.resolve_enum("ACTIVE", "example.v1").unwrap_err(),
            Cause::MalformedEnumReference("ACTIVE".to_string())
        );
        assert!(matches!(
            index.resolve_enum("Status..A", "example.v1"),
            Err(Cause::MalformedEnumReference(_))
        ));
    }

    #[test]
    fn scopes_walk_outwards_to_the_root() {
        assert_eq!(scopes("a.b.c").collect::<Vec<_>>(), vec!["a.b.c", "a.b", "a", ""]);
        assert_eq!(scopes("").collect::<Vec<_>>(), vec![""]);
    }
}
