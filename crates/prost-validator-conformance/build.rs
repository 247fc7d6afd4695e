//! Assembles the fixture schemas as descriptors (no `protoc` needed),
//! generates the prost structs, then the validators for them.

use std::env;
use std::path::PathBuf;

use prost_reflect::DescriptorPool;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};
use prost_validator_build::{Config, Generator, Rule, RuleKind, RuleSet, ToolFunction, ValidationValue};

const CONFIG: &str = "validate.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={CONFIG}");
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let fds = FileDescriptorSet {
        file: vec![common_file(), person_file()],
    };
    let pool = DescriptorPool::from_file_descriptor_set(fds.clone())?;
    prost_build::Config::new().compile_fds(fds)?;

    let config = Config::from_path(CONFIG)?;
    let generator = Generator::with_options(pool, rules(), &config.into_options());
    for file in generator.generate_files(["example/common/status.proto", "example/v1/person.proto"])? {
        let path = out_dir.join(&file.name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, file.content)?;
    }

    Ok(())
}

fn rules() -> RuleSet {
    let field = ValidationValue::field;
    let int = ValidationValue::Int;
    let call = |name: &str, args: Vec<ValidationValue>| ToolFunction::new(name, args);

    RuleSet::new()
        // example.common
        .field("example.common.Badge.status", vec![Rule::r#const("Status.STATUS_ACTIVE")])
        // example.v1.Person
        .field("example.v1.Person.age", vec![Rule::ge(0), Rule::le(150)])
        .field(
            "example.v1.Person.tags",
            vec![Rule::max_size(3), Rule::element(vec![Rule::min_size(1)])],
        )
        .field("example.v1.Person.addr", vec![Rule::not_nil()])
        .field(
            "example.v1.Person.level",
            vec![
                Rule::specified(RuleKind::DefinedOnly, true),
                Rule::range(RuleKind::NotIn, vec!["Level.LEVEL_UNSPECIFIED".into()]),
            ],
        )
        .field("example.v1.Person.token", vec![Rule::min_size(2), Rule::max_size(4)])
        .field(
            "example.v1.Person.scores",
            vec![
                Rule::map_key(vec![Rule::min_size(1)]),
                Rule::map_value(vec![Rule::ge(0)]),
            ],
        )
        .field(
            "example.v1.Person.name",
            vec![Rule::specified(RuleKind::Pattern, "^[A-Z][a-z]*$")],
        )
        .field(
            "example.v1.Person.code",
            vec![Rule::range(RuleKind::In, vec![int(1), int(2), int(3)])],
        )
        .field(
            "example.v1.Person.blocked",
            vec![Rule::range(RuleKind::NotIn, vec![int(1), int(2), int(3)])],
        )
        .field("example.v1.Person.history", vec![Rule::element(vec![Rule::not_nil()])])
        .field(
            "example.v1.Person.offices",
            vec![
                Rule::specified(RuleKind::NoSparse, true),
                Rule::map_value(vec![Rule::not_nil()]),
            ],
        )
        .field("example.v1.Person.nickname", vec![Rule::not_nil(), Rule::max_size(8)])
        .field("example.v1.Person.email", vec![Rule::specified(RuleKind::Contains, "@")])
        .message(
            "example.v1.Person",
            vec![Rule::assert(call("not_reserved", vec![field("name")]))],
        )
        // example.v1.Address
        .field("example.v1.Address.city", vec![Rule::min_size(1)])
        .field(
            "example.v1.Address.zip",
            vec![Rule::specified(RuleKind::Prefix, "Z"), Rule::max_size(6)],
        )
        // example.v1.Envelope
        .field("example.v1.Envelope.to", vec![Rule::not_nil()])
        // example.v1.Membership
        .field(
            "example.v1.Membership.status",
            vec![Rule::r#const("example.common.Status.STATUS_ACTIVE")],
        )
        .field(
            "example.v1.Membership.tier",
            vec![Rule::range(RuleKind::In, vec!["Level.LEVEL_LOW".into(), int(2)])],
        )
        .field("example.v1.Membership.badge", vec![Rule::specified(RuleKind::Skip, true)])
        // example.v1.Range
        .field("example.v1.Range.high", vec![Rule::gt(field("low"))])
        .field(
            "example.v1.Range.step",
            vec![Rule::lt(call("add", vec![field("low"), int(100)]))],
        )
        .field(
            "example.v1.Range.samples",
            vec![Rule::max_size(field("step"))],
        )
        .message(
            "example.v1.Range",
            vec![Rule::assert(call(
                "equal",
                vec![
                    ValidationValue::Function(call("mod", vec![field("step"), field("stride")])),
                    int(0),
                ],
            ))],
        )
        // example.v1.Greeting
        .field(
            "example.v1.Greeting.text",
            vec![Rule::r#const(call(
                "sprintf",
                vec!["hello %s".into(), field("name")],
            ))],
        )
        .field("example.v1.Greeting.score", vec![Rule::r#const(0.5)])
        .field("example.v1.Greeting.flag", vec![Rule::r#const(field("confirmed"))])
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, ty)
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

fn in_oneof(field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        oneof_index: Some(index),
        ..field
    }
}

fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

fn map_entry(name: &str, key: FieldDescriptorProto, value: FieldDescriptorProto) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: vec![key, value],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).to_string()),
                number: Some(*number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

/// `example/common/status.proto`
fn common_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("example/common/status.proto".to_string()),
        package: Some("example.common".to_string()),
        syntax: Some("proto3".to_string()),
        enum_type: vec![enumeration(
            "Status",
            &[("STATUS_UNSPECIFIED", 0), ("STATUS_ACTIVE", 1), ("STATUS_BANNED", 2)],
        )],
        message_type: vec![message(
            "Badge",
            vec![typed("status", 1, Type::Enum, ".example.common.Status")],
        )],
        ..Default::default()
    }
}

/// `example/v1/person.proto`, importing `example/common/status.proto`.
fn person_file() -> FileDescriptorProto {
    let nickname = FieldDescriptorProto {
        proto3_optional: Some(true),
        ..in_oneof(scalar("nickname", 13, Type::String), 1)
    };
    let person = DescriptorProto {
        field: vec![
            scalar("age", 1, Type::Int32),
            repeated(scalar("tags", 2, Type::String)),
            typed("addr", 3, Type::Message, ".example.v1.Address"),
            typed("level", 4, Type::Enum, ".example.v1.Level"),
            scalar("token", 5, Type::Bytes),
            repeated(typed("scores", 6, Type::Message, ".example.v1.Person.ScoresEntry")),
            scalar("name", 7, Type::String),
            scalar("code", 8, Type::Int32),
            scalar("blocked", 9, Type::Int32),
            repeated(typed("history", 10, Type::Message, ".example.v1.Address")),
            repeated(typed("offices", 11, Type::Message, ".example.v1.Person.OfficesEntry")),
            in_oneof(scalar("email", 12, Type::String), 0),
            nickname,
            in_oneof(typed("mailing", 14, Type::Message, ".example.v1.Address"), 0),
        ],
        nested_type: vec![
            map_entry(
                "ScoresEntry",
                scalar("key", 1, Type::String),
                scalar("value", 2, Type::Int32),
            ),
            map_entry(
                "OfficesEntry",
                scalar("key", 1, Type::String),
                typed("value", 2, Type::Message, ".example.v1.Address"),
            ),
        ],
        oneof_decl: vec![oneof("contact"), oneof("_nickname")],
        ..message("Person", Vec::new())
    };

    FileDescriptorProto {
        name: Some("example/v1/person.proto".to_string()),
        package: Some("example.v1".to_string()),
        dependency: vec!["example/common/status.proto".to_string()],
        syntax: Some("proto3".to_string()),
        enum_type: vec![enumeration(
            "Level",
            &[("LEVEL_UNSPECIFIED", 0), ("LEVEL_LOW", 1), ("LEVEL_HIGH", 2)],
        )],
        message_type: vec![
            message(
                "Address",
                vec![scalar("city", 1, Type::String), scalar("zip", 2, Type::String)],
            ),
            person,
            DescriptorProto {
                oneof_decl: vec![oneof("target")],
                ..message(
                    "Envelope",
                    vec![
                        in_oneof(typed("to", 1, Type::Message, ".example.v1.Address"), 0),
                        in_oneof(scalar("note", 2, Type::String), 0),
                    ],
                )
            },
            message(
                "Membership",
                vec![
                    typed("status", 1, Type::Enum, ".example.common.Status"),
                    typed("tier", 2, Type::Enum, ".example.v1.Level"),
                    typed("badge", 3, Type::Message, ".example.common.Badge"),
                ],
            ),
            message(
                "Range",
                vec![
                    scalar("low", 1, Type::Int64),
                    scalar("high", 2, Type::Int64),
                    scalar("step", 3, Type::Int64),
                    repeated(scalar("samples", 4, Type::Double)),
                    scalar("stride", 5, Type::Int64),
                ],
            ),
            message(
                "Greeting",
                vec![
                    scalar("name", 1, Type::String),
                    scalar("text", 2, Type::String),
                    scalar("score", 3, Type::Float),
                    scalar("flag", 4, Type::Bool),
                    scalar("confirmed", 5, Type::Bool),
                ],
            ),
        ],
        ..Default::default()
    }
}
