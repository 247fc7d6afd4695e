use prost_reflect::{EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor};

/// Rust numeric representation of a protobuf scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Numeric {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
}

impl Numeric {
    pub fn rust_type(self) -> &'static str {
        match self {
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// What a field (or a list element, map key or map value) holds.
#[derive(Debug, Clone)]
pub(crate) enum FieldKind {
    Bool,
    Numeric(Numeric),
    String,
    Bytes,
    Enum(EnumDescriptor),
    Message(MessageDescriptor),
    List(Box<FieldKind>),
    Map(Box<FieldKind>, Box<FieldKind>),
}

/// How generated code reaches a value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Access<'a> {
    /// A place holding the stored value, e.g. `self.age`.
    Owned(&'a str),
    /// A binding holding a reference to the stored value, e.g. `_elem2`.
    Borrowed(&'a str),
}

impl FieldKind {
    /// Kind of a single value of protobuf type `kind`.
    pub fn of_value(kind: &Kind) -> Self {
        match kind {
            Kind::Bool => Self::Bool,
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Self::Numeric(Numeric::I32),
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Self::Numeric(Numeric::I64),
            Kind::Uint32 | Kind::Fixed32 => Self::Numeric(Numeric::U32),
            Kind::Uint64 | Kind::Fixed64 => Self::Numeric(Numeric::U64),
            Kind::Float => Self::Numeric(Numeric::F32),
            Kind::Double => Self::Numeric(Numeric::F64),
            Kind::String => Self::String,
            Kind::Bytes => Self::Bytes,
            Kind::Enum(e) => Self::Enum(e.clone()),
            Kind::Message(m) => Self::Message(m.clone()),
        }
    }

    /// Kind of a declared field, including list and map wrappers.
    pub fn of_field(field: &FieldDescriptor) -> Self {
        let kind = field.kind();
        if field.is_map() {
            if let Kind::Message(entry) = &kind {
                return Self::Map(
                    Box::new(Self::of_value(&entry.map_entry_key_field().kind())),
                    Box::new(Self::of_value(&entry.map_entry_value_field().kind())),
                );
            }
        }
        if field.is_list() {
            return Self::List(Box::new(Self::of_value(&kind)));
        }
        Self::of_value(&kind)
    }

    /// Type category named in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Numeric(_) => "numeric",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
            Self::Map(..) => "map",
        }
    }

    /// Expression reading the value in its canonical form: a copy for
    /// bool, numeric and enum (as `i32`) values, `&str` for strings, `&[u8]`
    /// for bytes, and a reference for messages.
    pub fn read(&self, access: Access<'_>) -> String {
        match (self, access) {
            (Self::Bool | Self::Numeric(_) | Self::Enum(_), Access::Owned(place)) => {
                place.to_string()
            }
            (Self::Bool | Self::Numeric(_) | Self::Enum(_), Access::Borrowed(name)) => {
                format!("*{name}")
            }
            (Self::String, Access::Owned(s) | Access::Borrowed(s)) => format!("{s}.as_str()"),
            (Self::Bytes, Access::Owned(s) | Access::Borrowed(s)) => format!("&{s}[..]"),
            (Self::Message(_), Access::Owned(place)) => format!("&{place}"),
            (Self::Message(_) | Self::List(_) | Self::Map(..), Access::Borrowed(name)) => {
                name.to_string()
            }
            (Self::List(_) | Self::Map(..), Access::Owned(place)) => place.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn protobuf_scalars_map_to_rust_numerics() {
        let cases = [
            (Kind::Sint32, "i32"),
            (Kind::Sfixed64, "i64"),
            (Kind::Fixed32, "u32"),
            (Kind::Uint64, "u64"),
            (Kind::Float, "f32"),
            (Kind::Double, "f64"),
        ];
        for (kind, ty) in cases {
            let FieldKind::Numeric(n) = FieldKind::of_value(&kind) else {
                panic!("{kind:?} should be numeric");
            };
            assert_eq!(n.rust_type(), ty);
        }
    }

    #[test]
    fn reads_are_canonical() {
        assert_eq!(FieldKind::Bool.read(Access::Borrowed("_elem1")), "*_elem1");
        assert_eq!(FieldKind::String.read(Access::Owned("self.name")), "self.name.as_str()");
        assert_eq!(FieldKind::Bytes.read(Access::Borrowed("_val2")), "&_val2[..]");
        assert_eq!(
            FieldKind::List(Box::new(FieldKind::String)).read(Access::Owned("self.tags")),
            "self.tags"
        );
    }
}
