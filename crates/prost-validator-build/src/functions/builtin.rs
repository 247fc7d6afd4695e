use crate::error::Cause;
use crate::rules::ValidationValue;

use super::{FunctionCall, FunctionTemplate};

/// The built-in function named `name`.
pub(crate) fn lookup(name: &str) -> Option<&'static dyn FunctionTemplate> {
    match name {
        "len" => Some(&Len),
        "sprintf" => Some(&Sprintf),
        "equal" => Some(&BinaryOp { operator: "==" }),
        "mod" => Some(&Remainder),
        "add" => Some(&Add),
        "now_unix_nano" => Some(&NowUnixNano),
        _ => None,
    }
}

/// Whether the built-in `name` yields a `bool`, `None` for user functions.
pub(crate) fn returns_bool(name: &str) -> Option<bool> {
    lookup(name).map(|_| name == "equal")
}

fn arity(call: &FunctionCall<'_>, expected: usize) -> Result<(), Cause> {
    if call.args.len() == expected {
        return Ok(());
    }
    Err(Cause::FunctionArity {
        name: call.function.name.clone(),
        reason: format!("takes {expected} argument(s), got {}", call.args.len()),
    })
}

/// `len(x)`: element count of a list or map, byte length of a string or bytes.
struct Len;

impl FunctionTemplate for Len {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        arity(call, 1)?;
        Ok(format!("let {} = ({}).len();", call.source, call.args[0]))
    }
}

/// `sprintf(format, args...)` with `%v`, `%s`, `%d`, `%f`, `%q`, `%x`, `%X`
/// and `%%` verbs.
struct Sprintf;

impl FunctionTemplate for Sprintf {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        let Some(ValidationValue::Binary(format)) = call.function.arguments.first() else {
            return Err(Cause::FunctionArity {
                name: call.function.name.clone(),
                reason: "expects a string literal format as its first argument".to_string(),
            });
        };
        let (format, verbs) = translate_format(format).map_err(|reason| Cause::FunctionArity {
            name: call.function.name.clone(),
            reason,
        })?;
        let args = &call.args[1..];
        if verbs != args.len() {
            return Err(Cause::FunctionArity {
                name: call.function.name.clone(),
                reason: format!("format has {verbs} verb(s) but {} argument(s)", args.len()),
            });
        }

        let mut out = format!("let {} = ::std::format!({format:?}", call.source);
        for arg in args {
            out.push_str(", ");
            out.push_str(arg);
        }
        out.push_str(");");
        Ok(out)
    }
}

/// Translate printf-style verbs into `format!` syntax.
/// Returns the translated format and the number of arguments it consumes.
fn translate_format(format: &str) -> Result<(String, usize), String> {
    let mut out = String::with_capacity(format.len());
    let mut verbs = 0;
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            '%' => {
                let spec = match chars.next() {
                    Some('v' | 's' | 'd' | 'f') => "{}",
                    Some('q') => "{:?}",
                    Some('x') => "{:x}",
                    Some('X') => "{:X}",
                    Some('%') => {
                        out.push('%');
                        continue;
                    }
                    Some(other) => return Err(format!("does not support verb %{other}")),
                    None => return Err("format ends with a dangling %".to_string()),
                };
                out.push_str(spec);
                verbs += 1;
            }
            c => out.push(c),
        }
    }
    Ok((out, verbs))
}

fn operands<'c>(call: &'c FunctionCall<'_>) -> Result<(&'c str, &'c str), Cause> {
    match call.args {
        [a, b] => Ok((a, b)),
        args => Err(Cause::FunctionArity {
            name: call.function.name.clone(),
            reason: format!("is a binary function, got {} argument(s)", args.len()),
        }),
    }
}

/// `equal(a, b)`.
struct BinaryOp {
    operator: &'static str,
}

impl FunctionTemplate for BinaryOp {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        let (a, b) = operands(call)?;
        Ok(format!("let {} = ({a}) {} ({b});", call.source, self.operator))
    }
}

/// `add(a, b)`, wrapping on integer overflow.
struct Add;

impl FunctionTemplate for Add {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        let (a, b) = operands(call)?;
        Ok(format!("let {} = {}::runtime::add({a}, {b});", call.source, call.runtime))
    }
}

/// `mod(a, b)`. A zero integer divisor fails the rule being checked,
/// reporting the divisor.
struct Remainder;

impl FunctionTemplate for Remainder {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        let (a, b) = operands(call)?;
        let rt = call.runtime;
        Ok(format!(
            "let ::core::option::Option::Some({source}) = {rt}::runtime::checked_rem({a}, {b}) else {{\n    \
             return ::core::result::Result::Err({rt}::ValidationError::rule({rt}::RuleKind::{rule}, {label}, ::std::format!(\"{{:?}}\", {b})));\n\
             }};",
            source = call.source,
            rule = call.rule.variant_name(),
            label = call.label,
        ))
    }
}

/// `now_unix_nano()`, read when the validator runs.
struct NowUnixNano;

impl FunctionTemplate for NowUnixNano {
    fn render(&self, call: &FunctionCall<'_>) -> Result<String, Cause> {
        arity(call, 0)?;
        Ok(format!(
            "let {} = {}::runtime::now_unix_nano();",
            call.source, call.runtime
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::rules::ToolFunction;

    fn render(function: &ToolFunction, args: &[&str]) -> Result<String, Cause> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        let call = FunctionCall {
            source: "_src1",
            package: "example.v1",
            file: "example/v1/person.proto",
            message: "Person",
            function,
            args: &args,
            runtime: "::prost_validator",
            rule: prost_validator::RuleKind::Assert,
            label: "\"Person\"",
        };
        lookup(&function.name)
            .expect("built-in should exist")
            .render(&call)
    }

    #[test]
    fn len_reads_the_argument_length() {
        let f = ToolFunction::new("len", vec![ValidationValue::field("tags")]);
        assert_eq!(render(&f, &["self.tags"]).unwrap(), "let _src1 = (self.tags).len();");
    }

    #[test]
    fn sprintf_translates_verbs() {
        let f = ToolFunction::new(
            "sprintf",
            vec![
                "%s-%d {x} 100%%".into(),
                ValidationValue::field("name"),
                ValidationValue::field("age"),
            ],
        );
        assert_eq!(
            render(&f, &["\"%s-%d {x} 100%%\"", "self.name.as_str()", "self.age"]).unwrap(),
            "let _src1 = ::std::format!(\"{}-{} {{x}} 100%\", self.name.as_str(), self.age);"
        );
    }

    #[test]
    fn sprintf_rejects_mismatched_arguments() {
        let f = ToolFunction::new("sprintf", vec!["%s %s".into(), ValidationValue::field("a")]);
        assert!(matches!(
            render(&f, &["\"%s %s\"", "self.a"]),
            Err(Cause::FunctionArity { .. })
        ));
    }

    #[test]
    fn binary_operators_wrap_operands() {
        let f = ToolFunction::new("equal", vec![ValidationValue::field("age"), 2.into()]);
        assert_eq!(render(&f, &["self.age", "2"]).unwrap(), "let _src1 = (self.age) == (2);");

        let f = ToolFunction::new("equal", vec![1.into()]);
        assert!(render(&f, &["1"]).is_err());
    }

    #[test]
    fn addition_goes_through_the_wrapping_helper() {
        let f = ToolFunction::new("add", vec![ValidationValue::field("low"), 100.into()]);
        assert_eq!(
            render(&f, &["self.low", "100"]).unwrap(),
            "let _src1 = ::prost_validator::runtime::add(self.low, 100);"
        );
        assert!(matches!(
            render(&f, &["self.low"]),
            Err(Cause::FunctionArity { name, .. }) if name == "add"
        ));
    }

    #[test]
    fn zero_divisor_fails_the_enclosing_rule() {
        let f = ToolFunction::new("mod", vec![ValidationValue::field("step"), ValidationValue::field("stride")]);
        assert_eq!(
            render(&f, &["self.step", "self.stride"]).unwrap(),
            "let ::core::option::Option::Some(_src1) = ::prost_validator::runtime::checked_rem(self.step, self.stride) else {\n    \
             return ::core::result::Result::Err(::prost_validator::ValidationError::rule(\
             ::prost_validator::RuleKind::Assert, \"Person\", ::std::format!(\"{:?}\", self.stride)));\n\
             };"
        );
    }

    #[test]
    fn only_equal_yields_a_bool() {
        assert_eq!(returns_bool("equal"), Some(true));
        for name in ["len", "sprintf", "add", "mod", "now_unix_nano"] {
            assert_eq!(returns_bool(name), Some(false), "{name}");
        }
        assert_eq!(returns_bool("is_title"), None);
    }

    #[test]
    fn now_reads_the_runtime_clock() {
        let f = ToolFunction::new("now_unix_nano", Vec::new());
        assert_eq!(
            render(&f, &[]).unwrap(),
            "let _src1 = ::prost_validator::runtime::now_unix_nano();"
        );
    }

    #[test]
    fn unknown_names_are_not_built_in() {
        assert!(lookup("is_upper").is_none());
    }

    proptest! {
        #[test]
        fn plain_text_survives_translation(text in "[a-zA-Z0-9 _.-]{0,32}") {
            prop_assert_eq!(translate_format(&text).unwrap(), (text.clone(), 0));
        }
    }
}
