use std::sync::LazyLock;

use regex::Regex;

use crate::error::Cause;

use super::FunctionCall;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]*)\s*\}\}").expect("placeholder regex must compile")
});

static IMPORT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(::)?[A-Za-z_][A-Za-z0-9_]*(::([A-Za-z_][A-Za-z0-9_]*|\*))*$")
        .expect("import path regex must compile")
});

/// Substitute `{{placeholder}}`s in a user template.
pub(crate) fn render(name: &str, template: &str, call: &FunctionCall<'_>) -> Result<String, Cause> {
    let malformed = |reason: String| Cause::Template {
        name: name.to_string(),
        reason,
    };

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let literal = &template[last..whole.start()];
        if literal.contains("{{") {
            return Err(malformed("unclosed `{{`".to_string()));
        }
        out.push_str(literal);
        out.push_str(&substitute(key.as_str(), call).map_err(&malformed)?);
        last = whole.end();
    }
    let rest = &template[last..];
    if rest.contains("{{") {
        return Err(malformed("unclosed `{{`".to_string()));
    }
    out.push_str(rest);
    Ok(out)
}

fn substitute(key: &str, call: &FunctionCall<'_>) -> Result<String, String> {
    let value = match key {
        "source" => call.source.to_string(),
        "package" => call.package.to_string(),
        "file" => call.file.to_string(),
        "message" => call.message.to_string(),
        "function" => call.function.name.clone(),
        "args" => call.args.join(", "),
        _ => {
            let Some(index) = key.strip_prefix("arg").and_then(|i| i.parse::<usize>().ok()) else {
                return Err(format!("unknown placeholder `{{{{{key}}}}}`"));
            };
            call.args.get(index).cloned().ok_or_else(|| {
                format!(
                    "placeholder `{{{{{key}}}}}` is out of range, the call has {} argument(s)",
                    call.args.len()
                )
            })?
        }
    };
    Ok(value)
}

/// Parse a rendered import block: one bracketed path per line, e.g.
/// `[crate::helpers::is_upper]` or `"crate::helpers"`.
/// Malformed lines are logged and skipped.
pub(crate) fn parse_imports(name: &str, rendered: &str) -> Vec<String> {
    rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let inner = strip_brackets(line).map(str::trim);
            match inner {
                Some(path) if IMPORT_PATH.is_match(path) => Some(path.to_string()),
                _ => {
                    tracing::warn!(function = name, line, "skipping malformed import line");
                    None
                }
            }
        })
        .collect()
}

fn strip_brackets(line: &str) -> Option<&str> {
    [('[', ']'), ('"', '"'), ('<', '>')]
        .into_iter()
        .find_map(|(open, close)| line.strip_prefix(open)?.strip_suffix(close))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::rules::{ToolFunction, ValidationValue};

    fn call<'a>(function: &'a ToolFunction, args: &'a [String]) -> FunctionCall<'a> {
        FunctionCall {
            source: "_src2",
            package: "example.v1",
            file: "example/v1/person.proto",
            message: "Person",
            function,
            args,
            runtime: "::prost_validator",
            rule: prost_validator::RuleKind::Lt,
            label: "\"age\"",
        }
    }

    #[test]
    fn placeholders_are_substituted() {
        let f = ToolFunction::new("is_upper", vec![ValidationValue::field("name")]);
        let args = vec!["self.name.as_str()".to_string()];
        let out = render(
            "is_upper",
            "let {{source}} = helpers::{{ function }}({{arg0}}); // {{message}} in {{package}} ({{file}}): {{args}}",
            &call(&f, &args),
        )
        .unwrap();
        assert_eq!(
            out,
            "let _src2 = helpers::is_upper(self.name.as_str()); // Person in example.v1 (example/v1/person.proto): self.name.as_str()"
        );
    }

    #[test]
    fn unknown_and_out_of_range_placeholders_are_malformed() {
        let f = ToolFunction::new("f", Vec::new());
        let err = render("f", "let {{source}} = {{nope}};", &call(&f, &[])).unwrap_err();
        assert_eq!(
            err,
            Cause::Template {
                name: "f".to_string(),
                reason: "unknown placeholder `{{nope}}`".to_string(),
            }
        );
        assert!(matches!(
            render("f", "{{arg0}}", &call(&f, &[])),
            Err(Cause::Template { .. })
        ));
    }

    #[test]
    fn unclosed_braces_are_malformed() {
        let f = ToolFunction::new("f", Vec::new());
        assert!(render("f", "let {{source = 1;", &call(&f, &[])).is_err());
        assert!(render("f", "{{source}} {{", &call(&f, &[])).is_err());
    }

    #[test]
    fn plain_braces_pass_through() {
        let f = ToolFunction::new("f", Vec::new());
        assert_eq!(
            render("f", "let {{source}} = { 1 };", &call(&f, &[])).unwrap(),
            "let _src2 = { 1 };"
        );
    }

    #[test]
    fn import_lines_are_unwrapped_and_validated() {
        let imports = parse_imports(
            "f",
            "[crate::helpers::is_upper]\n\n  \"::std::fmt::Write\"  \nnot bracketed\n[has spaces in it]\n<crate::x::*>",
        );
        assert_eq!(
            imports,
            vec!["crate::helpers::is_upper", "::std::fmt::Write", "crate::x::*"]
        );
    }
}
