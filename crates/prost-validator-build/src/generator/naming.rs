//! Rust identifiers and paths for protobuf names, following the conventions
//! `prost-build` uses so emitted code lines up with the generated structs.

/// Split an identifier into words on separators and case boundaries.
fn words(s: &str) -> Vec<&str> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Boundary,
        Lowercase,
        Uppercase,
    }

    let mut out = Vec::new();
    for word in s.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = word.char_indices().peekable();
        let mut init = 0;
        let mut mode = Mode::Boundary;
        while let Some((i, c)) = chars.next() {
            let Some(&(next_i, next)) = chars.peek() else {
                out.push(&word[init..]);
                break;
            };
            let next_mode = if c.is_lowercase() {
                Mode::Lowercase
            } else if c.is_uppercase() {
                Mode::Uppercase
            } else {
                mode
            };
            if next_mode == Mode::Lowercase && next.is_uppercase() {
                out.push(&word[init..next_i]);
                init = next_i;
                mode = Mode::Boundary;
            } else if mode == Mode::Uppercase && c.is_uppercase() && next.is_lowercase() {
                out.push(&word[init..i]);
                init = i;
                mode = Mode::Boundary;
            } else {
                mode = next_mode;
            }
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Field and module names: `snake_case`, keywords escaped.
pub(crate) fn to_snake(s: &str) -> String {
    let mut ident = words(s)
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    match ident.as_str() {
        "as" | "break" | "const" | "continue" | "else" | "enum" | "false" | "fn" | "for"
        | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod" | "move" | "mut" | "pub"
        | "ref" | "return" | "static" | "struct" | "trait" | "true" | "type" | "unsafe"
        | "use" | "where" | "while" | "dyn" | "abstract" | "become" | "box" | "do"
        | "final" | "macro" | "override" | "priv" | "typeof" | "unsized" | "virtual"
        | "yield" | "async" | "await" | "try" | "gen" => ident.insert_str(0, "r#"),
        "_" | "super" | "self" | "crate" | "extern" => ident.push('_'),
        _ => {}
    }
    ident
}

/// Type and variant names: `UpperCamelCase`.
pub(crate) fn to_upper_camel(s: &str) -> String {
    let mut ident: String = words(s).into_iter().map(capitalize).collect();
    if ident == "Self" {
        ident.push('_');
    }
    ident
}

/// Variant name for an enum value, with the enum's own name stripped as a prefix.
pub(crate) fn enum_variant(enum_name: &str, value_name: &str) -> String {
    let prefix = to_upper_camel(enum_name);
    let name = to_upper_camel(value_name);
    match name.strip_prefix(&prefix) {
        Some(stripped) if stripped.starts_with(char::is_uppercase) => stripped.to_string(),
        _ => name,
    }
}

/// Path to the Rust type for `full_name` (a fully-qualified protobuf type
/// name without leading dot), as seen from the module of `package`.
pub(crate) fn type_path(package: &str, full_name: &str) -> String {
    let mut local = package.split('.').filter(|s| !s.is_empty()).peekable();
    let mut ident = full_name.split('.');
    let ty = ident.next_back().unwrap_or_default();
    let mut ident = ident.peekable();

    while local.peek().is_some() && local.peek() == ident.peek() {
        local.next();
        ident.next();
    }

    local
        .map(|_| "super".to_string())
        .chain(ident.map(to_snake))
        .chain(std::iter::once(to_upper_camel(ty)))
        .collect::<Vec<_>>()
        .join("::")
}

/// Render `s` as a Rust string literal.
pub(crate) fn str_literal(s: &str) -> String {
    format!("{s:?}")
}

/// Render `s` as a Rust byte string literal.
pub(crate) fn bytes_literal(s: &str) -> String {
    let mut out = String::from("b\"");
    for b in s.bytes() {
        out.extend(std::ascii::escape_default(b).map(char::from));
    }
    out.push('"');
    out
}
