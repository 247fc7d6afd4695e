/// Indentation-aware line buffer for emitted Rust source.
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    out: String,
    indent: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one line at the current indentation. Empty input emits a blank line.
    pub fn line(&mut self, s: impl AsRef<str>) {
        let s = s.as_ref();
        if s.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    /// Emit a multi-line fragment at the current indentation.
    ///
    /// The fragment's common leading whitespace is replaced by the current
    /// indentation; deeper lines keep their relative indent. Lines that
    /// continue a string literal are copied verbatim. Blank lines around
    /// the fragment are dropped.
    pub fn fragment(&mut self, s: &str) {
        let lines: Vec<&str> = s.lines().collect();
        let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
            return;
        };
        let last = lines.iter().rposition(|l| !l.trim().is_empty()).unwrap_or(first);
        let lines = &lines[first..=last];

        let mut margin = usize::MAX;
        let mut in_string = false;
        for line in lines {
            if !in_string && !line.trim().is_empty() {
                margin = margin.min(line.len() - line.trim_start_matches([' ', '\t']).len());
            }
            in_string = ends_in_string(line, in_string);
        }

        in_string = false;
        for line in lines {
            if in_string {
                self.out.push_str(line);
                self.out.push('\n');
            } else if line.trim().is_empty() {
                self.line("");
            } else {
                self.line(line.get(margin..).unwrap_or(line));
            }
            in_string = ends_in_string(line, in_string);
        }
    }

    /// Emit `header {` and indent.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.indent += 1;
    }

    /// Dedent and emit `}`.
    pub fn close(&mut self) {
        self.close_with("");
    }

    /// Dedent and emit `}` followed by `suffix`, e.g. `;`.
    pub fn close_with(&mut self, suffix: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(format!("}}{suffix}"));
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Whether `line` ends inside a `"` string literal, given whether it
/// started inside one. Char literals such as `'"'` are skipped.
fn ends_in_string(line: &str, mut open: bool) -> bool {
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if open => {
                chars.next();
            }
            '"' => open = !open,
            '\'' if !open => {
                let rest: String = chars.clone().take(3).collect();
                if rest.starts_with('\\') {
                    // '\x' style escapes close on the next quote
                    chars.next();
                    chars.next();
                    while chars.next_if(|&c| c != '\'').is_some() {}
                    chars.next();
                } else if rest.chars().nth(1) == Some('\'') {
                    chars.next();
                    chars.next();
                }
            }
            _ => {}
        }
    }
    open
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn blocks_indent_their_body() {
        let mut w = CodeWriter::new();
        w.open("if x");
        w.line("return;");
        w.close();
        w.line("");
        assert_eq!(w.finish(), "if x {\n    return;\n}\n\n");
    }

    #[test]
    fn fragments_are_reindented() {
        let mut w = CodeWriter::new();
        w.open("fn f()");
        w.fragment("\n  let a = 1;\n\n  if a > 0 {\n      a;\n  }\n\n");
        w.close();
        assert_eq!(
            w.finish(),
            "fn f() {\n    let a = 1;\n\n    if a > 0 {\n        a;\n    }\n}\n"
        );
    }

    #[test]
    fn string_literal_lines_are_kept_verbatim() {
        let mut w = CodeWriter::new();
        w.open("fn f()");
        w.fragment("let s = \"a\n  b\n\nc\";\nlet q = '\"';\nlet t = s;");
        w.close();
        assert_eq!(
            w.finish(),
            "fn f() {\n    let s = \"a\n  b\n\nc\";\n    let q = '\"';\n    let t = s;\n}\n"
        );
    }

    #[test]
    fn string_state_tracks_escapes_and_char_literals() {
        assert!(ends_in_string("let s = \"a", false));
        assert!(!ends_in_string("b\";", true));
        assert!(ends_in_string("x \\\" y", true));
        assert!(!ends_in_string("let c = '\"'; let d = '\\'';", false));
        assert!(!ends_in_string("fn f<'a>(s: &'a str) {}", false));
    }
}
