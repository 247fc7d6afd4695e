use std::collections::BTreeSet;

use super::writer::CodeWriter;

/// Runtime items every generated file references, so none of them is
/// reported unused whichever rules the file happens to contain.
const SUPPORT_ITEMS: [&str; 6] = [
    "ValidationError::rule",
    "ValidationError::nested",
    "runtime::matches_str",
    "runtime::matches_bytes",
    "runtime::contains_bytes",
    "runtime::now_unix_nano",
];

/// Fixed inputs of one generated file.
pub(crate) struct Assembly<'a> {
    pub source: &'a str,
    pub package: &'a str,
    pub runtime: &'a str,
    pub header: bool,
}

impl Assembly<'_> {
    /// Provenance comment, support block, the procedures in order, then the
    /// imports collected from custom functions.
    pub fn assemble(&self, procedures: &[String], imports: &BTreeSet<String>) -> String {
        let mut out = CodeWriter::new();
        if self.header {
            out.line(format!(
                "// Code generated by {}. DO NOT EDIT.",
                env!("CARGO_PKG_NAME")
            ));
            out.line("// versions:");
            out.line(format!(
                "// - {} v{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ));
            out.line(format!("// source: {}", self.source));
        }
        out.line(format!("// proto package: {}", self.package));
        out.line("");

        out.open("const _: fn() = ||");
        for item in SUPPORT_ITEMS {
            out.line(format!("let _ = {}::{item};", self.runtime));
        }
        out.close_with(";");
        let mut text = out.finish();

        for procedure in procedures {
            text.push('\n');
            text.push_str(procedure);
        }

        if !imports.is_empty() {
            text.push('\n');
            for path in imports {
                text.push_str("#[allow(unused_imports)]\n");
                text.push_str(&format!("use {path};\n"));
            }
        }
        text
    }
}
