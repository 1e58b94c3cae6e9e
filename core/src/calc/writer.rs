//! Plan rendering.

use std::fmt::Write;

use super::Calc;

/// Renders a calc tree as an indented plan, one node per line.
///
/// ```text
/// MemberValue
///   CurrentMemberFixed([Store])
///   Constant([Gender].[All Genders].[M])
/// ```
#[derive(Debug, Clone)]
pub struct CalcWriter {
    indent: usize,
    with_types: bool,
}

impl Default for CalcWriter {
    fn default() -> Self {
        CalcWriter {
            indent: 2,
            with_types: false,
        }
    }
}

impl CalcWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends each node's static type, as in `Parent: MemberType<[Store]>`.
    pub fn with_types(mut self, with_types: bool) -> Self {
        self.with_types = with_types;
        self
    }

    pub fn write(&self, calc: &Calc) -> String {
        let mut out = String::new();
        self.write_node(&mut out, calc, 0);
        out
    }

    fn write_node(&self, out: &mut String, calc: &Calc, depth: usize) {
        let pad = depth * self.indent;
        // Writing to a String cannot fail.
        let _ = if self.with_types {
            writeln!(out, "{:pad$}{}: {}", "", calc.describe(), calc.ty())
        } else {
            writeln!(out, "{:pad$}{}", "", calc.describe())
        };
        for child in calc.children() {
            self.write_node(out, &child, depth + 1);
        }
    }
}
