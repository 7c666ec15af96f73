//! Compact parameter-type annotations.
//!
//! FDL argument declarations carry their types as short strings following the
//! grammar `TYPE ['?'] ['[]'] [' = ' DEFAULT]`, e.g. `"string?"`, `"Order[]"`
//! or `"int[] = []"`. This module is the single place that parses and formats
//! them.
//!
//! Two historical quirks are kept on purpose:
//!
//! - Parsing strips the array marker before the nullable marker, while
//!   formatting writes the nullable marker first (`"string?[]"`). Both
//!   spellings parse back to the same annotation.
//! - The default value is captured by splitting on the *first* `=`, so a type
//!   head containing `=` cannot be expressed. Defaults containing `=` keep
//!   their tail as written.

use std::fmt;

/// A parsed parameter-type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeAnnotation {
    /// Bare type name, e.g. `string` or `Order`.
    pub ty: String,
    /// Whether the annotation carried a `?` marker.
    pub nullable: bool,
    /// Whether the annotation carried a `[]` marker.
    pub is_array: bool,
    /// Verbatim default expression, if any.
    pub default_value: Option<String>,
}

impl TypeAnnotation {
    /// Parses an annotation string. Never fails: unrecognized input is kept
    /// as-is in `ty`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        // Split on the first `=` with a non-empty head and a non-empty tail.
        let (head, default_value) = match input.find('=') {
            Some(at) if at > 0 && !input[at + 1..].trim().is_empty() => (
                input[..at].trim_end(),
                Some(input[at + 1..].trim_start().to_string()),
            ),
            _ => (input, None),
        };

        let mut ty = head;
        let mut is_array = false;
        let mut nullable = false;
        if let Some(stripped) = ty.strip_suffix("[]") {
            is_array = true;
            ty = stripped;
        }
        if let Some(stripped) = ty.strip_suffix('?') {
            nullable = true;
            ty = stripped;
        }

        TypeAnnotation {
            ty: ty.to_string(),
            nullable,
            is_array,
            default_value,
        }
    }

    /// Formats the annotation back into its compact string form.
    pub fn format(&self) -> String {
        let mut out = self.ty.clone();
        if self.nullable {
            out.push('?');
        }
        if self.is_array {
            out.push_str("[]");
        }
        if let Some(default) = &self.default_value {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
