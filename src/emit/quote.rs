//! ECMAScript property-name validation, applied before emitting identifiers.
//!
//! Display names come straight from structured-data tags, which accept any
//! valid JSON property name; not all of those are valid JS identifiers.

use std::borrow::Cow;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Reserved and future-reserved words, ECMAScript editions through ES2017.
static ECMA_RESERVED: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "export",
        "extends",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "enum",
        "implements",
        "interface",
        "let",
        "package",
        "private",
        "protected",
        "public",
        "static",
        "abstract",
        "boolean",
        "byte",
        "char",
        "double",
        "final",
        "float",
        "goto",
        "int",
        "long",
        "native",
        "short",
        "synchronized",
        "throws",
        "transient",
        "volatile",
        "await",
    ]
    .into_iter()
    .collect()
});

/// Permits common valid identifiers like `$apply` or `_`. Quotes more than is
/// strictly necessary: unicode letters are legal in identifiers but get
/// quoted here anyway.
static VALID_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[$0-9A-Za-z_]+$").unwrap());

/// True when `name` must be quoted to serve as a property name: it is a
/// reserved word, or contains a character outside the permitted set.
pub fn needs_quoting(name: &str) -> bool {
    ECMA_RESERVED.contains(name) || !VALID_IDENT.is_match(name)
}

/// Rendered property token for `name`. Quoting only changes the emitted
/// token, never the field's logical name.
pub fn property(name: &str) -> Cow<'_, str> {
    if needs_quoting(name) {
        Cow::Owned(format!("\"{name}\""))
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_word_characters_force_quoting() {
        assert!(needs_quoting("hello-world"));
        assert!(needs_quoting("hello#world"));
        assert!(needs_quoting("你好世界"));
        assert!(needs_quoting("hello/world"));
    }

    #[test]
    fn ordinary_identifiers_stay_bare() {
        assert!(!needs_quoting("$helloWorld"));
        assert!(!needs_quoting("helloWorld"));
        assert!(!needs_quoting("hello_world"));
        assert!(!needs_quoting("_"));
    }

    #[test]
    fn reserved_words_are_quoted() {
        assert!(needs_quoting("class"));
        assert!(needs_quoting("await"));
        assert!(needs_quoting("boolean"));
        assert_eq!(property("class"), "\"class\"");
        assert_eq!(property("klass"), "klass");
    }
}
