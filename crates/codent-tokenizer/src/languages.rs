//! Bundled [`LanguageSpec`]s for the default registry.
//!
//! Keyword lists cover the reserved words of each language; identifiers
//! outside them collapse to `ID` during normalization. Value literals map
//! to the categorical placeholders the models are trained on.

use crate::scanner::LanguageSpec;

pub fn go() -> LanguageSpec {
    LanguageSpec {
        name: "go",
        keywords: &[
            "break",
            "case",
            "chan",
            "const",
            "continue",
            "default",
            "defer",
            "else",
            "fallthrough",
            "for",
            "func",
            "go",
            "goto",
            "if",
            "import",
            "interface",
            "map",
            "package",
            "range",
            "return",
            "select",
            "struct",
            "switch",
            "type",
            "var",
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        string_delimiters: b"\"'`",
        triple_strings: false,
        literals: &[("true", "BOOL"), ("false", "BOOL"), ("nil", "NIL")],
        char_placeholder: Some("CHAR"),
    }
}

pub fn python() -> LanguageSpec {
    LanguageSpec {
        name: "python",
        keywords: &[
            "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
            "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
            "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
            "with", "yield",
        ],
        line_comments: &["#"],
        block_comment: None,
        string_delimiters: b"\"'",
        triple_strings: true,
        literals: &[("True", "BOOL"), ("False", "BOOL"), ("None", "NONE")],
        // Python has no char literals; single quotes are ordinary strings.
        char_placeholder: Some("STR"),
    }
}

pub fn javascript() -> LanguageSpec {
    LanguageSpec {
        name: "javascript",
        keywords: &[
            "async",
            "await",
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
            "let",
            "new",
            "of",
            "return",
            "static",
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
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        string_delimiters: b"\"'`",
        triple_strings: false,
        literals: &[
            ("true", "BOOL"),
            ("false", "BOOL"),
            ("null", "NULL"),
            ("undefined", "UNDEF"),
        ],
        char_placeholder: Some("STR"),
    }
}

pub fn typescript() -> LanguageSpec {
    LanguageSpec {
        name: "typescript",
        keywords: &[
            "abstract",
            "any",
            "as",
            "async",
            "await",
            "boolean",
            "break",
            "case",
            "catch",
            "class",
            "const",
            "continue",
            "debugger",
            "declare",
            "default",
            "delete",
            "do",
            "else",
            "enum",
            "export",
            "extends",
            "finally",
            "for",
            "function",
            "if",
            "implements",
            "import",
            "in",
            "instanceof",
            "interface",
            "keyof",
            "let",
            "namespace",
            "never",
            "new",
            "number",
            "of",
            "private",
            "protected",
            "public",
            "readonly",
            "return",
            "static",
            "string",
            "super",
            "switch",
            "this",
            "throw",
            "try",
            "type",
            "typeof",
            "unknown",
            "var",
            "void",
            "while",
            "with",
            "yield",
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        string_delimiters: b"\"'`",
        triple_strings: false,
        literals: &[
            ("true", "BOOL"),
            ("false", "BOOL"),
            ("null", "NULL"),
            ("undefined", "UNDEF"),
        ],
        char_placeholder: Some("STR"),
    }
}

pub fn java() -> LanguageSpec {
    LanguageSpec {
        name: "java",
        keywords: &[
            "abstract",
            "assert",
            "boolean",
            "break",
            "byte",
            "case",
            "catch",
            "char",
            "class",
            "const",
            "continue",
            "default",
            "do",
            "double",
            "else",
            "enum",
            "extends",
            "final",
            "finally",
            "float",
            "for",
            "goto",
            "if",
            "implements",
            "import",
            "instanceof",
            "int",
            "interface",
            "long",
            "native",
            "new",
            "package",
            "private",
            "protected",
            "public",
            "return",
            "short",
            "static",
            "strictfp",
            "super",
            "switch",
            "synchronized",
            "this",
            "throw",
            "throws",
            "transient",
            "try",
            "void",
            "volatile",
            "while",
        ],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        string_delimiters: b"\"'",
        triple_strings: false,
        literals: &[("true", "BOOL"), ("false", "BOOL"), ("null", "NULL")],
        // Java character literals fold into STR, matching string_literal
        // and character_literal sharing a placeholder.
        char_placeholder: Some("STR"),
    }
}
