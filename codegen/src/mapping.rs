//! Logical symbol → target-language mapping tables.
//!
//! Deterministic mappings from resolved identifiers and logical paths to
//! each language's file names, namespace spellings and reserved words.

use std::fmt;
use std::str::FromStr;

/// Output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    /// Java enums and classes.
    Java,
    /// C++17 headers.
    Cpp,
    /// C# sources.
    CSharp,
    /// Python 3 modules.
    Python,
}

impl TargetLanguage {
    /// All supported languages.
    pub const ALL: [TargetLanguage; 4] = [
        TargetLanguage::Java,
        TargetLanguage::Cpp,
        TargetLanguage::CSharp,
        TargetLanguage::Python,
    ];

    /// Command-line spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TargetLanguage::Java => "java",
            TargetLanguage::Cpp => "cpp",
            TargetLanguage::CSharp => "csharp",
            TargetLanguage::Python => "python",
        }
    }

    /// Source file extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            TargetLanguage::Java => "java",
            TargetLanguage::Cpp => "hpp",
            TargetLanguage::CSharp => "cs",
            TargetLanguage::Python => "py",
        }
    }

    /// Separator between namespace segments.
    #[must_use]
    pub fn separator(self) -> &'static str {
        match self {
            TargetLanguage::Cpp => "::",
            TargetLanguage::Java | TargetLanguage::CSharp | TargetLanguage::Python => ".",
        }
    }

    /// Root namespace used when none is configured.
    #[must_use]
    pub fn default_root_namespace(self) -> &'static str {
        match self {
            TargetLanguage::Java => "edu.nps.moves.dis7",
            TargetLanguage::Cpp => "dis",
            TargetLanguage::CSharp => "OpenDis.Enumerations",
            TargetLanguage::Python => "opendis",
        }
    }

    /// Spells one logical path segment as a namespace component.
    ///
    /// Java and Python packages are lower case; C# namespaces keep case.
    #[must_use]
    pub fn namespace_segment(self, segment: &str) -> String {
        let s = match self {
            TargetLanguage::Java | TargetLanguage::Python => segment.to_lowercase(),
            TargetLanguage::Cpp | TargetLanguage::CSharp => segment.to_string(),
        };
        let s = match s.chars().next() {
            Some(c) if c.is_ascii_digit() => format!("_{s}"),
            _ => s,
        };
        escape_keyword(self, &s)
    }

    /// File stem for a symbol.
    #[must_use]
    pub fn file_stem(self, identifier: &str) -> String {
        match self {
            TargetLanguage::Python => escape_keyword(self, &to_snake_case(identifier)),
            _ => identifier.to_string(),
        }
    }

    /// Reserved words that may not be used as identifiers.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            TargetLanguage::Java => JAVA_KEYWORDS,
            TargetLanguage::Cpp => CPP_KEYWORDS,
            TargetLanguage::CSharp => CSHARP_KEYWORDS,
            TargetLanguage::Python => PYTHON_KEYWORDS,
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(TargetLanguage::Java),
            "cpp" | "c++" => Ok(TargetLanguage::Cpp),
            "csharp" | "c#" | "cs" => Ok(TargetLanguage::CSharp),
            "python" | "py" => Ok(TargetLanguage::Python),
            other => Err(format!(
                "unknown language {other:?}; expected one of java, cpp, csharp, python"
            )),
        }
    }
}

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
];

const CPP_KEYWORDS: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "decltype", "default", "delete", "do", "double",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "nullptr",
    "operator", "or", "private", "protected", "public", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "template", "this", "throw", "true",
    "try", "typedef", "typename", "union", "unsigned", "using", "virtual", "void", "volatile",
    "while", "xor",
];

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "static", "string", "struct", "switch", "this", "throw", "true", "try", "typeof",
    "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile",
    "while",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Appends `_` to an identifier that is a reserved word of `language`.
#[must_use]
pub fn escape_keyword(language: TargetLanguage, identifier: &str) -> String {
    if language.keywords().contains(&identifier) {
        format!("{identifier}_")
    } else {
        identifier.to_string()
    }
}

/// Converts a PascalCase or underscore-separated identifier into snake_case.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev: Option<char> = None;
    for ch in s.chars() {
        if ch.is_uppercase() {
            // No divider inside acronyms ("PDU") or after an existing one.
            if let Some(p) = prev {
                if p.is_lowercase() || p.is_ascii_digit() {
                    result.push('_');
                }
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
        prev = Some(ch);
    }
    result
}

/// Escapes text for a double-quoted string literal.
#[must_use]
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Flattens comment text onto one line.
#[must_use]
pub fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_text() {
        for lang in TargetLanguage::ALL {
            assert_eq!(lang.as_str().parse::<TargetLanguage>(), Ok(lang));
        }
        assert_eq!("C++".parse::<TargetLanguage>(), Ok(TargetLanguage::Cpp));
        assert!("cobol".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("DisPduType"), "dis_pdu_type");
        assert_eq!(to_snake_case("PDUType"), "pdutype");
        assert_eq!(to_snake_case("Entity_State"), "entity_state");
        assert_eq!(to_snake_case("Tank2Destroyer"), "tank2_destroyer");
    }

    #[test]
    fn keywords_are_escaped_per_language() {
        assert_eq!(escape_keyword(TargetLanguage::Python, "None"), "None_");
        assert_eq!(escape_keyword(TargetLanguage::Java, "None"), "None");
        assert_eq!(escape_keyword(TargetLanguage::Java, "default"), "default_");
    }

    #[test]
    fn namespace_segments_follow_language_case() {
        assert_eq!(TargetLanguage::Java.namespace_segment("UnitedStates"), "unitedstates");
        assert_eq!(TargetLanguage::CSharp.namespace_segment("UnitedStates"), "UnitedStates");
        assert_eq!(TargetLanguage::Cpp.namespace_segment("12"), "_12");
        assert_eq!(TargetLanguage::Python.namespace_segment("Import"), "import_");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(escape_string(r#"say "hi" \ now"#), r#"say \"hi\" \\ now"#);
    }
}
