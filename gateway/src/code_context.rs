use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// Construct kinds tracked by the naming histogram.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    Function,
    Class,
}

/// Naming convention of a single identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NamingStyle {
    SnakeCase,
    PascalCase,
    CamelCase,
    Other,
}

impl NamingStyle {
    /// Classify an identifier. Lowercase names with or without underscores
    /// count as snake_case; a leading capital means PascalCase; interior
    /// capitals after a lowercase start mean camelCase.
    pub fn classify(name: &str) -> NamingStyle {
        let has_underscore = name.contains('_');
        let first_upper = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase());
        let any_upper = name.chars().any(|c| c.is_ascii_uppercase());

        if !any_upper {
            NamingStyle::SnakeCase
        } else if first_upper && !has_underscore {
            NamingStyle::PascalCase
        } else if !first_upper && !has_underscore {
            NamingStyle::CamelCase
        } else {
            NamingStyle::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NamingStyle::SnakeCase => "snake_case",
            NamingStyle::PascalCase => "PascalCase",
            NamingStyle::CamelCase => "camelCase",
            NamingStyle::Other => "other",
        }
    }
}

/// A named construct found in submitted source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntity {
    pub name: String,
    pub line: usize,
}

/// A classified identifier, fed into the learning store on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingObservation {
    pub name: String,
    pub construct: ConstructKind,
    pub style: NamingStyle,
}

/// Structural context extracted from one submitted file. Overwritten when
/// the same filename is ingested again. A source that cannot be parsed
/// produces an entry carrying an error payload instead of failing ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeContextEntry {
    pub functions: Vec<CodeEntity>,
    pub classes: Vec<CodeEntity>,
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub naming_patterns: Vec<NamingObservation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

enum SourceLanguage {
    Python,
    Rust,
    JavaScript,
}

fn detect_language(filename: &str) -> Option<SourceLanguage> {
    match Path::new(filename).extension().and_then(|ext| ext.to_str()) {
        Some("py") => Some(SourceLanguage::Python),
        Some("rs") => Some(SourceLanguage::Rust),
        Some("js" | "jsx" | "ts" | "tsx") => Some(SourceLanguage::JavaScript),
        _ => None,
    }
}

/// Extract structural entities from submitted source. Line-based: enough to
/// name the functions, classes, and imports a prompt needs, without pulling
/// a full parser into the gateway.
pub fn parse_code_context(filename: &str, source: &str) -> CodeContextEntry {
    let Some(language) = detect_language(filename) else {
        return CodeContextEntry {
            error: Some(format!("unsupported file type: {filename}")),
            ..CodeContextEntry::default()
        };
    };

    let mut entry = CodeContextEntry::default();
    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        match language {
            SourceLanguage::Python => scan_python_line(line, line_no, &mut entry),
            SourceLanguage::Rust => scan_rust_line(line, line_no, &mut entry),
            SourceLanguage::JavaScript => scan_js_line(line, line_no, &mut entry),
        }
    }

    entry.naming_patterns = entry
        .functions
        .iter()
        .map(|entity| (ConstructKind::Function, entity))
        .chain(
            entry
                .classes
                .iter()
                .map(|entity| (ConstructKind::Class, entity)),
        )
        .map(|(construct, entity)| NamingObservation {
            name: entity.name.clone(),
            construct,
            style: NamingStyle::classify(&entity.name),
        })
        .collect();

    entry
}

fn identifier_prefix(text: &str) -> Option<String> {
    let name: String = text
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

fn scan_python_line(line: &str, line_no: usize, entry: &mut CodeContextEntry) {
    let trimmed = line.trim_start();

    let def_body = trimmed
        .strip_prefix("async def ")
        .or_else(|| trimmed.strip_prefix("def "));
    if let Some(rest) = def_body {
        if let Some(name) = identifier_prefix(rest) {
            entry.functions.push(CodeEntity { name, line: line_no });
        }
        return;
    }

    if let Some(rest) = trimmed.strip_prefix("class ") {
        if let Some(name) = identifier_prefix(rest) {
            entry.classes.push(CodeEntity { name, line: line_no });
        }
        return;
    }

    if let Some(rest) = trimmed.strip_prefix("import ") {
        for module in rest.split(',') {
            if let Some(name) = module.trim().split_whitespace().next() {
                entry.imports.push(name.to_string());
            }
        }
        return;
    }

    if let Some(rest) = trimmed.strip_prefix("from ") {
        let mut parts = rest.split(" import ");
        let module = parts.next().map(str::trim);
        let first_name = parts
            .next()
            .and_then(|names| names.split(',').next())
            .and_then(|name| name.trim().split_whitespace().next());
        if let (Some(module), Some(name)) = (module, first_name) {
            entry.imports.push(format!("{module}.{name}"));
        }
    }
}

const RUST_QUALIFIERS: &[&str] = &[
    "pub(crate) ",
    "pub(super) ",
    "pub ",
    "async ",
    "const ",
    "unsafe ",
];

fn scan_rust_line(line: &str, line_no: usize, entry: &mut CodeContextEntry) {
    let mut trimmed = line.trim_start();
    loop {
        let mut stripped = false;
        for qualifier in RUST_QUALIFIERS {
            if let Some(rest) = trimmed.strip_prefix(qualifier) {
                trimmed = rest;
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }

    if let Some(rest) = trimmed.strip_prefix("fn ") {
        if let Some(name) = identifier_prefix(rest) {
            entry.functions.push(CodeEntity { name, line: line_no });
        }
        return;
    }

    for keyword in ["struct ", "enum ", "trait "] {
        if let Some(rest) = trimmed.strip_prefix(keyword) {
            if let Some(name) = identifier_prefix(rest) {
                entry.classes.push(CodeEntity { name, line: line_no });
            }
            return;
        }
    }

    if let Some(rest) = trimmed.strip_prefix("use ") {
        if let Some(root) = identifier_prefix(rest) {
            // Local paths are not libraries.
            if root != "crate" && root != "self" && root != "super" {
                entry.imports.push(root);
            }
        }
    }
}

fn scan_js_line(line: &str, line_no: usize, entry: &mut CodeContextEntry) {
    let mut trimmed = line.trim_start();
    for qualifier in ["export ", "default "] {
        if let Some(rest) = trimmed.strip_prefix(qualifier) {
            trimmed = rest;
        }
    }

    let function_body = trimmed
        .strip_prefix("async function ")
        .or_else(|| trimmed.strip_prefix("function "));
    if let Some(rest) = function_body {
        if let Some(name) = identifier_prefix(rest) {
            entry.functions.push(CodeEntity { name, line: line_no });
        }
        return;
    }

    if let Some(rest) = trimmed.strip_prefix("class ") {
        if let Some(name) = identifier_prefix(rest) {
            entry.classes.push(CodeEntity { name, line: line_no });
        }
        return;
    }

    if trimmed.starts_with("import ") {
        if let Some(module) = quoted_module(trimmed) {
            entry.imports.push(module);
        }
    }
}

fn quoted_module(line: &str) -> Option<String> {
    for quote in ['\'', '"'] {
        let mut pieces = line.split(quote);
        pieces.next();
        if let Some(module) = pieces.next() {
            return Some(module.to_string());
        }
    }
    None
}
