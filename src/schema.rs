//! Schema document loading and flattening.
//!
//! The schema resource is a plain-text file with one fragment per line,
//! typically `CREATE TABLE` DDL. Lines are trimmed, blank lines dropped, and
//! the survivors joined with single spaces into one string suitable for
//! embedding in a language-model prompt.
//!
//! A missing resource is a degraded condition, not a fatal one: the loader
//! warns on stderr and yields an empty document, and callers treat an empty
//! schema as valid input. The resource is re-read on every translation
//! request; nothing is cached.
//!
//! # Example
//!
//! ```
//! use sql_console::schema::SchemaDoc;
//!
//! let doc = SchemaDoc::from_text("CREATE TABLE users (\n  id INT\n);\n");
//! assert_eq!(doc.flattened(), "CREATE TABLE users ( id INT );");
//! assert_eq!(doc.table_names(), vec!["users"]);
//! ```

use std::{fs, path::Path, sync::LazyLock};

use compact_str::CompactString;
use regex::Regex;

use crate::scope::TableScope;

/// Matches the table name in a CREATE TABLE fragment.
static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bCREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?["'`\[]?(\w+)"#)
        .expect("table name pattern is valid")
});

/// Flattened textual schema used to ground the language-model prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDoc {
    lines: Vec<String>
}

impl SchemaDoc {
    /// Load a schema resource from disk.
    ///
    /// A missing or unreadable file degrades to an empty document after a
    /// warning on stderr.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_text(&text),
            Err(e) => {
                eprintln!("Warning: schema not found at '{}': {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Build a document from in-memory text.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of surviving non-blank lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whole document as a single whitespace-joined string.
    pub fn flattened(&self) -> String {
        self.lines.join(" ")
    }

    /// Names of tables declared in the document, in declaration order.
    pub fn table_names(&self) -> Vec<CompactString> {
        self.lines
            .iter()
            .filter_map(|line| TABLE_NAME.captures(line))
            .filter_map(|caps| caps.get(1))
            .map(|m| CompactString::new(m.as_str()))
            .collect()
    }

    /// Keep only the fragments belonging to tables in `scope`.
    ///
    /// The document splits at `CREATE TABLE` boundaries; a block survives
    /// when its table is selected. Lines before the first declaration are
    /// kept unconditionally. An empty scope keeps everything.
    pub fn filtered(&self, scope: &TableScope) -> Self {
        if scope.is_empty() {
            return self.clone();
        }
        let mut lines = Vec::new();
        let mut keep_block = true;
        for line in &self.lines {
            if let Some(caps) = TABLE_NAME.captures(line) {
                keep_block = caps.get(1).is_some_and(|m| scope.contains(m.as_str()));
            }
            if keep_block {
                lines.push(line.clone());
            }
        }
        Self { lines }
    }
}
