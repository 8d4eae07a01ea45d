use colored::Colorize;
use serde::Serialize;

use crate::db::{ExecutionOutcome, QueryResult};

/// Notice shown when the translator declined to produce SQL.
pub const NO_QUERY_NOTICE: &str = "No query generated for this request";

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Display state for one console session.
///
/// Mirrors the two surfaces of the console: a tabular view for successful
/// results and an error log for failures. Success replaces the table and
/// leaves the error log alone; failure replaces the error log and leaves the
/// table alone. Error text therefore persists until overwritten by another
/// failure, never cleared by a later success.
#[derive(Debug, Clone, Default)]
pub struct ResultView {
    table: Option<QueryResult>,
    error: Option<String>
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one execution outcome to the view.
    ///
    /// Idempotent per call: the written side is replaced, never appended to.
    pub fn present(&mut self, outcome: &ExecutionOutcome) {
        match outcome {
            ExecutionOutcome::Success(result) => self.table = Some(result.clone()),
            ExecutionOutcome::Failure(message) => self.error = Some(message.clone()),
            ExecutionOutcome::NoQuery => self.error = Some(NO_QUERY_NOTICE.to_string())
        }
    }

    pub fn table(&self) -> Option<&QueryResult> {
        self.table.as_ref()
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Serialized shape of one query round trip
#[derive(Debug, Serialize)]
pub struct QueryReport<'a> {
    pub sql:    &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:  Option<&'a str>
}

impl<'a> QueryReport<'a> {
    pub fn from_outcome(sql: &'a str, outcome: &'a ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Success(result) => Self {
                sql,
                result: Some(result),
                error: None
            },
            ExecutionOutcome::Failure(message) => Self {
                sql,
                result: None,
                error: Some(message)
            },
            ExecutionOutcome::NoQuery => Self {
                sql,
                result: None,
                error: Some(NO_QUERY_NOTICE)
            }
        }
    }
}

/// Format one outcome together with the SQL that produced it
pub fn format_query_report(sql: &str, outcome: &ExecutionOutcome, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&QueryReport::from_outcome(sql, outcome))
                .unwrap_or_default()
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(&QueryReport::from_outcome(sql, outcome)).unwrap_or_default()
        }
        OutputFormat::Text => format_text_report(sql, outcome, opts)
    }
}

fn format_text_report(sql: &str, outcome: &ExecutionOutcome, opts: &OutputOptions) -> String {
    let mut output = String::new();
    if !sql.is_empty() {
        let line = format!("sql> {}", sql);
        if opts.colored {
            output.push_str(&line.dimmed().to_string());
        } else {
            output.push_str(&line);
        }
        output.push('\n');
    }
    match outcome {
        ExecutionOutcome::Success(result) => output.push_str(&format_table(result, opts)),
        ExecutionOutcome::Failure(message) => {
            let line = format!("Error executing query: {}", message);
            if opts.colored {
                output.push_str(&line.red().to_string());
            } else {
                output.push_str(&line);
            }
            output.push('\n');
        }
        ExecutionOutcome::NoQuery => {
            if opts.colored {
                output.push_str(&NO_QUERY_NOTICE.yellow().to_string());
            } else {
                output.push_str(NO_QUERY_NOTICE);
            }
            output.push('\n');
        }
    }
    output
}

/// Render a result as a padded text table with per-column widths
pub fn format_table(result: &QueryResult, opts: &OutputOptions) -> String {
    if result.columns.is_empty() {
        return format!("OK, {} row(s) affected\n", result.rows_affected.unwrap_or(0));
    }
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    let rendered: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }
    let mut output = String::new();
    let header = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
        .collect::<Vec<_>>()
        .join(" | ");
    if opts.colored {
        output.push_str(&header.cyan().bold().to_string());
    } else {
        output.push_str(&header);
    }
    output.push('\n');
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");
    output.push_str(&separator);
    output.push('\n');
    for row in &rendered {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ");
        output.push_str(&line);
        output.push('\n');
    }
    output.push_str(&format!("{} row(s)\n", result.rows.len()));
    output
}
