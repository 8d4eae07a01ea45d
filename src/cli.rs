use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// SQL Console - Query a SQLite database in plain language via an LLM
#[derive(Parser, Debug)]
#[command(name = "sql-console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate one request to SQL, run it, and print the results
    Query {
        /// Natural language request (omit or use - for stdin)
        request: Option<String>,

        /// Path to the SQLite database file
        #[arg(short, long, env = "SQL_CONSOLE_DB")]
        db: Option<PathBuf>,

        /// Path to the plain-text schema file embedded in the prompt
        #[arg(short, long, env = "SQL_CONSOLE_SCHEMA")]
        schema: Option<PathBuf>,

        /// LLM provider to use
        #[arg(short, long, value_enum, default_value = "ollama")]
        provider: Provider,

        /// API key for OpenAI or Anthropic
        #[arg(short, long, env = "LLM_API_KEY")]
        api_key: Option<String>,

        /// Model name
        #[arg(short, long)]
        model: Option<String>,

        /// Ollama base URL
        #[arg(long, default_value = "http://localhost:11434")]
        ollama_url: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Restrict translation context to these tables
        #[arg(short, long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Treat the request as literal SQL and skip translation
        #[arg(long)]
        sql: bool,

        /// Show what would be sent to LLM without making API call
        #[arg(long)]
        dry_run: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },
    /// Interactive session against one database
    Repl {
        /// Path to the SQLite database file
        #[arg(short, long, env = "SQL_CONSOLE_DB")]
        db: Option<PathBuf>,

        /// Path to the plain-text schema file embedded in the prompt
        #[arg(short, long, env = "SQL_CONSOLE_SCHEMA")]
        schema: Option<PathBuf>,

        /// LLM provider to use
        #[arg(short, long, value_enum, default_value = "ollama")]
        provider: Provider,

        /// API key for OpenAI or Anthropic
        #[arg(short, long, env = "LLM_API_KEY")]
        api_key: Option<String>,

        /// Model name
        #[arg(short, long)]
        model: Option<String>,

        /// Ollama base URL
        #[arg(long, default_value = "http://localhost:11434")]
        ollama_url: String,

        /// Preselect scope tables
        #[arg(short, long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Provider {
    OpenAI,
    Anthropic,
    Ollama
}

impl Provider {
    /// Get default model for provider
    pub fn default_model(&self) -> &str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::Ollama => "llama3.2"
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
