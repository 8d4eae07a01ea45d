//! # SQL Console
//!
//! Query a local SQLite database in plain language.
//!
//! `sql-console` takes a natural-language request, translates it to SQL via a
//! remote language-model completion endpoint, executes the generated SQL
//! against a SQLite database file, and prints the results as a text table.
//! The translation prompt is grounded in a plain-text schema file so the
//! model knows which tables and columns exist.
//!
//! # Pipeline
//!
//! One request flows through four stages:
//!
//! 1. **Schema loading** - The schema file is re-read on every request,
//!    trimmed, and flattened into a single string for prompt embedding. A
//!    missing schema degrades to an empty prompt context with a warning.
//! 2. **Translation** - The flattened schema plus a bare-SQL directive goes
//!    to OpenAI, Anthropic, or a local Ollama instance as a two-message
//!    exchange, bounded to a fixed completion length. Transient transport
//!    failures retry with exponential backoff.
//! 3. **Execution** - The generated SQL runs verbatim against the open
//!    database connection. Driver errors are captured, never fatal. An empty
//!    completion is reported as "no query generated" and skips the driver.
//! 4. **Presentation** - Column headers and rows render as a padded text
//!    table, or as JSON/YAML for programmatic use.
//!
//! # Quick Start
//!
//! ```bash
//! # One-shot query against a database with a schema file
//! sql-console query "ten longest films" --db sakila.db --schema schema.txt
//!
//! # Pipe the request from stdin
//! echo "how many customers are there" | sql-console query --db sakila.db
//!
//! # Skip translation and run literal SQL
//! sql-console query --sql "SELECT count(*) FROM customer" --db sakila.db
//!
//! # Narrow the translation context to selected tables
//! sql-console query "rentals per store" --db sakila.db -t rental,store
//!
//! # Interactive session
//! export LLM_API_KEY="sk-..."
//! sql-console repl --db sakila.db --schema schema.txt --provider openai
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`LLM_API_KEY`, `SQL_CONSOLE_DB`, etc.)
//! 3. `.sql-console.toml` in current directory
//! 4. `~/.config/sql-console/config.toml`
//!
//! ## Example Configuration
//!
//! ```toml
//! [llm]
//! provider = "ollama"
//! model = "llama3.2"
//! ollama_url = "http://localhost:11434"
//! max_tokens = 200
//!
//! [database]
//! path = "sakila.db"
//! schema = "schema.txt"
//!
//! [retry]
//! max_retries = 3
//! initial_delay_ms = 1000
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Query ran and returned results
//! - `1` - The model generated no query for the request
//! - `2` - The database rejected the generated SQL
//!
//! # Trust Boundary
//!
//! Generated SQL runs with no allow-list and no read-only enforcement;
//! mutating statements are executed. Point the console only at databases
//! you are willing to let the model modify.
//!
//! # Modules
//!
//! - [`sql_console::schema`] - Schema document loading and flattening
//! - [`sql_console::translate`] - Prompt construction and the completion seam
//! - [`sql_console::llm`] - LLM provider integrations (OpenAI, Anthropic, Ollama)
//! - [`sql_console::db`] - SQLite execution against one connection
//! - [`sql_console::present`] - View state and result rendering
//! - [`sql_console::scope`] - Table scope selection
//! - [`sql_console::config`] - Configuration loading and validation
//! - [`sql_console::error`] - Error types and constructors

use std::process;

use clap::Parser;
use tokio::main;

use sql_console::{
    app::{QueryParams, ReplParams, run_query, run_repl},
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};

#[main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Query {
            request,
            db,
            schema,
            provider,
            api_key,
            model,
            ollama_url,
            output_format,
            tables,
            sql,
            dry_run,
            no_color
        } => {
            run_query(
                QueryParams {
                    request,
                    db_path: db.map(|p| p.display().to_string()),
                    schema_path: schema.map(|p| p.display().to_string()),
                    provider,
                    api_key,
                    model,
                    ollama_url,
                    output_format,
                    tables,
                    raw_sql: sql,
                    dry_run,
                    no_color
                },
                config
            )
            .await
        }
        Commands::Repl {
            db,
            schema,
            provider,
            api_key,
            model,
            ollama_url,
            tables,
            no_color
        } => {
            run_repl(
                ReplParams {
                    db_path: db.map(|p| p.display().to_string()),
                    schema_path: schema.map(|p| p.display().to_string()),
                    provider,
                    api_key,
                    model,
                    ollama_url,
                    tables,
                    no_color
                },
                config
            )
            .await
        }
    }
}
