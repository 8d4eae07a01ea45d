//! Application logic for the SQL Console CLI.
//!
//! This module contains the core pipeline separated from the main entry
//! point to enable testing: resolve inputs, load the schema, translate,
//! execute, present. The pipeline is free of any UI-framework dependency;
//! the binary and the REPL are thin layers over [`run_query`] and
//! [`run_repl`].

use std::{
    io::{self, Read, Write},
    path::Path,
    time::Duration
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    cli::{Format, Provider},
    config::Config,
    db::{Database, ExecutionOutcome},
    error::{AppResult, config_error, file_read_error},
    llm::{LlmClient, LlmProvider},
    present::{OutputFormat, OutputOptions, ResultView, format_query_report},
    schema::SchemaDoc,
    scope::TableScope,
    translate::{QueryTranslator, build_system_instruction}
};

/// Parameters for the query command
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub request:       Option<String>,
    pub db_path:       Option<String>,
    pub schema_path:   Option<String>,
    pub provider:      Provider,
    pub api_key:       Option<String>,
    pub model:         Option<String>,
    pub ollama_url:    String,
    pub output_format: Format,
    pub tables:        Vec<String>,
    pub raw_sql:       bool,
    pub dry_run:       bool,
    pub no_color:      bool
}

/// Parameters for the repl command
#[derive(Debug, Clone)]
pub struct ReplParams {
    pub db_path:     Option<String>,
    pub schema_path: Option<String>,
    pub provider:    Provider,
    pub api_key:     Option<String>,
    pub model:       Option<String>,
    pub ollama_url:  String,
    pub tables:      Vec<String>,
    pub no_color:    bool
}

/// Convert CLI format to internal OutputFormat
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}

/// Create output options from parameters
pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  convert_format(format),
        colored: !no_color
    }
}

/// Build LLM provider from parameters
pub fn build_llm_provider(
    provider: Provider,
    api_key: Option<String>,
    model: String,
    ollama_url: String
) -> AppResult<LlmProvider> {
    match provider {
        Provider::OpenAI => {
            let key = api_key.ok_or_else(|| {
                config_error("API key required for OpenAI (use --api-key or LLM_API_KEY)")
            })?;
            Ok(LlmProvider::OpenAI {
                api_key: key,
                model
            })
        }
        Provider::Anthropic => {
            let key = api_key.ok_or_else(|| {
                config_error("API key required for Anthropic (use --api-key or LLM_API_KEY)")
            })?;
            Ok(LlmProvider::Anthropic {
                api_key: key,
                model
            })
        }
        Provider::Ollama => Ok(LlmProvider::Ollama {
            base_url: ollama_url,
            model
        })
    }
}

/// Check if LLM access is available
pub fn has_llm_access(api_key: &Option<String>, provider: &Provider) -> bool {
    api_key.is_some() || matches!(provider, Provider::Ollama)
}

/// Get effective model name
pub fn get_effective_model(
    model: Option<String>,
    config_model: Option<String>,
    provider: &Provider
) -> String {
    model
        .or(config_model)
        .unwrap_or_else(|| provider.default_model().to_string())
}

/// Get effective Ollama URL
pub fn get_effective_ollama_url(url: String, config_url: Option<String>) -> String {
    if url == "http://localhost:11434" {
        config_url.unwrap_or(url)
    } else {
        url
    }
}

/// Resolve the database path from CLI argument or config
pub fn resolve_db_path(cli_path: Option<String>, config: &Config) -> AppResult<String> {
    cli_path
        .or_else(|| config.database.path.clone())
        .ok_or_else(|| config_error("Database path required (use --db or SQL_CONSOLE_DB)"))
}

/// Resolve the schema path from CLI argument or config
pub fn resolve_schema_path(cli_path: Option<String>, config: &Config) -> Option<String> {
    cli_path.or_else(|| config.database.schema.clone())
}

/// Load the schema document, degrading to empty when no path is known
pub fn load_schema_doc(path: Option<&str>) -> SchemaDoc {
    match path {
        Some(path) => SchemaDoc::load(Path::new(path)),
        None => {
            eprintln!("Warning: no schema file configured; translating without schema context");
            SchemaDoc::default()
        }
    }
}

/// Build a scope from a preselected table list
pub fn build_scope(tables: &[String]) -> TableScope {
    let mut scope = TableScope::new();
    for table in tables {
        scope.toggle(table);
    }
    scope
}

/// Read the request from the argument or stdin
pub fn read_request_input(request: Option<String>) -> AppResult<String> {
    match request {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| file_read_error("stdin", e))?;
            Ok(buffer.trim().to_string())
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn build_translator(
    provider: Provider,
    api_key: Option<String>,
    model: String,
    ollama_url: String,
    config: &Config
) -> AppResult<QueryTranslator<LlmClient>> {
    let llm_provider = build_llm_provider(provider, api_key, model, ollama_url)?;
    let mut client = LlmClient::with_retry_config(llm_provider, config.retry.clone());
    if let Some(max_tokens) = config.llm.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }
    Ok(QueryTranslator::new(client))
}

/// Run the query command
///
/// Exit codes follow the outcome: 0 on success, 1 when no query was
/// generated, 2 when the database rejected the statement.
pub async fn run_query(params: QueryParams, config: Config) -> AppResult<i32> {
    let request = read_request_input(params.request)?;
    let scope = build_scope(&params.tables);
    let schema_path = resolve_schema_path(params.schema_path, &config);
    let opts = create_output_options(params.output_format, params.no_color);

    if params.dry_run {
        let schema = load_schema_doc(schema_path.as_deref());
        let system = build_system_instruction(&schema, &scope);
        println!("=== DRY RUN - Would send to LLM ===\n");
        println!("System instruction:\n{}\n", system);
        println!("User query:\n{}", request);
        return Ok(0);
    }

    let db_path = resolve_db_path(params.db_path, &config)?;
    let db = Database::open(Path::new(&db_path))?;

    let sql = if params.raw_sql {
        request
    } else {
        let effective_api_key = params.api_key.or(config.llm.api_key.clone());
        if !has_llm_access(&effective_api_key, &params.provider) {
            return Err(config_error(
                "API key required for translation (use --api-key or LLM_API_KEY)"
            ));
        }
        let model = get_effective_model(params.model, config.llm.model.clone(), &params.provider);
        let ollama_url = get_effective_ollama_url(params.ollama_url, config.llm.ollama_url.clone());
        let translator =
            build_translator(params.provider, effective_api_key, model, ollama_url, &config)?;
        let schema = load_schema_doc(schema_path.as_deref());
        let pb = spinner("Translating with LLM...");
        let translated = translator.translate(&schema, &request, &scope).await;
        pb.finish_and_clear();
        translated?
    };

    let outcome = db.execute(&sql);
    print!("{}", format_query_report(&sql, &outcome, &opts));
    Ok(match outcome {
        ExecutionOutcome::Success(_) => 0,
        ExecutionOutcome::NoQuery => 1,
        ExecutionOutcome::Failure(_) => 2
    })
}

#[derive(Debug, PartialEq)]
enum ReplAction {
    Continue,
    Quit
}

/// Run the interactive session
pub async fn run_repl(params: ReplParams, config: Config) -> AppResult<i32> {
    let db_path = resolve_db_path(params.db_path, &config)?;
    let db = Database::open(Path::new(&db_path))?;
    let schema_path = resolve_schema_path(params.schema_path, &config);
    let mut scope = build_scope(&params.tables);
    let mut view = ResultView::new();
    let opts = OutputOptions {
        format:  OutputFormat::Text,
        colored: !params.no_color
    };

    let effective_api_key = params.api_key.or(config.llm.api_key.clone());
    let translator = if has_llm_access(&effective_api_key, &params.provider) {
        let model = get_effective_model(params.model, config.llm.model.clone(), &params.provider);
        let ollama_url = get_effective_ollama_url(params.ollama_url, config.llm.ollama_url.clone());
        Some(build_translator(
            params.provider,
            effective_api_key,
            model,
            ollama_url,
            &config
        )?)
    } else {
        None
    };

    println!("Connected to {}", db_path);
    println!("Type a request in plain language, or .help for commands.");
    loop {
        print!("nl> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .map_err(|e| file_read_error("stdin", e))?;
        if read == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('.') {
            let action =
                handle_command(command, &db, schema_path.as_deref(), &mut scope, &mut view, &opts);
            if action == ReplAction::Quit {
                break;
            }
            continue;
        }
        let Some(translator) = &translator else {
            eprintln!("Note: set LLM_API_KEY for translation, or use .sql <statement>");
            continue;
        };
        // schema is re-read per request so edits land without a restart
        let schema = load_schema_doc(schema_path.as_deref());
        let pb = spinner("Translating...");
        let translated = translator.translate(&schema, line, &scope).await;
        pb.finish_and_clear();
        match translated {
            Ok(sql) => {
                let outcome = db.execute(&sql);
                view.present(&outcome);
                print!("{}", format_query_report(&sql, &outcome, &opts));
            }
            Err(e) => eprintln!("Translation failed: {}", e)
        }
    }
    Ok(0)
}

fn handle_command(
    command: &str,
    db: &Database,
    schema_path: Option<&str>,
    scope: &mut TableScope,
    view: &mut ResultView,
    opts: &OutputOptions
) -> ReplAction {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") | Some("exit") => return ReplAction::Quit,
        Some("help") => {
            println!(".tables [name ...]  list tables or toggle selection");
            println!(".scope              show the current selection");
            println!(".schema             print the flattened schema");
            println!(".sql <statement>    run a statement without translation");
            println!(".quit               leave the console");
        }
        Some("schema") => {
            let schema = load_schema_doc(schema_path);
            if schema.is_empty() {
                println!("(no schema loaded)");
            } else {
                println!("{}", schema.flattened());
            }
        }
        Some("scope") => {
            if scope.is_empty() {
                println!("(no tables selected)");
            } else {
                println!("{}", scope.selected().collect::<Vec<_>>().join(", "));
            }
        }
        Some("tables") => {
            let names: Vec<&str> = parts.collect();
            if names.is_empty() {
                let schema = load_schema_doc(schema_path);
                for name in schema.table_names() {
                    let marker = if scope.contains(name.as_str()) { "*" } else { " " };
                    println!("{} {}", marker, name);
                }
            } else {
                for name in names {
                    if scope.toggle(name) {
                        println!("+ {}", name);
                    } else {
                        println!("- {}", name);
                    }
                }
            }
        }
        Some("sql") => {
            let statement = command.strip_prefix("sql").unwrap_or("").trim();
            let outcome = db.execute(statement);
            view.present(&outcome);
            print!("{}", format_query_report(statement, &outcome, opts));
        }
        _ => println!("Unknown command: .{} (try .help)", command)
    }
    ReplAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    #[test]
    fn test_convert_format_text() {
        assert!(matches!(convert_format(Format::Text), OutputFormat::Text));
    }

    #[test]
    fn test_convert_format_json() {
        assert!(matches!(convert_format(Format::Json), OutputFormat::Json));
    }

    #[test]
    fn test_convert_format_yaml() {
        assert!(matches!(convert_format(Format::Yaml), OutputFormat::Yaml));
    }

    #[test]
    fn test_create_output_options_colored() {
        let opts = create_output_options(Format::Text, false);
        assert!(matches!(opts.format, OutputFormat::Text));
        assert!(opts.colored);
    }

    #[test]
    fn test_create_output_options_no_color() {
        let opts = create_output_options(Format::Json, true);
        assert!(matches!(opts.format, OutputFormat::Json));
        assert!(!opts.colored);
    }

    #[test]
    fn test_has_llm_access_with_api_key() {
        assert!(has_llm_access(&Some("key".to_string()), &Provider::OpenAI));
    }

    #[test]
    fn test_has_llm_access_ollama_no_key() {
        assert!(has_llm_access(&None, &Provider::Ollama));
    }

    #[test]
    fn test_has_llm_access_openai_no_key() {
        assert!(!has_llm_access(&None, &Provider::OpenAI));
    }

    #[test]
    fn test_has_llm_access_anthropic_no_key() {
        assert!(!has_llm_access(&None, &Provider::Anthropic));
    }

    #[test]
    fn test_get_effective_model_explicit() {
        let model = get_effective_model(Some("gpt-4o-mini".to_string()), None, &Provider::OpenAI);
        assert_eq!(model, "gpt-4o-mini");
    }

    #[test]
    fn test_get_effective_model_from_config() {
        let model = get_effective_model(None, Some("claude-3".to_string()), &Provider::Anthropic);
        assert_eq!(model, "claude-3");
    }

    #[test]
    fn test_get_effective_model_default() {
        let model = get_effective_model(None, None, &Provider::OpenAI);
        assert_eq!(model, "gpt-4o");
    }

    #[test]
    fn test_get_effective_ollama_url_explicit() {
        let url = get_effective_ollama_url(
            "http://custom:11434".to_string(),
            Some("http://other:11434".to_string())
        );
        assert_eq!(url, "http://custom:11434");
    }

    #[test]
    fn test_get_effective_ollama_url_from_config() {
        let url = get_effective_ollama_url(
            "http://localhost:11434".to_string(),
            Some("http://config:11434".to_string())
        );
        assert_eq!(url, "http://config:11434");
    }

    #[test]
    fn test_get_effective_ollama_url_default() {
        let url = get_effective_ollama_url("http://localhost:11434".to_string(), None);
        assert_eq!(url, "http://localhost:11434");
    }

    #[test]
    fn test_build_llm_provider_ollama() {
        let provider = build_llm_provider(
            Provider::Ollama,
            None,
            "llama3".to_string(),
            "http://localhost:11434".to_string()
        )
        .unwrap();
        assert!(matches!(provider, LlmProvider::Ollama { .. }));
    }

    #[test]
    fn test_build_llm_provider_openai_no_key() {
        let result = build_llm_provider(
            Provider::OpenAI,
            None,
            "gpt-4o".to_string(),
            "http://localhost:11434".to_string()
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_build_llm_provider_openai_with_key() {
        let provider = build_llm_provider(
            Provider::OpenAI,
            Some("sk-test".to_string()),
            "gpt-4o".to_string(),
            "http://localhost:11434".to_string()
        )
        .unwrap();
        assert!(matches!(provider, LlmProvider::OpenAI { .. }));
    }

    #[test]
    fn test_build_llm_provider_anthropic_no_key() {
        let result = build_llm_provider(
            Provider::Anthropic,
            None,
            "claude-3".to_string(),
            "http://localhost:11434".to_string()
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_db_path_from_cli() {
        let config = Config::default();
        let path = resolve_db_path(Some("cli.db".to_string()), &config).unwrap();
        assert_eq!(path, "cli.db");
    }

    fn config_with_db(path: &str) -> Config {
        Config {
            database: DatabaseConfig {
                path:   Some(path.to_string()),
                schema: None
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_db_path_from_config() {
        let config = config_with_db("config.db");
        let path = resolve_db_path(None, &config).unwrap();
        assert_eq!(path, "config.db");
    }

    #[test]
    fn test_resolve_db_path_missing() {
        let config = Config::default();
        assert!(resolve_db_path(None, &config).is_err());
    }

    #[test]
    fn test_resolve_db_path_cli_wins() {
        let config = config_with_db("config.db");
        let path = resolve_db_path(Some("cli.db".to_string()), &config).unwrap();
        assert_eq!(path, "cli.db");
    }

    #[test]
    fn test_resolve_schema_path_from_config() {
        let config = Config {
            database: DatabaseConfig {
                path:   None,
                schema: Some("schema.txt".to_string())
            },
            ..Default::default()
        };
        assert_eq!(
            resolve_schema_path(None, &config),
            Some("schema.txt".to_string())
        );
    }

    #[test]
    fn test_resolve_schema_path_none() {
        let config = Config::default();
        assert_eq!(resolve_schema_path(None, &config), None);
    }

    #[test]
    fn test_build_scope_from_list() {
        let scope = build_scope(&["film".to_string(), "actor".to_string()]);
        assert_eq!(scope.len(), 2);
        assert!(scope.contains("film"));
        assert!(scope.contains("actor"));
    }

    #[test]
    fn test_build_scope_duplicate_toggles_off() {
        let scope = build_scope(&["film".to_string(), "film".to_string()]);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_read_request_input_passthrough() {
        let text = read_request_input(Some("list actors".to_string())).unwrap();
        assert_eq!(text, "list actors");
    }

    #[test]
    fn test_load_schema_doc_missing_path() {
        let doc = load_schema_doc(Some("/nonexistent/schema.txt"));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_load_schema_doc_no_path() {
        let doc = load_schema_doc(None);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_query_params_debug() {
        let params = QueryParams {
            request:       Some("list actors".to_string()),
            db_path:       Some("sakila.db".to_string()),
            schema_path:   None,
            provider:      Provider::Ollama,
            api_key:       None,
            model:         None,
            ollama_url:    "http://localhost:11434".to_string(),
            output_format: Format::Text,
            tables:        Vec::new(),
            raw_sql:       false,
            dry_run:       false,
            no_color:      false
        };
        let debug = format!("{:?}", params);
        assert!(debug.contains("QueryParams"));
    }

    #[test]
    fn test_repl_params_clone() {
        let params = ReplParams {
            db_path:     Some("sakila.db".to_string()),
            schema_path: None,
            provider:    Provider::Ollama,
            api_key:     None,
            model:       None,
            ollama_url:  "http://localhost:11434".to_string(),
            tables:      Vec::new(),
            no_color:    false
        };
        let cloned = params.clone();
        assert_eq!(cloned.db_path, params.db_path);
    }
}
