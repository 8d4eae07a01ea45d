//! Natural-language to SQL translation.
//!
//! The translator builds one system instruction from the flattened schema
//! document plus a directive to emit bare SQL, sends it together with the
//! user's request as a two-message exchange, and returns the trimmed
//! completion text. The service is non-deterministic; the contract only
//! guarantees syntactic plausibility, and downstream execution is the real
//! validator.
//!
//! An empty completion is a legitimate answer: the instruction tells the
//! model to emit nothing when the request falls outside the schema, and the
//! executor maps that to a "no query generated" outcome instead of running
//! an empty statement.

use std::future::Future;

use crate::{error::AppResult, schema::SchemaDoc, scope::TableScope};

/// Transport seam between prompt construction and a completion service.
///
/// Implemented by [`crate::llm::LlmClient`]; tests substitute a
/// deterministic stub so translation is reproducible.
pub trait CompletionBackend {
    /// Send one system instruction plus one user message and return the
    /// first choice's content.
    fn complete(&self, system: &str, user: &str) -> impl Future<Output = AppResult<String>>;
}

/// Turns natural-language requests into SQL text via a completion backend.
pub struct QueryTranslator<B> {
    backend: B
}

impl<B: CompletionBackend> QueryTranslator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Translate one natural-language request into SQL text.
    ///
    /// Returns an empty string when the model judges the request out of
    /// scope. Transport failures surface as translation errors, never as
    /// execution failures.
    pub async fn translate(
        &self,
        schema: &SchemaDoc,
        user_query: &str,
        scope: &TableScope
    ) -> AppResult<String> {
        let system = build_system_instruction(schema, scope);
        let raw = self.backend.complete(&system, user_query).await?;
        Ok(strip_code_fence(raw.trim()).trim().to_string())
    }
}

/// Build the system instruction from the schema document and scope.
///
/// A non-empty scope narrows the embedded schema to the selected tables and
/// appends an explicit restriction clause.
pub fn build_system_instruction(schema: &SchemaDoc, scope: &TableScope) -> String {
    let schema_text = schema.filtered(scope).flattened();
    let mut instruction = format!(
        "Generate only the SQL query based on the database schema: {} \
         Do not provide any explanation, just the SQL code. \
         Do not add any markdown syntax. Only provide the SQL code. \
         If the user requests something outside the defined schema, \
         try to find the closest match; if none exists, provide an empty output.",
        schema_text
    );
    if !scope.is_empty() {
        let tables: Vec<&str> = scope.selected().collect();
        instruction.push_str(&format!(
            " Restrict the query to these tables: {}.",
            tables.join(", ")
        ));
    }
    instruction
}

/// Strip one surrounding markdown code fence, if present.
///
/// Models occasionally wrap output in fences despite the instruction.
fn strip_code_fence(text: &str) -> &str {
    let inner = if let Some(rest) = text.strip_prefix("```sql") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };
    inner.strip_suffix("```").unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::translation_error;

    struct StubBackend {
        reply: String
    }

    impl CompletionBackend for StubBackend {
        async fn complete(&self, _system: &str, _user: &str) -> AppResult<String> {
            Ok(self.reply.clone())
        }
    }

    struct FailingBackend;

    impl CompletionBackend for FailingBackend {
        async fn complete(&self, _system: &str, _user: &str) -> AppResult<String> {
            Err(translation_error("service unreachable"))
        }
    }

    fn schema() -> SchemaDoc {
        SchemaDoc::from_text(
            "CREATE TABLE actor (actor_id INT, name TEXT);\n\
             CREATE TABLE film (film_id INT, title TEXT);"
        )
    }

    #[test]
    fn test_instruction_contains_schema_and_directives() {
        let instruction = build_system_instruction(&schema(), &TableScope::new());
        assert!(instruction.contains("CREATE TABLE actor"));
        assert!(instruction.contains("CREATE TABLE film"));
        assert!(instruction.contains("just the SQL code"));
        assert!(instruction.contains("empty output"));
        assert!(!instruction.contains("Restrict the query"));
    }

    #[test]
    fn test_instruction_with_scope_narrows_schema() {
        let mut scope = TableScope::new();
        scope.toggle("film");
        let instruction = build_system_instruction(&schema(), &scope);
        assert!(instruction.contains("CREATE TABLE film"));
        assert!(!instruction.contains("CREATE TABLE actor"));
        assert!(instruction.contains("Restrict the query to these tables: film."));
    }

    #[test]
    fn test_instruction_empty_schema_still_valid() {
        let instruction = build_system_instruction(&SchemaDoc::default(), &TableScope::new());
        assert!(instruction.contains("just the SQL code"));
    }

    #[tokio::test]
    async fn test_translate_trims_reply() {
        let translator = QueryTranslator::new(StubBackend {
            reply: "  SELECT * FROM actor;\n".to_string()
        });
        let sql = translator
            .translate(&schema(), "show all actors", &TableScope::new())
            .await
            .unwrap();
        assert_eq!(sql, "SELECT * FROM actor;");
    }

    #[tokio::test]
    async fn test_translate_strips_code_fence() {
        let translator = QueryTranslator::new(StubBackend {
            reply: "```sql\nSELECT title FROM film\n```".to_string()
        });
        let sql = translator
            .translate(&schema(), "film titles", &TableScope::new())
            .await
            .unwrap();
        assert_eq!(sql, "SELECT title FROM film");
    }

    #[tokio::test]
    async fn test_translate_strips_bare_fence() {
        let translator = QueryTranslator::new(StubBackend {
            reply: "```\nSELECT 1\n```".to_string()
        });
        let sql = translator
            .translate(&schema(), "one", &TableScope::new())
            .await
            .unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[tokio::test]
    async fn test_translate_is_deterministic_with_stub() {
        let translator = QueryTranslator::new(StubBackend {
            reply: "SELECT name FROM actor".to_string()
        });
        let first = translator
            .translate(&schema(), "actor names", &TableScope::new())
            .await
            .unwrap();
        let second = translator
            .translate(&schema(), "actor names", &TableScope::new())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_translate_empty_reply_stays_empty() {
        let translator = QueryTranslator::new(StubBackend {
            reply: String::new()
        });
        let sql = translator
            .translate(&schema(), "launch the missiles", &TableScope::new())
            .await
            .unwrap();
        assert!(sql.is_empty());
    }

    #[tokio::test]
    async fn test_translate_propagates_backend_failure() {
        let translator = QueryTranslator::new(FailingBackend);
        let result = translator
            .translate(&schema(), "anything", &TableScope::new())
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_strip_code_fence_passthrough() {
        assert_eq!(strip_code_fence("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_strip_code_fence_unterminated() {
        assert_eq!(strip_code_fence("```sql\nSELECT 1").trim(), "SELECT 1");
    }
}
