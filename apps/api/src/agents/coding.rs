//! Coding agent: turns a contract spec into Neo contract source and reviews existing code.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::agents::prompts::{ANALYZE_PROMPT_TEMPLATE, CODE_PROMPT_TEMPLATE, CODING_SYSTEM};
use crate::contract::models::{ContractLanguage, ContractSpec};
use crate::llm_client::prompts::CODE_ONLY_INSTRUCTION;
use crate::llm_client::{strip_code_fences, Generator, LlmError};

#[derive(Debug, Clone, Serialize)]
pub struct CodeAnalysis {
    pub analysis: String,
    pub language: ContractLanguage,
}

#[derive(Clone)]
pub struct CodingAgent {
    generator: Arc<dyn Generator>,
}

impl CodingAgent {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Generates contract source for `spec`. Markdown fences around the reply are removed.
    pub async fn generate_code(
        &self,
        spec: &ContractSpec,
        language: ContractLanguage,
    ) -> Result<String, LlmError> {
        let prompt = format!(
            "{}\n{}",
            CODE_PROMPT_TEMPLATE
                .replace("{language}", language.as_str())
                .replace("{spec_json}", &pretty_json(spec)),
            CODE_ONLY_INSTRUCTION
        );

        let reply = self.generator.run(CODING_SYSTEM, &prompt).await?;
        let code = strip_code_fences(&reply).to_string();
        info!(
            "Generated {} code for {} ({} bytes)",
            language.as_str(),
            spec.metadata.name,
            code.len()
        );
        Ok(code)
    }

    pub async fn analyze_code(
        &self,
        code: &str,
        language: ContractLanguage,
    ) -> Result<CodeAnalysis, LlmError> {
        let prompt = ANALYZE_PROMPT_TEMPLATE
            .replace("{language}", language.as_str())
            .replace("{code}", code);
        let analysis = self.generator.run(CODING_SYSTEM, &prompt).await?;
        Ok(CodeAnalysis {
            analysis: analysis.trim().to_string(),
            language,
        })
    }
}

/// Pretty JSON for embedding in prompts.
pub(crate) fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
