//! Tasking agent: the orchestrator behind the chat endpoint.
//!
//! It decides from the wording of a message whether to (re)generate the spec, only
//! regenerate code, or just answer, then delegates code work to the coding agent.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::agents::coding::{pretty_json, CodingAgent};
use crate::agents::prompts::{
    EXISTING_SPEC_SECTION, REPLY_PROMPT_TEMPLATE, SPEC_PROMPT_TEMPLATE, TASKING_SYSTEM,
};
use crate::contract::extraction::{extract_with_fallback, ExtractionPath};
use crate::contract::models::{ContractLanguage, ContractSpec};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{Generator, LlmError};

const BUILD_KEYWORDS: &[&str] = &["create", "new", "build", "modify", "update", "change"];
const CODE_KEYWORD: &str = "code";
const QUESTION_KEYWORDS: &[&str] = &["explain", "what"];

/// What a chat message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Generate or revise the spec, then generate code.
    Build,
    /// Regenerate code from the current spec.
    CodeOnly,
    /// Answer without touching spec or code.
    Conversation,
}

/// Keyword classification. Matching is substring-based and checked in order, so
/// "what's new" is a build request. Anything unrecognized is a build request.
pub fn classify_intent(message: &str, has_spec: bool) -> Intent {
    let lower = message.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(BUILD_KEYWORDS) {
        Intent::Build
    } else if lower.contains(CODE_KEYWORD) {
        if has_spec {
            Intent::CodeOnly
        } else {
            Intent::Build
        }
    } else if mentions(QUESTION_KEYWORDS) {
        Intent::Conversation
    } else {
        Intent::Build
    }
}

/// A spec produced from one generator reply.
#[derive(Debug, Clone)]
pub struct SpecDraft {
    pub spec: ContractSpec,
    /// The generator text the spec was extracted from.
    pub raw_response: String,
    pub path: ExtractionPath,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub spec: Option<ContractSpec>,
    pub code: Option<String>,
    pub agent_message: String,
    pub language: ContractLanguage,
}

#[derive(Clone)]
pub struct TaskingAgent {
    generator: Arc<dyn Generator>,
    coding: CodingAgent,
}

impl TaskingAgent {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            coding: CodingAgent::new(generator.clone()),
            generator,
        }
    }

    pub fn coding(&self) -> &CodingAgent {
        &self.coding
    }

    /// Asks the generator for a spec and extracts it from the reply. Extraction never
    /// fails: when nothing usable comes back the fallback spec carries `user_prompt`
    /// as its description.
    pub async fn generate_spec(
        &self,
        user_prompt: &str,
        existing_spec: Option<&ContractSpec>,
    ) -> Result<SpecDraft, LlmError> {
        let existing = existing_spec
            .map(|spec| EXISTING_SPEC_SECTION.replace("{spec_json}", &pretty_json(spec)))
            .unwrap_or_default();
        let prompt = format!(
            "{}\n{}",
            SPEC_PROMPT_TEMPLATE
                .replace("{user_prompt}", user_prompt)
                .replace("{existing_spec}", &existing),
            JSON_ONLY_INSTRUCTION
        );

        let raw_response = self.generator.run(TASKING_SYSTEM, &prompt).await?;
        let extraction = extract_with_fallback::<ContractSpec>(raw_response.as_str(), user_prompt);

        match extraction.path {
            ExtractionPath::Fallback => warn!(
                "Spec extraction fell back to a placeholder spec ({} chars of generator output)",
                raw_response.len()
            ),
            path => info!(
                "Extracted spec '{}' ({path:?})",
                extraction.record.metadata.name
            ),
        }

        Ok(SpecDraft {
            spec: extraction.record,
            raw_response,
            path: extraction.path,
        })
    }

    /// Handles one chat message. Generator failures while producing the spec or a
    /// conversational reply are errors; a code generation failure is reported in
    /// `agent_message` and keeps `existing_code`.
    pub async fn process_message(
        &self,
        message: &str,
        existing_spec: Option<ContractSpec>,
        existing_code: Option<String>,
    ) -> Result<ChatOutcome, LlmError> {
        let intent = classify_intent(message, existing_spec.is_some());
        info!("Chat message classified as {intent:?}");

        if intent == Intent::Conversation {
            let prompt = REPLY_PROMPT_TEMPLATE.replace("{message}", message);
            let reply = self.generator.run(TASKING_SYSTEM, &prompt).await?;
            return Ok(ChatOutcome {
                language: existing_spec
                    .as_ref()
                    .map(|spec| spec.language)
                    .unwrap_or_default(),
                spec: existing_spec,
                code: existing_code,
                agent_message: reply.trim().to_string(),
            });
        }

        let (spec, mut agent_message) = match (intent, existing_spec) {
            (Intent::CodeOnly, Some(spec)) => (spec, String::new()),
            (_, existing) => {
                let draft = self.generate_spec(message, existing.as_ref()).await?;
                let note = format!(
                    "Generated contract specification for: {}",
                    draft.spec.metadata.name
                );
                (draft.spec, note)
            }
        };

        let language = spec.language;
        let code = match self.coding.generate_code(&spec, language).await {
            Ok(code) => {
                let note = format!("Generated {} code for the contract.", language.as_str());
                if agent_message.is_empty() {
                    agent_message = note;
                } else {
                    agent_message.push_str("\n\n");
                    agent_message.push_str(&note);
                }
                Some(code)
            }
            Err(e) => {
                warn!("Code generation failed: {e}");
                agent_message = format!(
                    "Generated specification, but encountered an error generating code: {e}"
                );
                existing_code
            }
        };

        Ok(ChatOutcome {
            spec: Some(spec),
            code,
            agent_message,
            language,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::extraction::{ExtractionSchema, FALLBACK_CONTRACT_NAME};
    use crate::llm_client::scripted::ScriptedGenerator;

    const TOKEN_SPEC: &str = r#"Here is the spec:
{"id": "c1", "metadata": {"name": "TokenContract", "symbol": "TKN"}, "language": "csharp"}"#;

    fn agent(generator: &Arc<ScriptedGenerator>) -> TaskingAgent {
        TaskingAgent::new(generator.clone())
    }

    #[test]
    fn test_classify_intent() {
        assert_eq!(classify_intent("Create a token", false), Intent::Build);
        assert_eq!(classify_intent("Please UPDATE the supply", true), Intent::Build);
        assert_eq!(classify_intent("show me the code", true), Intent::CodeOnly);
        assert_eq!(classify_intent("show me the code", false), Intent::Build);
        assert_eq!(classify_intent("explain the mint method", true), Intent::Conversation);
        assert_eq!(classify_intent("what does it do?", false), Intent::Conversation);
        assert_eq!(classify_intent("an NFT marketplace", false), Intent::Build);
    }

    #[test]
    fn test_build_keywords_win_over_questions() {
        assert_eq!(classify_intent("what's new here", true), Intent::Build);
    }

    #[tokio::test]
    async fn test_generate_spec_extracts_and_normalizes() {
        let generator = Arc::new(ScriptedGenerator::new([TOKEN_SPEC]));
        let draft = agent(&generator)
            .generate_spec("a token", None)
            .await
            .unwrap();

        assert_eq!(draft.path, ExtractionPath::Strict);
        assert_eq!(draft.spec.metadata.name, "TokenContract");
        assert_eq!(draft.spec.metadata.short_name.as_deref(), Some("TokenContrac"));
        assert_eq!(draft.spec.language, ContractLanguage::Csharp);
        assert_eq!(draft.raw_response, TOKEN_SPEC);

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("a token"));
        assert!(!prompt.contains("Existing specification"));
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_generate_spec_embeds_existing_spec() {
        let generator = Arc::new(ScriptedGenerator::new([TOKEN_SPEC]));
        let existing = ContractSpec::fallback("old");
        agent(&generator)
            .generate_spec("add a burn method", Some(&existing))
            .await
            .unwrap();

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Existing specification (modify or extend this):"));
        assert!(prompt.contains(&existing.id));
    }

    #[tokio::test]
    async fn test_generate_spec_falls_back_to_user_prompt() {
        let generator = Arc::new(ScriptedGenerator::new(["I can't produce JSON right now."]));
        let draft = agent(&generator)
            .generate_spec("a voting contract", None)
            .await
            .unwrap();

        assert_eq!(draft.path, ExtractionPath::Fallback);
        assert_eq!(draft.spec.metadata.name, FALLBACK_CONTRACT_NAME);
        assert_eq!(draft.spec.description(), Some("a voting contract"));
    }

    #[tokio::test]
    async fn test_generate_spec_propagates_generator_failure() {
        let generator = Arc::new(ScriptedGenerator::default().then_fail(503));
        let result = agent(&generator).generate_spec("a token", None).await;
        assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_process_message_builds_spec_and_code() {
        let generator = Arc::new(ScriptedGenerator::new([TOKEN_SPEC, "```csharp\nclass Token {}\n```"]));
        let outcome = agent(&generator)
            .process_message("create a token", None, None)
            .await
            .unwrap();

        assert_eq!(outcome.spec.unwrap().metadata.name, "TokenContract");
        assert_eq!(outcome.code.as_deref(), Some("class Token {}"));
        assert_eq!(outcome.language, ContractLanguage::Csharp);
        assert_eq!(
            outcome.agent_message,
            "Generated contract specification for: TokenContract\n\nGenerated csharp code for the contract."
        );
    }

    #[tokio::test]
    async fn test_process_message_code_only_reuses_existing_spec() {
        let generator = Arc::new(ScriptedGenerator::new(["def main(): pass"]));
        let existing = ContractSpec::fallback("a token");
        let outcome = agent(&generator)
            .process_message("regenerate the code", Some(existing.clone()), None)
            .await
            .unwrap();

        assert_eq!(generator.prompts().len(), 1);
        assert_eq!(outcome.spec, Some(existing));
        assert_eq!(outcome.code.as_deref(), Some("def main(): pass"));
        assert_eq!(outcome.agent_message, "Generated python code for the contract.");
    }

    #[tokio::test]
    async fn test_process_message_reports_code_failure_in_message() {
        let generator = Arc::new(ScriptedGenerator::new([TOKEN_SPEC]).then_fail(500));
        let outcome = agent(&generator)
            .process_message("build a token", None, Some("old code".to_string()))
            .await
            .unwrap();

        assert!(outcome.spec.is_some());
        assert_eq!(outcome.code.as_deref(), Some("old code"));
        assert!(outcome
            .agent_message
            .starts_with("Generated specification, but encountered an error generating code:"));
    }

    #[tokio::test]
    async fn test_process_message_conversation_keeps_spec_and_code() {
        let generator = Arc::new(ScriptedGenerator::new(["It mints tokens. "]));
        let existing = ContractSpec::fallback("a token");
        let outcome = agent(&generator)
            .process_message(
                "explain the mint method",
                Some(existing.clone()),
                Some("code".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.agent_message, "It mints tokens.");
        assert_eq!(outcome.spec, Some(existing));
        assert_eq!(outcome.code.as_deref(), Some("code"));
        assert_eq!(outcome.language, ContractLanguage::Python);
    }
}
