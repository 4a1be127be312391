//! Extraction pipeline — turns free-form generator output into a validated record.
//!
//! Stages, first success wins:
//!
//! ```text
//! SEARCH -> PARSE -> VALIDATE -> done
//!             |
//!             +--(parse failed)--> REPAIR -> PARSE -> VALIDATE -> done
//!
//! any failure with no repair budget left -> FALLBACK -> done
//! ```
//!
//! `extract` never fails: the fallback record is always schema-valid and keeps the
//! original text in its description so nothing the generator said is lost.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contract::models::{short_name_for, ContractLanguage, ContractMetadata, ContractSpec};
use crate::llm_client::LlmResponse;

/// Heuristic repair passes allowed per extraction.
const MAX_REPAIR_PASSES: u8 = 1;
/// Nesting depth past which the brace scanner gives up on a candidate.
const MAX_BRACE_DEPTH: usize = 64;
/// Contract name used by the fallback record.
pub const FALLBACK_CONTRACT_NAME: &str = "GeneratedContract";

// ────────────────────────────────────────────────────────────────────────────
// Input normalization
// ────────────────────────────────────────────────────────────────────────────

/// Anything a generator can hand back: plain text or a response object that
/// exposes its text through a `content`/`text` field.
pub trait GeneratorText {
    fn generator_text(&self) -> String;
}

impl GeneratorText for str {
    fn generator_text(&self) -> String {
        self.to_string()
    }
}

impl GeneratorText for String {
    fn generator_text(&self) -> String {
        self.clone()
    }
}

impl GeneratorText for LlmResponse {
    fn generator_text(&self) -> String {
        self.text().unwrap_or_default().to_string()
    }
}

impl GeneratorText for Value {
    fn generator_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Object(map) => ["content", "text"]
                .iter()
                .find_map(|field| map.get(*field).and_then(text_of))
                .unwrap_or_else(|| self.to_string()),
            other => other.to_string(),
        }
    }
}

/// Text held by a `content`/`text` field: a string, or the first text block of
/// an array of `{type, text}` blocks.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(blocks) => blocks
            .iter()
            .find_map(|b| b.get("text").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Target schema
// ────────────────────────────────────────────────────────────────────────────

/// A record type the pipeline can extract.
pub trait ExtractionSchema: DeserializeOwned + Sized {
    /// Fills derived fields generators commonly omit, before typed decoding.
    fn normalize(value: &mut Map<String, Value>);

    /// Checks constraints that typed decoding cannot express.
    fn validate(&self) -> Result<(), String>;

    /// Minimal valid record carrying `original` so it is not lost.
    fn fallback(original: &str) -> Self;
}

impl ExtractionSchema for ContractSpec {
    fn normalize(value: &mut Map<String, Value>) {
        if let Some(Value::Object(metadata)) = value.get_mut("metadata") {
            let missing_short_name = matches!(metadata.get("shortName"), None | Some(Value::Null));
            if missing_short_name {
                if let Some(name) = metadata.get("name").and_then(Value::as_str) {
                    let short_name = short_name_for(name);
                    metadata.insert("shortName".to_string(), Value::String(short_name));
                }
            }
        }

        if matches!(value.get("id"), None | Some(Value::Null)) {
            value.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id is empty".to_string());
        }
        if self.metadata.name.trim().is_empty() {
            return Err("metadata.name is empty".to_string());
        }
        Ok(())
    }

    fn fallback(original: &str) -> Self {
        ContractSpec {
            id: Uuid::new_v4().to_string(),
            metadata: ContractMetadata {
                name: FALLBACK_CONTRACT_NAME.to_string(),
                symbol: None,
                description: Some(original.to_string()),
                short_name: Some(short_name_for(FALLBACK_CONTRACT_NAME)),
            },
            variables: vec![],
            methods: vec![],
            events: vec![],
            permissions: vec![],
            language: ContractLanguage::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Which stage produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Strict,
    Repaired,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Extraction<S> {
    pub record: S,
    pub path: ExtractionPath,
}

enum Stage<S> {
    Search,
    Parse { candidate: String, repairs: u8 },
    Validate { object: Map<String, Value>, repairs: u8 },
    Repair { candidate: String, repairs: u8 },
    Fallback,
    Done(Extraction<S>),
}

/// Extracts a record from generator output. The fallback record describes
/// itself with the generator text.
pub fn extract<S: ExtractionSchema>(raw: &(impl GeneratorText + ?Sized)) -> Extraction<S> {
    let text = raw.generator_text();
    run_pipeline(&text, &text)
}

/// Like [`extract`], but the fallback record carries `fallback_source`
/// (typically the user's request) instead of the generator text.
pub fn extract_with_fallback<S: ExtractionSchema>(
    raw: &(impl GeneratorText + ?Sized),
    fallback_source: &str,
) -> Extraction<S> {
    let text = raw.generator_text();
    run_pipeline(&text, fallback_source)
}

fn run_pipeline<S: ExtractionSchema>(text: &str, fallback_source: &str) -> Extraction<S> {
    let mut stage = Stage::Search;

    loop {
        stage = match stage {
            Stage::Search => match locate_object(text) {
                Some(candidate) => Stage::Parse {
                    candidate: candidate.to_string(),
                    repairs: 0,
                },
                None => {
                    debug!("No JSON object found in generator output");
                    Stage::Fallback
                }
            },
            Stage::Parse { candidate, repairs } => {
                match serde_json::from_str::<Value>(&candidate) {
                    Ok(Value::Object(object)) => Stage::Validate { object, repairs },
                    Ok(_) => Stage::Fallback,
                    Err(e) => {
                        debug!("Strict parse failed: {e}");
                        Stage::Repair { candidate, repairs }
                    }
                }
            }
            Stage::Validate { mut object, repairs } => {
                S::normalize(&mut object);
                match serde_json::from_value::<S>(Value::Object(object))
                    .map_err(|e| e.to_string())
                    .and_then(|record| record.validate().map(|()| record))
                {
                    Ok(record) => Stage::Done(Extraction {
                        record,
                        path: if repairs == 0 {
                            ExtractionPath::Strict
                        } else {
                            ExtractionPath::Repaired
                        },
                    }),
                    Err(reason) => {
                        warn!("Extracted record failed validation: {reason}");
                        Stage::Fallback
                    }
                }
            }
            Stage::Repair { candidate, repairs } => {
                if repairs >= MAX_REPAIR_PASSES {
                    Stage::Fallback
                } else {
                    Stage::Parse {
                        candidate: repair_quotes(&candidate),
                        repairs: repairs + 1,
                    }
                }
            }
            Stage::Fallback => {
                warn!("Structured extraction failed; using fallback record");
                Stage::Done(Extraction {
                    record: S::fallback(fallback_source),
                    path: ExtractionPath::Fallback,
                })
            }
            Stage::Done(extraction) => return extraction,
        };
    }
}

/// Single repair heuristic: single quotes become the double quotes JSON expects.
fn repair_quotes(candidate: &str) -> String {
    candidate.replace('\'', "\"")
}

enum Scan {
    Closed(usize),
    Unclosed,
    TooDeep,
}

/// Locates the first brace-delimited object in `text`.
///
/// The scanner tracks double-quoted strings so braces inside string values do not
/// count. If the first object never closes, the span from the first `{` to the
/// last `}` is used instead.
fn locate_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let tail = &text[start..];
    match scan_balanced(tail) {
        Scan::Closed(end) => Some(&tail[..end]),
        Scan::TooDeep => None,
        Scan::Unclosed => {
            let last = tail.rfind('}')?;
            Some(&tail[..=last])
        }
    }
}

/// `text` must start with `{`. Returns the byte length of the balanced object.
fn scan_balanced(text: &str) -> Scan {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => {
                depth += 1;
                if depth > MAX_BRACE_DEPTH {
                    return Scan::TooDeep;
                }
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Scan::Closed(i + 1);
                }
            }
            _ => {}
        }
    }
    Scan::Unclosed
}
