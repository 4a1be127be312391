//! Structured contract specification produced by the spec agent and persisted
//! alongside conversations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length of `ContractMetadata::short_name`, in characters.
pub const SHORT_NAME_MAX_CHARS: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractLanguage {
    #[default]
    Python,
    Csharp,
}

impl ContractLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractLanguage::Python => "python",
            ContractLanguage::Csharp => "csharp",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractVariable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: String,
    /// Any JSON value: string, number, bool or object.
    #[serde(default)]
    pub initial_value: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMethod {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub params: Vec<MethodParam>,
    #[serde(default)]
    pub returns: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub params: Vec<MethodParam>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full contract specification. Immutable once returned by extraction:
/// revisions produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    pub id: String,
    pub metadata: ContractMetadata,
    #[serde(default)]
    pub variables: Vec<ContractVariable>,
    #[serde(default)]
    pub methods: Vec<ContractMethod>,
    #[serde(default)]
    pub events: Vec<ContractEvent>,
    #[serde(default)]
    pub permissions: Vec<PermissionRule>,
    #[serde(default)]
    pub language: ContractLanguage,
}

impl ContractSpec {
    /// The metadata description, if it is a non-blank string.
    pub fn description(&self) -> Option<&str> {
        self.metadata
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }
}

/// First `SHORT_NAME_MAX_CHARS` characters of `name`.
pub fn short_name_for(name: &str) -> String {
    name.chars().take(SHORT_NAME_MAX_CHARS).collect()
}
