// Prompt constants for the agents.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the tasking (orchestrator) agent.
pub const TASKING_SYSTEM: &str = "\
You are a Neo blockchain smart contract development orchestrator. \
Analyze user requirements and generate structured contract specifications, \
break complex tasks into manageable steps and give clear, helpful responses. \
A specification contains metadata (name, optional symbol, description), storage variables \
with types and initial values, public/private/admin methods with parameters and return types, \
events with parameters, access control rules, and a language: \"python\" or \"csharp\".";

/// System prompt for the coding agent.
pub const CODING_SYSTEM: &str = "\
You are an expert Neo blockchain smart contract developer. \
Generate clean, production-ready Neo N3 smart contract code (Python Boa or C#) and \
analyze existing code for issues, security vulnerabilities and improvements. \
Use proper Neo Boa syntax for Python contracts: the @public decorator for public methods \
and imports from boa3.builtin.*. \
Always return clean, executable code without markdown formatting unless asked otherwise.";

/// Spec prompt. Replace `{user_prompt}` and `{existing_spec}` before sending;
/// `{existing_spec}` is either empty or [`EXISTING_SPEC_SECTION`] filled in.
pub const SPEC_PROMPT_TEMPLATE: &str = r#"Generate a structured Neo smart contract specification based on this user requirement:

{user_prompt}
{existing_spec}
The JSON object must match this schema:
{
  "id": "unique-id",
  "metadata": {
    "name": "ContractName",
    "symbol": "SYMBOL",
    "description": "Description"
  },
  "variables": [
    {"id": "var1", "name": "variableName", "type": "str", "initialValue": "default"}
  ],
  "methods": [
    {
      "id": "method1",
      "name": "methodName",
      "visibility": "public",
      "params": [{"name": "param1", "type": "str"}],
      "returns": "bool",
      "description": "Method description"
    }
  ],
  "events": [],
  "permissions": [],
  "language": "python"
}
"#;

/// Replace `{spec_json}` before inserting into [`SPEC_PROMPT_TEMPLATE`].
pub const EXISTING_SPEC_SECTION: &str = "
Existing specification (modify or extend this):
{spec_json}
";

/// Code prompt. Replace `{language}` and `{spec_json}` before sending.
pub const CODE_PROMPT_TEMPLATE: &str = "\
Generate Neo smart contract code ({language}) based on this specification:

{spec_json}

Use proper Neo Boa syntax:
- Use @public decorator for public methods
- Import from boa3.builtin.*
- Follow Neo N3 smart contract patterns
- Include proper error handling
";

/// Analysis prompt. Replace `{language}` and `{code}` before sending.
pub const ANALYZE_PROMPT_TEMPLATE: &str = "\
Analyze this Neo smart contract code ({language}):

{code}

Provide analysis including:
- Code quality and best practices
- Potential security issues
- Neo-specific pattern compliance
- Suggestions for improvement
- Any missing error handling or validation
";

/// Conversational reply prompt. Replace `{message}` before sending.
pub const REPLY_PROMPT_TEMPLATE: &str = "\
User message: {message}

Provide a helpful response about the contract or code. Be conversational and helpful.";
