// Shared prompt constants.
// Each agent defines its own prompts alongside it; this file holds cross-cutting fragments.

/// Instruction appended to prompts that must come back as a single JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Return ONLY a valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Instruction appended to code-generation prompts.
pub const CODE_ONLY_INSTRUCTION: &str = "\
    Return ONLY the code, no markdown, no explanations.";
