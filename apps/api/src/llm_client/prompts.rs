// Shared prompt fragments.
// The advisor module defines its own prompts.rs for recommendation templates.

/// System prompt for small scoring and listing calls that must return bare JSON.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing instruction appended to every recommendation prompt.
pub const JSON_ONLY_INSTRUCTION: &str =
    "IMPORTANT: Your response must be valid JSON only, with no additional text before or after the JSON.";
