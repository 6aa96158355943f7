//! Builds the two-message conversation handed to the agent.

use crate::types::ModelMessage;

/// Fixed instruction for every conversation.
pub const SYSTEM_PROMPT: &str = "\
You are a helpful agricultural assistant for farmers in Pakistan.
You explain the usage, safety, and crop compatibility of agricultural chemicals
like pesticides, herbicides, and fertilizers.

Inputs you may receive:
- Text from OCR (e.g., label details)
- Farmer's voice query or typed question

Your goals:
1. Identify the chemical or fertilizer.
2. Explain its purpose and safe usage.
3. Warn about hazards or misuse risks.
4. If uncertain, use web_search_tool once for reliable agricultural sources.
5. Keep your answer simple, short, and practical.
";

/// Label OCR text and the farmer's question into one user input.
/// Empty sections are kept so the model sees which input was missing.
pub fn combine_inputs(ocr_text: &str, farmer_query: &str) -> String {
    format!("OCR Text:\n{ocr_text}\n\nFarmer Query:\n{farmer_query}")
}

/// System instruction followed by the user input, verbatim. Messages carry
/// no timestamp, so equal inputs give equal conversations.
pub fn build_conversation(user_input: impl Into<String>) -> Vec<ModelMessage> {
    vec![
        ModelMessage::system(SYSTEM_PROMPT).untimed(),
        ModelMessage::user(user_input).untimed(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use pretty_assertions::assert_eq;

    #[test]
    fn conversation_is_system_then_user() {
        let messages = build_conversation("What is urea?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].text(), SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].text(), "What is urea?");
    }

    #[test]
    fn same_input_gives_equal_conversations() {
        let first = build_conversation("What is urea?");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = build_conversation("What is urea?");
        assert_eq!(first, second);
        assert!(first.iter().all(|m| m.timestamp.is_none()));
    }

    #[test]
    fn combined_input_keeps_empty_sections() {
        assert_eq!(
            combine_inputs("", "How much DAP per acre?"),
            "OCR Text:\n\n\nFarmer Query:\nHow much DAP per acre?"
        );
        assert_eq!(combine_inputs("", ""), "OCR Text:\n\n\nFarmer Query:\n");
    }

    #[test]
    fn prompt_names_the_search_tool() {
        assert!(SYSTEM_PROMPT.contains(crate::tools::SEARCH_TOOL_NAME));
    }
}
