//! Prompt construction and reply cleanup for the reasoning backend

use std::fmt::Write as _;

use crate::intent::Action;

/// Build the fixed instruction preamble: persona framing, output shape and
/// the capability catalogue
#[must_use]
pub fn instruction_preamble(assistant_name: &str) -> String {
    let mut preamble = format!(
        "You are {assistant_name}, a desktop voice assistant. Your job is to understand user \
         commands and generate structured execution plans.

Analyze the user's command and respond with ONLY a JSON object in this format:
{{
    \"intent\": \"brief description of what user wants\",
    \"action\": \"PRIMARY_ACTION_TYPE\",
    \"parameters\": {{
        \"key\": \"value\"
    }},
    \"response\": \"Natural language response to speak to user\"
}}

Available PRIMARY_ACTION_TYPES:
"
    );

    for action in Action::ALL {
        let _ = writeln!(preamble, "- {}: {}", action.as_str(), action.description());
    }

    preamble.push_str("\nParameter examples:\n");
    for action in Action::ALL {
        if let Some(hint) = action.parameter_hint() {
            let _ = writeln!(preamble, "- For {}: {hint}", action.as_str());
        }
    }

    preamble.push_str("\nRespond ONLY with valid JSON, no other text.");
    preamble
}

/// Combine the preamble with one user command
#[must_use]
pub fn command_prompt(preamble: &str, command: &str) -> String {
    format!("{preamble}\n\nUser command: {command}\n\nRespond with JSON:")
}

/// Persona-only prompt for free-form chat
#[must_use]
pub fn chat_prompt(assistant_name: &str, message: &str) -> String {
    format!(
        "You are {assistant_name}, a helpful desktop voice assistant. \
         Respond naturally and briefly to: {message}"
    )
}

/// Remove a surrounding code fence and its optional `json` language tag
///
/// Replies that already start with `{` are returned trimmed but otherwise
/// untouched, so fences inside JSON string values survive. Stray text before
/// the opening fence or after the closing one is dropped.
#[must_use]
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let body = &trimmed[open + 3..];
    let body = body.find("```").map_or(body, |close| &body[..close]);
    let body = body.trim_start();
    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };

    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECT: &str = r#"{"action":"SEARCH_WEB","parameters":{"query":"rust"}}"#;

    #[test]
    fn test_preamble_lists_every_action() {
        let preamble = instruction_preamble("Goku");

        assert!(preamble.starts_with("You are Goku"));
        for action in Action::ALL {
            assert!(preamble.contains(action.as_str()), "missing {action}");
        }
        assert!(preamble.contains(r#"- For CREATE_FILE: {"path""#));
        assert!(preamble.ends_with("no other text."));
    }

    #[test]
    fn test_command_prompt_appends_command() {
        let prompt = command_prompt("PREAMBLE", "open notepad");
        assert_eq!(prompt, "PREAMBLE\n\nUser command: open notepad\n\nRespond with JSON:");
    }

    #[test]
    fn test_chat_prompt_has_persona() {
        let prompt = chat_prompt("Goku", "how are you?");
        assert!(prompt.starts_with("You are Goku"));
        assert!(prompt.ends_with("how are you?"));
    }

    #[test]
    fn test_strip_fenced_with_language_tag() {
        let reply = format!("```json\n{OBJECT}\n```");
        assert_eq!(strip_code_fences(&reply), OBJECT);
    }

    #[test]
    fn test_strip_fenced_without_language_tag() {
        let reply = format!("```\n{OBJECT}\n```\n");
        assert_eq!(strip_code_fences(&reply), OBJECT);
    }

    #[test]
    fn test_strip_surrounding_text() {
        let reply = format!("Here is the plan:\n```JSON\n{OBJECT}\n```\nHope that helps!");
        assert_eq!(strip_code_fences(&reply), OBJECT);
    }

    #[test]
    fn test_strip_is_idempotent() {
        let reply = format!("```json\n{OBJECT}\n```");
        let once = strip_code_fences(&reply);
        assert_eq!(strip_code_fences(once), once);
        assert_eq!(strip_code_fences(OBJECT), OBJECT);
    }

    #[test]
    fn test_fences_inside_json_strings_survive() {
        let reply = r#"  {"action":"CREATE_FILE","parameters":{"content":"```rust\nfn main() {}\n```"}}  "#;
        assert_eq!(strip_code_fences(reply), reply.trim());
    }

    #[test]
    fn test_unterminated_fence() {
        let reply = format!("```json\n{OBJECT}");
        assert_eq!(strip_code_fences(&reply), OBJECT);
    }
}
