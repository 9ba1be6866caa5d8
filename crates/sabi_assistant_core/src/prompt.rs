//! crates/sabi_assistant_core/src/prompt.rs
//!
//! The prompt builder: maps (mode, language, user text) to the final
//! instruction string sent to the completion gateway.

use crate::domain::{Language, Mode};

// The persona, mode, instruction and language preface all come before the
// user text, and the user text sits inside a delimited block. The model must
// read its instructions before any user-controlled content; this limits how
// far an injected "ignore previous instructions" can reach.
pub const PROMPT_TEMPLATE: &str = "You are Sabi, a multi-mode personal assistant.
Mode: {mode}

{instruction}
{preface}

USER MESSAGE:
---
{message}
---";

/// Builds the full prompt for one submission. Deterministic: the same
/// (mode, language, text) triple always yields the same string.
#[allow(clippy::literal_string_with_formatting_args)]
pub fn build_prompt(mode: Mode, language: Language, user_text: &str) -> String {
    // {message} is substituted last so placeholder-looking fragments inside
    // the user text are never expanded.
    PROMPT_TEMPLATE
        .replace("{mode}", mode.as_tag())
        .replace("{instruction}", mode.instruction())
        .replace("{preface}", language.preface())
        .replace("{message}", user_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_user_text_verbatim() {
        let text = "Is this link safe? http://example.com/win-a-prize";
        let prompt = build_prompt(Mode::ScamCheck, Language::English, text);
        assert!(prompt.contains(text));
    }

    #[test]
    fn instruction_precedes_user_text() {
        let text = "my question";
        for (mode, language) in [
            (Mode::ScamCheck, Language::English),
            (Mode::CasualChat, Language::Pidgin),
            (Mode::General, Language::English),
        ] {
            let prompt = build_prompt(mode, language, text);
            let instruction_at = prompt.find(mode.instruction()).unwrap();
            let preface_at = prompt.find(language.preface()).unwrap();
            let text_at = prompt.find(text).unwrap();
            assert!(instruction_at < text_at);
            assert!(preface_at < text_at);
        }
    }

    #[test]
    fn unknown_mode_gets_generic_instruction() {
        let prompt = build_prompt(Mode::from_tag("no-such-mode"), Language::English, "hi");
        assert!(prompt.contains("Be helpful."));
        assert!(prompt.contains("Mode: general"));
    }

    #[test]
    fn unknown_language_gets_english_preface() {
        let prompt = build_prompt(Mode::CasualChat, Language::from_tag("??"), "hi");
        assert!(prompt.contains("Respond in English."));
    }

    #[test]
    fn placeholders_in_user_text_stay_literal() {
        let text = "what does {instruction} mean?";
        let prompt = build_prompt(Mode::StudyHelp, Language::English, text);
        assert!(prompt.contains(text));
    }

    #[test]
    fn template_has_all_placeholders() {
        for placeholder in ["{mode}", "{instruction}", "{preface}", "{message}"] {
            assert!(PROMPT_TEMPLATE.contains(placeholder));
        }
    }
}
