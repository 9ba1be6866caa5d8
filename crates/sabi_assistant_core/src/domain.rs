//! crates/sabi_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// A registered user account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub account_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// One recorded request/reply pair. Append-only: an exchange is written
/// exactly once per completed round-trip and never mutated.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub id: i64,
    pub account_id: Option<i64>,
    pub mode: Mode,
    pub language: Language,
    pub message: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

/// An exchange count for a single mode, as returned by the usage report.
#[derive(Debug, Clone)]
pub struct ModeCount {
    pub mode: Mode,
    pub count: i64,
}

//=========================================================================================
// Modes and Languages
//=========================================================================================

/// An assistant persona. Each mode selects one fixed instruction template;
/// `General` is the fallback persona for tags the service does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    ScamCheck,
    Cybersecurity,
    StudyHelp,
    ExamSimulation,
    CareerSuggestion,
    CasualChat,
    LifeAdvice,
    General,
}

// The single source of truth for modes: (mode, wire tag, instruction).
// Adding a persona is one new row here.
const MODE_TABLE: &[(Mode, &str, &str)] = &[
    (
        Mode::ScamCheck,
        "scam-check",
        "Scan the message or link and check whether it is a scam or phishing attempt. \
         Be detailed and give a safety score from 0 to 100.",
    ),
    (
        Mode::Cybersecurity,
        "cybersecurity-advice",
        "Give detailed and practical cybersecurity tips related to the message.",
    ),
    (
        Mode::StudyHelp,
        "study-help",
        "You are an educational assistant. Help the student by providing accurate \
         and supportive information.",
    ),
    (
        Mode::ExamSimulation,
        "exam-simulation",
        "You are simulating an exam assistant. Treat the user input like an \
         exam-style question and explain the correct answer clearly.",
    ),
    (
        Mode::CareerSuggestion,
        "career-suggestion",
        "Based on the user's background, suggest three suitable job roles and \
         explain professionally why each one fits.",
    ),
    (
        Mode::CasualChat,
        "casual-chat",
        "You are a smart, witty and funny chatbot. Respond casually and helpfully.",
    ),
    (
        Mode::LifeAdvice,
        "life-advice",
        "You are a wise advisor. Give general life advice based on what the user \
         is asking.",
    ),
    (Mode::General, "general", "Be helpful."),
];

impl Mode {
    /// Parses a wire tag. Unknown tags fall back to the `General` persona.
    pub fn from_tag(tag: &str) -> Self {
        MODE_TABLE
            .iter()
            .find(|(_, t, _)| tag.eq_ignore_ascii_case(t))
            .map(|(mode, _, _)| *mode)
            .unwrap_or(Mode::General)
    }

    pub fn as_tag(&self) -> &'static str {
        MODE_TABLE
            .iter()
            .find(|(mode, _, _)| mode == self)
            .map(|(_, tag, _)| *tag)
            .unwrap_or("general")
    }

    /// The fixed instruction template for this persona.
    pub fn instruction(&self) -> &'static str {
        MODE_TABLE
            .iter()
            .find(|(mode, _, _)| mode == self)
            .map(|(_, _, instruction)| *instruction)
            .unwrap_or("Be helpful.")
    }
}

/// The reply language, selecting a preface sentence appended to every prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Pidgin,
}

const LANGUAGE_TABLE: &[(Language, &str, &str)] = &[
    (Language::English, "english", "Respond in English."),
    (
        Language::Pidgin,
        "pidgin",
        "Respond strictly in Nigerian Pidgin English. Keep it natural and easy \
         for locals to follow.",
    ),
];

impl Language {
    /// Parses a wire tag. Unknown tags fall back to English.
    pub fn from_tag(tag: &str) -> Self {
        LANGUAGE_TABLE
            .iter()
            .find(|(_, t, _)| tag.eq_ignore_ascii_case(t))
            .map(|(language, _, _)| *language)
            .unwrap_or(Language::English)
    }

    pub fn as_tag(&self) -> &'static str {
        LANGUAGE_TABLE
            .iter()
            .find(|(language, _, _)| language == self)
            .map(|(_, tag, _)| *tag)
            .unwrap_or("english")
    }

    pub fn preface(&self) -> &'static str {
        LANGUAGE_TABLE
            .iter()
            .find(|(language, _, _)| language == self)
            .map(|(_, _, preface)| *preface)
            .unwrap_or("Respond in English.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_tags_round_trip() {
        for (mode, tag, _) in MODE_TABLE {
            assert_eq!(Mode::from_tag(tag), *mode);
            assert_eq!(mode.as_tag(), *tag);
        }
    }

    #[test]
    fn unknown_mode_falls_back_to_general() {
        assert_eq!(Mode::from_tag("time-travel"), Mode::General);
        assert_eq!(Mode::from_tag(""), Mode::General);
        assert_eq!(Mode::General.instruction(), "Be helpful.");
    }

    #[test]
    fn mode_tag_parsing_is_case_insensitive() {
        assert_eq!(Mode::from_tag("Scam-Check"), Mode::ScamCheck);
        assert_eq!(Mode::from_tag("CASUAL-CHAT"), Mode::CasualChat);
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        assert_eq!(Language::from_tag("klingon"), Language::English);
        assert_eq!(Language::from_tag("pidgin"), Language::Pidgin);
        assert_eq!(Language::from_tag("PIDGIN"), Language::Pidgin);
    }

    #[test]
    fn every_mode_has_a_distinct_tag() {
        for (i, (_, tag_a, _)) in MODE_TABLE.iter().enumerate() {
            for (_, tag_b, _) in &MODE_TABLE[i + 1..] {
                assert_ne!(tag_a, tag_b);
            }
        }
    }
}
