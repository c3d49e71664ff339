//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::calendar::{SlotStatus, UnlockPolicy};
use crate::domain::{Language, LessonRecord, MatchOutcome};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Calendar,
    SelectSlot {
        slot: u32,
    },
    ChangeLanguage {
        language: String,
    },
    SubmitTest {
        subject: String,
        #[serde(default)]
        pattern: Option<String>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Calendar {
        calendar: CalendarOut,
    },
    Lesson {
        lesson: LessonOut,
    },
    Example {
        #[serde(flatten)]
        example: ExampleOut,
    },
    TestResult {
        #[serde(flatten)]
        result: TestOut,
    },
    Error {
        message: String,
    },
}

/// Calendar grid as the presentation layer renders it.
#[derive(Debug, Serialize)]
pub struct CalendarOut {
    pub slots: Vec<SlotStatus>,
    #[serde(rename = "selectedSlot")]
    pub selected_slot: Option<u32>,
    #[serde(rename = "selectedLanguage")]
    pub selected_language: Language,
    pub languages: Vec<Language>,
    pub unlock: UnlockPolicy,
}

/// DTO used by both WS and HTTP for lesson delivery.
#[derive(Debug, Serialize)]
pub struct LessonOut {
    pub id: u32,
    pub title: String,
    pub pattern: String,
    pub description: String,
    pub language: Language,
    /// Example for `language`; `None` when this lesson has none for it.
    pub example: Option<String>,
    pub languages: Vec<Language>,
}

/// Convert a lesson (internal) to the public DTO for the selected language.
pub fn to_out(lesson: &LessonRecord, language: Language) -> LessonOut {
    LessonOut {
        id: lesson.id,
        title: lesson.title.clone(),
        pattern: lesson.pattern.clone(),
        description: lesson.description.clone(),
        language,
        example: lesson.example(language).map(str::to_string),
        languages: lesson.languages(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct LanguageIn {
    pub language: String,
}
#[derive(Debug, Serialize)]
pub struct ExampleOut {
    pub language: Language,
    pub example: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestIn {
    pub subject: String,
    /// Playground mode: test this pattern instead of the active lesson's.
    #[serde(default)]
    pub pattern: Option<String>,
}
#[derive(Debug, Serialize)]
pub struct TestOut {
    pub pattern: String,
    pub outcome: MatchOutcome,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub lessons: usize,
}
