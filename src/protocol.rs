//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumChapter;
use crate::domain::{Operator, Problem, WrongProblem};
use crate::store::{ProgressInput, ProgressRecord, Streak};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewProblem {
        #[serde(flatten)]
        query: ProblemQuery,
    },
    RandomProblem {
        level: Option<f64>,
    },
    ChapterProblem {
        #[serde(rename = "chapterId")]
        chapter_id: String,
        #[serde(default)]
        mode: Option<String>,
    },
    SubmitAnswer {
        #[serde(flatten)]
        body: AnswerIn,
    },
    SimilarProblem {
        #[serde(rename = "wrongId")]
        wrong_id: String,
    },
    ListWrong {
        #[serde(default, rename = "sortBy")]
        sort_by: Option<String>,
    },
    SaveProgress {
        #[serde(flatten)]
        progress: ProgressInput,
    },
    GetStreak,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Problem {
        issued: IssuedOut,
    },
    AnswerResult {
        result: AnswerOut,
    },
    WrongList {
        items: Vec<WrongProblem>,
    },
    Progress {
        record: ProgressRecord,
    },
    Streak {
        streak: Streak,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for problem delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedOut {
    pub id: String,
    pub problem: Problem,
    /// Answer is entered one place at a time, most significant first.
    pub place_value: bool,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    #[serde(default)]
    pub level: Option<f64>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub chapter_id: Option<String>,
    #[serde(default)]
    pub chapter_title: Option<String>,
    #[serde(default)]
    pub number_basics_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub level: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CurriculumQuery {
    pub grade: Option<u8>,
    pub semester: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct CurriculumOut {
    pub chapters: Vec<CurriculumChapter>,
}

#[derive(Debug, Deserialize)]
pub struct OperationsQuery {
    pub level: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OperationsOut {
    pub level: u8,
    pub operations: Vec<Operator>,
}

/// One of: a typed `answer`, place-value `places` (least significant first),
/// or `keys` typed into place-value entry in order (most significant first).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub problem_id: String,
    #[serde(default)]
    pub answer: Option<f64>,
    #[serde(default)]
    pub places: Option<Vec<String>>,
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    /// False when place-value entry still has empty places.
    pub complete: bool,
    pub expected: f64,
    pub submitted: Option<f64>,
    /// Digits as entered place by place, most significant first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entered: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrong_note_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WrongQuery {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WrongListOut {
    pub items: Vec<WrongProblem>,
}

#[derive(Debug, Serialize)]
pub struct RemovedOut {
    pub removed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub ok: bool,
    pub chapters: usize,
    pub issued_problems: usize,
    pub wrong_notes: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}
