//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Issuing problems (explicit, random by level, or for a chapter)
//!   - Evaluating answers, typed or entered place by place
//!   - Saving misses to the wrong-answer notebook
//!   - Similar problems for notebook entries

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::{clamp_level, NumberBasicsMode, Operator, Problem, ProblemOptions};
use crate::engine::{generate_chapter_problem, generate_problem, generate_random_problem};
use crate::place_value::{is_place_value_candidate, PlaceInput};
use crate::protocol::{AnswerIn, AnswerOut, IssuedOut, ProblemQuery};
use crate::similar::generate_similar_problem;
use crate::state::AppState;
use crate::store::WrongInput;
use crate::util::format_number;
use crate::visual::Visual;

const ANSWER_TOLERANCE: f64 = 1e-6;

fn parse_mode(raw: Option<&str>) -> Option<NumberBasicsMode> {
  raw.and_then(NumberBasicsMode::parse)
}

async fn issue(state: &AppState, problem: Problem, chapter_level: Option<u8>) -> IssuedOut {
  let place_value = is_place_value_candidate(chapter_level.unwrap_or(problem.level), &problem);
  let id = state.issue(problem.clone(), chapter_level).await;
  IssuedOut { id, problem, place_value }
}

#[instrument(level = "info", skip(state, q))]
pub async fn issue_problem(state: &AppState, q: ProblemQuery) -> IssuedOut {
  let level = clamp_level(q.level.unwrap_or(1.0));
  let operator = Operator::parse_or_add(q.operator.as_deref().unwrap_or("+"));
  let opts = ProblemOptions {
    topic: q.topic.unwrap_or_default(),
    chapter_id: q.chapter_id.unwrap_or_default(),
    chapter_title: q.chapter_title.unwrap_or_default(),
    number_basics_mode: parse_mode(q.number_basics_mode.as_deref()),
  };
  let problem = state.with_rng(|rng| generate_problem(rng, level, operator, &opts)).await;
  info!(target: "problem", level, %operator, topic = %problem.topic, "Problem generated");
  issue(state, problem, None).await
}

#[instrument(level = "info", skip(state))]
pub async fn issue_random_problem(state: &AppState, level: Option<f64>) -> IssuedOut {
  let level = clamp_level(level.unwrap_or(1.0));
  let problem = state.with_rng(|rng| generate_random_problem(rng, level)).await;
  info!(target: "problem", level, operator = %problem.operator, "Random problem generated");
  issue(state, problem, None).await
}

/// `None` when the chapter id is unknown.
#[instrument(level = "info", skip(state), fields(%chapter_id))]
pub async fn issue_chapter_problem(state: &AppState, chapter_id: &str, mode: Option<&str>) -> Option<IssuedOut> {
  let chapter = state.chapter(chapter_id)?;
  let mode = parse_mode(mode);
  let problem = state.with_rng(|rng| generate_chapter_problem(rng, &chapter, mode)).await;
  info!(target: "problem", chapter = %chapter.id, operator = %problem.operator, "Chapter problem generated");
  Some(issue(state, problem, Some(chapter.level)).await)
}

/// `None` when the problem id is unknown or was evicted.
#[instrument(level = "info", skip(state, body), fields(problem_id = %body.problem_id))]
pub async fn evaluate_answer(state: &AppState, body: &AnswerIn) -> Option<AnswerOut> {
  let issued = state.get_issued(&body.problem_id).await?;
  let problem = &issued.problem;

  // A self-scoring visual's answer wins over the arithmetic one.
  let expected = problem.visual.as_ref().and_then(Visual::answer).unwrap_or(problem.answer);
  let place_input = match (&body.places, &body.keys) {
    (Some(places), _) => Some(PlaceInput::from_slots(places)),
    (None, Some(keys)) => {
      let mut input = PlaceInput::for_answer(expected);
      for key in keys {
        input.enter(key);
      }
      Some(input)
    }
    (None, None) => None,
  };
  let entered = place_input.as_ref().map(PlaceInput::display);
  let submitted = match &place_input {
    Some(input) => input.value().map(|v| v as f64),
    None => body.answer.filter(|a| a.is_finite()),
  };
  let Some(value) = submitted else {
    return Some(AnswerOut { correct: false, complete: false, expected, submitted: None, entered, wrong_note_id: None });
  };

  let correct = (value - expected).abs() < ANSWER_TOLERANCE;
  let wrong_note_id = if correct {
    None
  } else {
    state.save_wrong(wrong_input(problem), Utc::now()).await.map(|w| w.id)
  };
  info!(
    target: "problem",
    id = %body.problem_id,
    %correct,
    expected = %format_number(expected),
    submitted = %format_number(value),
    "Answer evaluated"
  );
  Some(AnswerOut { correct, complete: true, expected, submitted: Some(value), entered, wrong_note_id })
}

fn wrong_input(p: &Problem) -> WrongInput {
  WrongInput {
    id: None,
    num1: p.num1,
    num2: p.num2,
    operator: p.operator.symbol().to_string(),
    answer: p.answer,
    level: f64::from(p.level),
    topic: p.topic.clone(),
    chapter_id: p.chapter_id.clone(),
    chapter_title: p.chapter_title.clone(),
    visual: p.visual.clone(),
    last_attempt: None,
  }
}

/// A variation of a notebook entry. `None` when the entry is missing or unusable.
#[instrument(level = "info", skip(state), fields(%wrong_id))]
pub async fn similar_problem(state: &AppState, wrong_id: &str) -> Option<IssuedOut> {
  let wrong = state.get_wrong(wrong_id).await?;
  let problem = state.with_rng(|rng| generate_similar_problem(rng, &wrong)).await;
  let Some(problem) = problem else {
    warn!(target: "review", %wrong_id, operator = %wrong.operator, "Wrong note cannot be mutated");
    return None;
  };
  info!(target: "review", %wrong_id, operator = %problem.operator, "Similar problem generated");
  Some(issue(state, problem, None).await)
}
