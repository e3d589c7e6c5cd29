//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; unknown ids map to 404 with an `ErrorOut` body.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::clamp_level;
use crate::engine::operations_by_level;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;
use crate::store::{ProgressInput, SortBy, WrongInput};

type HttpResult<T> = Result<Json<T>, (StatusCode, Json<ErrorOut>)>;

fn not_found(message: impl Into<String>) -> (StatusCode, Json<ErrorOut>) {
  (StatusCode::NOT_FOUND, Json(ErrorOut { message: message.into() }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorOut>) {
  (StatusCode::BAD_REQUEST, Json(ErrorOut { message: message.into() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    chapters: state.chapters.len(),
    issued_problems: state.issued.read().await.len(),
    wrong_notes: state.wrong_notes.read().await.len(),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_curriculum(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CurriculumQuery>,
) -> impl IntoResponse {
  Json(CurriculumOut { chapters: state.chapters_for(q.grade, q.semester) })
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_chapter(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> HttpResult<crate::curriculum::CurriculumChapter> {
  state.chapter(&id).map(Json).ok_or_else(|| not_found(format!("Unknown chapter: {}", id)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_chapter_problem(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(q): Query<ModeQuery>,
) -> HttpResult<IssuedOut> {
  let issued = issue_chapter_problem(&state, &id, q.mode.as_deref())
    .await
    .ok_or_else(|| not_found(format!("Unknown chapter: {}", id)))?;
  info!(target: "problem", chapter = %id, problem_id = %issued.id, "HTTP chapter problem served");
  Ok(Json(issued))
}

#[instrument(level = "info", skip(q))]
pub async fn http_get_operations(Query(q): Query<OperationsQuery>) -> impl IntoResponse {
  let level = clamp_level(q.level.unwrap_or(1.0));
  Json(OperationsOut { level, operations: operations_by_level(level).to_vec() })
}

#[instrument(level = "info", skip(state, q))]
pub async fn http_get_problem(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProblemQuery>,
) -> impl IntoResponse {
  let issued = issue_problem(&state, q).await;
  info!(target: "problem", problem_id = %issued.id, "HTTP problem served");
  Json(issued)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_random_problem(
  State(state): State<Arc<AppState>>,
  Query(q): Query<RandomQuery>,
) -> impl IntoResponse {
  Json(issue_random_problem(&state, q.level).await)
}

#[instrument(level = "info", skip(state, body), fields(problem_id = %body.problem_id))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> HttpResult<AnswerOut> {
  evaluate_answer(&state, &body)
    .await
    .map(Json)
    .ok_or_else(|| not_found(format!("Unknown problemId: {}", body.problem_id)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_wrong(
  State(state): State<Arc<AppState>>,
  Query(q): Query<WrongQuery>,
) -> impl IntoResponse {
  let sort_by = q.sort_by.as_deref().map(SortBy::parse).unwrap_or_default();
  Json(WrongListOut { items: state.list_wrong(sort_by).await })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_wrong(
  State(state): State<Arc<AppState>>,
  Json(body): Json<WrongInput>,
) -> HttpResult<crate::domain::WrongProblem> {
  state
    .save_wrong(body, Utc::now())
    .await
    .map(Json)
    .ok_or_else(|| bad_request("Invalid wrong-answer record"))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_wrong(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> HttpResult<RemovedOut> {
  if state.remove_wrong(&id).await {
    Ok(Json(RemovedOut { removed: true }))
  } else {
    Err(not_found(format!("Unknown wrong note: {}", id)))
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_similar(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> HttpResult<IssuedOut> {
  similar_problem(&state, &id)
    .await
    .map(Json)
    .ok_or_else(|| not_found(format!("No similar problem for wrong note: {}", id)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.progress_map().await)
}

#[instrument(level = "info", skip(state, body), fields(chapter_id = %body.chapter_id))]
pub async fn http_post_progress(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ProgressInput>,
) -> HttpResult<crate::store::ProgressRecord> {
  state
    .save_progress(body, Utc::now())
    .await
    .map(Json)
    .ok_or_else(|| bad_request("chapterId is required"))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  state.clear_progress().await;
  Json(RemovedOut { removed: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_streak(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.streak(Utc::now().date_naive()).await)
}
