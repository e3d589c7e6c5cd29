//! In-memory learner stores: the wrong-answer notebook and chapter progress.
//!
//! Both are plain structs; `AppState` owns them behind `RwLock`s. Inputs
//! arrive from clients and are normalised on write, so reads never see
//! negative counters or unknown operators.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{clamp_level, Operator, WrongProblem};
use crate::visual::Visual;

/// Client payload for a missed problem.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongInput {
  #[serde(default)] pub id: Option<String>,
  pub num1: f64,
  pub num2: f64,
  pub operator: String,
  pub answer: f64,
  pub level: f64,
  #[serde(default)] pub topic: String,
  #[serde(default)] pub chapter_id: String,
  #[serde(default)] pub chapter_title: String,
  #[serde(default)] pub visual: Option<Visual>,
  #[serde(default)] pub last_attempt: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
  #[default]
  Latest,
  FailCount,
}

impl SortBy {
  pub fn parse(raw: &str) -> SortBy {
    match raw.trim() {
      "failCount" | "fail_count" | "fail-count" => SortBy::FailCount,
      _ => SortBy::Latest,
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct WrongNotes {
  items: Vec<WrongProblem>,
}

impl WrongNotes {
  /// Record a miss. A repeat of the same `(num1, num2, operator)` bumps its
  /// fail count instead of adding a row. Invalid input is ignored (`None`).
  pub fn save(&mut self, input: WrongInput, now: DateTime<Utc>) -> Option<WrongProblem> {
    let finite = [input.num1, input.num2, input.answer].iter().all(|v| v.is_finite());
    let operator = Operator::parse(&input.operator)?;
    if !finite || !input.level.is_finite() || input.level.fract() != 0.0 {
      return None;
    }
    let attempted_at = input.last_attempt.unwrap_or(now);

    if let Some(existing) = self
      .items
      .iter_mut()
      .find(|w| w.num1 == input.num1 && w.num2 == input.num2 && w.operator == operator.symbol())
    {
      existing.fail_count += 1;
      existing.last_attempt = attempted_at;
      debug!(target: "review", id = %existing.id, fail_count = existing.fail_count, "repeat miss");
      return Some(existing.clone());
    }

    let record = WrongProblem {
      id: input.id.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
      num1: input.num1,
      num2: input.num2,
      operator: operator.symbol().to_string(),
      answer: input.answer,
      level: clamp_level(input.level),
      topic: input.topic,
      chapter_id: input.chapter_id,
      chapter_title: input.chapter_title,
      visual: input.visual,
      fail_count: 1,
      last_attempt: attempted_at,
    };
    debug!(target: "review", id = %record.id, "new wrong note");
    self.items.push(record.clone());
    Some(record)
  }

  pub fn list(&self, sort_by: SortBy) -> Vec<WrongProblem> {
    let mut out = self.items.clone();
    match sort_by {
      SortBy::Latest => out.sort_by(|a, b| b.last_attempt.cmp(&a.last_attempt)),
      SortBy::FailCount => out.sort_by(|a, b| {
        b.fail_count.cmp(&a.fail_count).then_with(|| b.last_attempt.cmp(&a.last_attempt))
      }),
    }
    out
  }

  pub fn get(&self, id: &str) -> Option<&WrongProblem> {
    self.items.iter().find(|w| w.id == id)
  }

  /// Returns whether anything was removed.
  pub fn remove(&mut self, id: &str) -> bool {
    let before = self.items.len();
    self.items.retain(|w| w.id != id);
    self.items.len() != before
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

/// Client payload for chapter progress.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInput {
  #[serde(default)] pub chapter_id: String,
  #[serde(default)] pub total: f64,
  #[serde(default)] pub current_index: f64,
  #[serde(default)] pub score: f64,
  #[serde(default)] pub completed: bool,
  #[serde(default)] pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
  pub chapter_id: String,
  pub total: u32,
  pub current_index: u32,
  pub score: u32,
  pub completed: bool,
  pub completed_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
  /// Consecutive study days ending today or yesterday.
  pub streak: u32,
  /// Distinct days with at least one completed chapter.
  pub total_completions: u32,
  pub last_completed_day: Option<NaiveDate>,
}

fn non_negative(x: f64) -> u32 {
  if x.is_finite() { x.round().clamp(0.0, f64::from(u32::MAX)) as u32 } else { 0 }
}

#[derive(Clone, Debug, Default)]
pub struct ProgressBook {
  records: BTreeMap<String, ProgressRecord>,
  streak: Streak,
}

impl ProgressBook {
  /// Store progress for a chapter. Empty chapter ids are ignored (`None`).
  pub fn save(&mut self, input: ProgressInput, now: DateTime<Utc>) -> Option<ProgressRecord> {
    let chapter_id = input.chapter_id.trim().to_string();
    if chapter_id.is_empty() {
      return None;
    }
    let previous_completion = self.records.get(&chapter_id).and_then(|r| r.completed_at);
    let completed_at = if input.completed {
      Some(input.completed_at.or(previous_completion).unwrap_or(now))
    } else {
      None
    };
    let record = ProgressRecord {
      chapter_id: chapter_id.clone(),
      total: non_negative(input.total),
      current_index: non_negative(input.current_index),
      score: non_negative(input.score),
      completed: input.completed,
      completed_at,
      updated_at: now,
    };
    if input.completed {
      self.record_completion(now.date_naive());
    }
    self.records.insert(chapter_id, record.clone());
    Some(record)
  }

  fn record_completion(&mut self, day: NaiveDate) {
    let s = &mut self.streak;
    match s.last_completed_day {
      Some(last) if last == day => return,
      Some(last) if last + Duration::days(1) == day => s.streak += 1,
      _ => s.streak = 1,
    }
    s.total_completions += 1;
    s.last_completed_day = Some(day);
  }

  /// Streak as seen on `today`: zero once a whole day has been skipped.
  pub fn streak(&self, today: NaiveDate) -> Streak {
    let alive = self
      .streak
      .last_completed_day
      .map_or(false, |last| last == today || last + Duration::days(1) == today);
    Streak { streak: if alive { self.streak.streak } else { 0 }, ..self.streak }
  }

  pub fn get(&self, chapter_id: &str) -> Option<&ProgressRecord> {
    self.records.get(chapter_id.trim())
  }

  pub fn map(&self) -> BTreeMap<String, ProgressRecord> {
    self.records.clone()
  }

  pub fn clear(&mut self) {
    self.records.clear();
    self.streak = Streak::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
  }

  fn miss(num1: f64, num2: f64, op: &str) -> WrongInput {
    WrongInput {
      id: None,
      num1,
      num2,
      operator: op.into(),
      answer: Operator::parse_or_add(op).apply(num1, num2),
      level: 2.0,
      topic: String::new(),
      chapter_id: String::new(),
      chapter_title: String::new(),
      visual: None,
      last_attempt: None,
    }
  }

  fn progress(chapter_id: &str, completed: bool) -> ProgressInput {
    ProgressInput { chapter_id: chapter_id.into(), total: 2.0, current_index: 2.0, score: 2.0, completed, completed_at: None }
  }

  #[test]
  fn repeat_misses_bump_fail_count() {
    let mut notes = WrongNotes::default();
    let first = notes.save(miss(12.0, 5.0, "+"), at(1, 9)).unwrap();
    let again = notes.save(miss(12.0, 5.0, "+"), at(1, 10)).unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(again.fail_count, 2);
    assert_eq!(again.last_attempt, at(1, 10));
    assert_eq!(notes.len(), 1);

    notes.save(miss(12.0, 5.0, "-"), at(1, 11)).unwrap();
    assert_eq!(notes.len(), 2);
  }

  #[test]
  fn invalid_misses_are_ignored() {
    let mut notes = WrongNotes::default();
    assert!(notes.save(miss(f64::NAN, 1.0, "+"), at(1, 9)).is_none());
    assert!(notes.save(miss(1.0, 1.0, "%"), at(1, 9)).is_none());
    let mut fractional_level = miss(1.0, 1.0, "+");
    fractional_level.level = 1.5;
    assert!(notes.save(fractional_level, at(1, 9)).is_none());
    let mut high_level = miss(1.0, 1.0, "+");
    high_level.level = 9.0;
    assert_eq!(notes.save(high_level, at(1, 9)).unwrap().level, 4);
    assert_eq!(notes.len(), 1);
  }

  #[test]
  fn sorting_by_latest_and_fail_count() {
    let mut notes = WrongNotes::default();
    notes.save(miss(1.0, 1.0, "+"), at(1, 9));
    notes.save(miss(2.0, 2.0, "+"), at(2, 9));
    notes.save(miss(1.0, 1.0, "+"), at(1, 10));
    notes.save(miss(3.0, 3.0, "+"), at(3, 9));

    let latest: Vec<f64> = notes.list(SortBy::Latest).iter().map(|w| w.num1).collect();
    assert_eq!(latest, vec![3.0, 2.0, 1.0]);
    let by_count: Vec<f64> = notes.list(SortBy::FailCount).iter().map(|w| w.num1).collect();
    assert_eq!(by_count, vec![1.0, 3.0, 2.0]);
    assert_eq!(SortBy::parse("failCount"), SortBy::FailCount);
    assert_eq!(SortBy::parse("whatever"), SortBy::Latest);
  }

  #[test]
  fn remove_by_id() {
    let mut notes = WrongNotes::default();
    let saved = notes.save(miss(4.0, 2.0, "/"), at(1, 9)).unwrap();
    assert!(notes.get(&saved.id).is_some());
    assert!(notes.remove(&saved.id));
    assert!(!notes.remove(&saved.id));
    assert_eq!(notes.len(), 0);
  }

  #[test]
  fn progress_save_read_clear() {
    let mut book = ProgressBook::default();
    let input = ProgressInput { chapter_id: "addition-2".into(), total: 10.0, current_index: 3.0, score: 2.0, ..Default::default() };
    let saved = book.save(input, at(1, 9)).unwrap();
    assert_eq!(saved.current_index, 3);
    assert_eq!(saved.score, 2);
    assert!(!saved.completed);
    assert_eq!(saved.completed_at, None);
    assert_eq!(book.get("addition-2"), Some(&saved));
    assert_eq!(book.map().len(), 1);

    book.clear();
    assert!(book.get("addition-2").is_none());
    assert!(book.map().is_empty());
  }

  #[test]
  fn progress_values_are_clamped() {
    let mut book = ProgressBook::default();
    let input = ProgressInput { chapter_id: "mul-1".into(), total: -10.0, current_index: -3.0, score: 2.8, ..Default::default() };
    let saved = book.save(input, at(1, 9)).unwrap();
    assert_eq!((saved.total, saved.current_index, saved.score), (0, 0, 3));
    assert!(book.save(progress("  ", true), at(1, 9)).is_none());
  }

  #[test]
  fn same_day_completions_count_once() {
    let mut book = ProgressBook::default();
    book.save(progress("addition-2", true), at(1, 9));
    book.save(progress("subtraction-2", true), at(1, 15));
    let s = book.streak(at(1, 20).date_naive());
    assert_eq!(s.streak, 1);
    assert_eq!(s.total_completions, 1);
    assert!(book.get("addition-2").unwrap().completed_at.is_some());
  }

  #[test]
  fn streak_extends_and_resets() {
    let mut book = ProgressBook::default();
    book.save(progress("a", true), at(1, 9));
    book.save(progress("b", true), at(2, 9));
    book.save(progress("c", true), at(3, 9));
    assert_eq!(book.streak(at(3, 12).date_naive()).streak, 3);
    assert_eq!(book.streak(at(4, 12).date_naive()).streak, 3);
    assert_eq!(book.streak(at(6, 12).date_naive()).streak, 0);

    book.save(progress("d", true), at(6, 9));
    let s = book.streak(at(6, 12).date_naive());
    assert_eq!((s.streak, s.total_completions), (1, 4));

    book.save(progress("e", false), at(7, 9));
    assert_eq!(book.streak(at(7, 12).date_naive()).streak, 1);
  }

  #[test]
  fn recompletion_keeps_first_timestamp() {
    let mut book = ProgressBook::default();
    book.save(progress("a", true), at(1, 9));
    let again = book.save(progress("a", true), at(2, 9)).unwrap();
    assert_eq!(again.completed_at, Some(at(1, 9)));
    assert_eq!(again.updated_at, at(2, 9));
  }
}
