//! Static curriculum catalog: grade-leveled chapters with topic and operators.
//!
//! The catalog is fixed at compile time and tiny (15 chapters), so lookups
//! are linear scans. Extra chapters from TOML config live in `AppState`.

use serde::{Deserialize, Serialize};

use crate::domain::Operator;
use crate::domain::Operator::{Add, Div, Mul, Sub};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumChapter {
  pub id: String,
  pub grade: u8,
  pub semester: u8,
  pub level: u8,
  pub topic: String,
  pub title: String,
  #[serde(default)] pub emoji: String,
  pub operations: Vec<Operator>,
  pub question_count: u32,
  #[serde(default)] pub description: String,
}

/// Legacy chapter ids from earlier releases.
const CHAPTER_ID_ALIASES: &[(&str, &str)] = &[
  ("c01-add-basics", "c01-number-basics"),
  ("c02-sub-basics", "c02-operations-basics"),
];

struct ChapterRow {
  id: &'static str,
  grade: u8,
  semester: u8,
  level: u8,
  topic: &'static str,
  title: &'static str,
  emoji: &'static str,
  operations: &'static [Operator],
  question_count: u32,
  description: &'static str,
}

const CHAPTERS: &[ChapterRow] = &[
  ChapterRow { id: "c01-number-basics", grade: 1, semester: 1, level: 1, topic: "number-basics", title: "9까지의 수", emoji: "🍎", operations: &[Add], question_count: 8, description: "9까지의 수를 세고, 0, 순서, 비교를 함께 익혀 수량의 기초를 다져요." },
  ChapterRow { id: "c02-operations-basics", grade: 1, semester: 1, level: 1, topic: "operations-basics", title: "덧셈과 뺄셈", emoji: "🍉", operations: &[Add, Sub], question_count: 8, description: "덧셈(+)과 뺄셈(-) 기호의 의미를 익히고 식을 읽어 정확히 계산해요." },
  ChapterRow { id: "c07-shape-count", grade: 1, semester: 1, level: 1, topic: "shapes", title: "여러 가지 모양", emoji: "🧩", operations: &[Add], question_count: 8, description: "모양을 분류하고 개수를 세는 힘을 키우는 단원입니다." },
  ChapterRow { id: "c08-compare", grade: 1, semester: 1, level: 1, topic: "compare", title: "비교하기", emoji: "⚖️", operations: &[Add], question_count: 8, description: "두 수의 크기, 차이, 관계를 비교하며 사고를 정렬합니다." },
  ChapterRow { id: "c03-add-carry", grade: 1, semester: 2, level: 2, topic: "addition-carry", title: "100까지의 수", emoji: "🧩", operations: &[Add], question_count: 10, description: "100 이하 숫자에서 받아올림이 자주 나타나는 덧셈을 반복 훈련합니다." },
  ChapterRow { id: "c04-sub-borrow", grade: 1, semester: 2, level: 2, topic: "subtraction-borrow", title: "시계 보기와 규칙 찾기", emoji: "🕒", operations: &[Sub], question_count: 10, description: "시간 단위를 활용해 수의 규칙을 찾고 규칙적으로 접근합니다." },
  ChapterRow { id: "c09-three-digit", grade: 2, semester: 1, level: 2, topic: "three-digit", title: "세 자리 수", emoji: "🔢", operations: &[Add], question_count: 10, description: "세 자리 수에서 각 자릿수의 의미를 파악해 정확히 계산합니다." },
  ChapterRow { id: "c10-figure-shape", grade: 2, semester: 1, level: 2, topic: "geometry-figures", title: "여러 가지 도형", emoji: "🔷", operations: &[Add], question_count: 8, description: "도형 분류와 개수를 통해 계산 문항을 자연스럽게 연결합니다." },
  ChapterRow { id: "c11-measure-length", grade: 2, semester: 1, level: 2, topic: "measurement-length", title: "길이 재기", emoji: "📏", operations: &[Add], question_count: 8, description: "길이 비교와 덧셈으로 기본 계산 감각을 강화합니다." },
  ChapterRow { id: "c12-four-digit", grade: 2, semester: 2, level: 3, topic: "four-digit", title: "네 자리 수", emoji: "🧱", operations: &[Add], question_count: 10, description: "네 자리 수 덧셈과 뺄셈으로 자릿수 개념을 한 단계 확장합니다." },
  ChapterRow { id: "c05-times-table", grade: 2, semester: 2, level: 3, topic: "multiplication", title: "곱셈구구", emoji: "🔢", operations: &[Mul], question_count: 10, description: "곱셈구구를 통해 반복 덧셈을 빠르게 인식하는 연습을 합니다." },
  ChapterRow { id: "c06-division", grade: 3, semester: 1, level: 3, topic: "division", title: "나눗셈의 의미", emoji: "🥧", operations: &[Div], question_count: 12, description: "일상에서의 나눗셈 의미를 익히고, 나머지 없는 경우를 중심으로 정확하게 해결합니다." },
  ChapterRow { id: "c13-frac-dec", grade: 3, semester: 1, level: 2, topic: "fraction-decimal", title: "분수와 소수", emoji: "🍕", operations: &[Add], question_count: 8, description: "기초 분수/소수 감각을 덧셈 개념과 연결해 푸는 감각을 준비합니다." },
  ChapterRow { id: "c14-circle", grade: 3, semester: 2, level: 4, topic: "circle", title: "원", emoji: "⭕", operations: &[Add], question_count: 8, description: "원과 관련된 기본 개념을 수와 식으로 정리하는 연습을 합니다." },
  ChapterRow { id: "c15-data-class", grade: 3, semester: 2, level: 4, topic: "data", title: "자료의 정리", emoji: "🗂️", operations: &[Add], question_count: 8, description: "자료를 보고 수를 묶어 단순 계산으로 정리하는 연습을 합니다." },
];

impl From<&ChapterRow> for CurriculumChapter {
  fn from(r: &ChapterRow) -> Self {
    CurriculumChapter {
      id: r.id.to_string(),
      grade: r.grade,
      semester: r.semester,
      level: r.level,
      topic: r.topic.to_string(),
      title: r.title.to_string(),
      emoji: r.emoji.to_string(),
      operations: r.operations.to_vec(),
      question_count: r.question_count,
      description: r.description.to_string(),
    }
  }
}

/// The built-in chapters in catalog order.
pub fn catalog() -> Vec<CurriculumChapter> {
  CHAPTERS.iter().map(CurriculumChapter::from).collect()
}

/// Trimmed id with legacy aliases resolved.
pub fn canonical_chapter_id(id: &str) -> &str {
  let trimmed = id.trim();
  CHAPTER_ID_ALIASES
    .iter()
    .find(|(legacy, _)| *legacy == trimmed)
    .map(|(_, current)| *current)
    .unwrap_or(trimmed)
}

/// Find a chapter by canonical id, then by the raw trimmed id.
pub fn lookup_chapter<'a>(chapters: &'a [CurriculumChapter], id: &str) -> Option<&'a CurriculumChapter> {
  let raw = id.trim();
  if raw.is_empty() {
    return None;
  }
  let canonical = canonical_chapter_id(raw);
  chapters
    .iter()
    .find(|c| c.id == canonical)
    .or_else(|| chapters.iter().find(|c| c.id == raw))
}

pub fn chapters_for(chapters: &[CurriculumChapter], grade: Option<u8>, semester: Option<u8>) -> Vec<CurriculumChapter> {
  chapters
    .iter()
    .filter(|c| grade.map_or(true, |g| c.grade == g))
    .filter(|c| semester.map_or(true, |s| c.semester == s))
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_chapter_has_grade_semester_meta() {
    let all = catalog();
    assert_eq!(all.len(), 15);
    for c in &all {
      assert!((1..=3).contains(&c.grade), "{}", c.id);
      assert!((1..=2).contains(&c.semester), "{}", c.id);
      assert!((1..=4).contains(&c.level), "{}", c.id);
      assert!(c.question_count > 0);
      assert!(!c.operations.is_empty());
    }
  }

  #[test]
  fn grade_semester_filters_are_populated() {
    let all = catalog();
    assert!(!chapters_for(&all, Some(1), Some(2)).is_empty());
    assert!(!chapters_for(&all, Some(3), Some(2)).is_empty());
    assert_eq!(chapters_for(&all, None, None).len(), all.len());
  }

  #[test]
  fn lookup_by_id_and_alias() {
    let all = catalog();
    assert_eq!(lookup_chapter(&all, "c14-circle").map(|c| c.title.as_str()), Some("원"));
    assert_eq!(lookup_chapter(&all, " c01-add-basics ").map(|c| c.id.as_str()), Some("c01-number-basics"));
    assert_eq!(lookup_chapter(&all, "c02-sub-basics").map(|c| c.id.as_str()), Some("c02-operations-basics"));
    assert!(lookup_chapter(&all, "").is_none());
    assert!(lookup_chapter(&all, "c99-nope").is_none());
  }

  #[test]
  fn canonical_id_passthrough() {
    assert_eq!(canonical_chapter_id("c09-three-digit"), "c09-three-digit");
    assert_eq!(canonical_chapter_id("c01-add-basics"), "c01-number-basics");
  }
}
