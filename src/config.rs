//! Loading service configuration from TOML.
//!
//! Schema:
//!   rng_seed = 42            # optional; makes problem generation reproducible
//!   issued_capacity = 512    # issued problems kept for answer checking
//!
//!   [[chapters]]             # extra chapters appended to the built-in catalog
//!   id = "c16-review"
//!   grade = 3
//!   semester = 2
//!   level = 3
//!   topic = "multiplication"
//!   title = "복습"
//!   operations = ["*", "/"]
//!   question_count = 10

use serde::Deserialize;
use tracing::{error, info};

use crate::curriculum::CurriculumChapter;
use crate::domain::{Operator, MAX_LEVEL, MIN_LEVEL};

pub const DEFAULT_ISSUED_CAPACITY: usize = 512;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
  #[serde(default)]
  pub rng_seed: Option<u64>,
  #[serde(default = "default_issued_capacity")]
  pub issued_capacity: usize,
  #[serde(default)]
  pub chapters: Vec<ChapterCfg>,
}

fn default_issued_capacity() -> usize {
  DEFAULT_ISSUED_CAPACITY
}

impl Default for AppConfig {
  fn default() -> Self {
    Self { rng_seed: None, issued_capacity: DEFAULT_ISSUED_CAPACITY, chapters: Vec::new() }
  }
}

/// Chapter entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ChapterCfg {
  pub id: String,
  #[serde(default = "one")] pub grade: u8,
  #[serde(default = "one")] pub semester: u8,
  #[serde(default = "one")] pub level: u8,
  #[serde(default)] pub topic: String,
  pub title: String,
  #[serde(default)] pub emoji: String,
  /// Operator symbols; unknown ones are dropped.
  #[serde(default)] pub operations: Vec<String>,
  #[serde(default = "default_question_count")] pub question_count: u32,
  #[serde(default)] pub description: String,
}

fn one() -> u8 {
  1
}

fn default_question_count() -> u32 {
  10
}

impl ChapterCfg {
  /// Normalise into a catalog chapter. `None` when the id is blank.
  pub fn into_chapter(self) -> Option<CurriculumChapter> {
    let id = self.id.trim().to_string();
    if id.is_empty() {
      return None;
    }
    let mut operations: Vec<Operator> = self.operations.iter().filter_map(|s| Operator::parse(s)).collect();
    if operations.is_empty() {
      operations.push(Operator::Add);
    }
    Some(CurriculumChapter {
      id,
      grade: self.grade.clamp(1, 3),
      semester: self.semester.clamp(1, 2),
      level: self.level.clamp(MIN_LEVEL, MAX_LEVEL),
      topic: self.topic,
      title: self.title,
      emoji: self.emoji,
      operations,
      question_count: self.question_count.max(1),
      description: self.description,
    })
  }
}

/// Attempt to load `AppConfig` from MATHEZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("MATHEZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "mathez_backend", %path, chapters = cfg.chapters.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathez_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathez_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_full_schema() {
    let raw = r#"
      rng_seed = 42
      issued_capacity = 16

      [[chapters]]
      id = "c16-review"
      grade = 3
      semester = 2
      level = 7
      topic = "multiplication"
      title = "복습"
      operations = ["*", "÷", "?"]
    "#;
    let cfg: AppConfig = toml::from_str(raw).unwrap();
    assert_eq!(cfg.rng_seed, Some(42));
    assert_eq!(cfg.issued_capacity, 16);
    let chapter = cfg.chapters.into_iter().next().unwrap().into_chapter().unwrap();
    assert_eq!(chapter.level, MAX_LEVEL);
    assert_eq!(chapter.operations, vec![Operator::Mul, Operator::Div]);
    assert_eq!(chapter.question_count, 10);
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg: AppConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.rng_seed, None);
    assert_eq!(cfg.issued_capacity, DEFAULT_ISSUED_CAPACITY);
    assert!(cfg.chapters.is_empty());
  }

  #[test]
  fn blank_chapter_id_is_dropped() {
    let cfg: AppConfig = toml::from_str("[[chapters]]\nid = \" \"\ntitle = \"x\"\n").unwrap();
    let chapter = cfg.chapters.into_iter().next().unwrap();
    assert!(chapter.into_chapter().is_none());
  }
}
