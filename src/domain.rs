//! Domain models: operators, levels, generated problems and wrong-answer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::visual::Visual;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 4;

/// The four arithmetic operators, `+ - * /` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
  #[serde(rename = "+")]
  Add,
  #[serde(rename = "-")]
  Sub,
  #[serde(rename = "*")]
  Mul,
  #[serde(rename = "/")]
  Div,
}

impl Operator {
  pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

  pub fn parse(raw: &str) -> Option<Operator> {
    match raw.trim() {
      "+" => Some(Operator::Add),
      "-" => Some(Operator::Sub),
      "*" | "×" | "x" => Some(Operator::Mul),
      "/" | "÷" => Some(Operator::Div),
      _ => None,
    }
  }

  /// Unsupported operators normalise to addition.
  pub fn parse_or_add(raw: &str) -> Operator {
    Operator::parse(raw).unwrap_or(Operator::Add)
  }

  pub fn symbol(self) -> &'static str {
    match self {
      Operator::Add => "+",
      Operator::Sub => "-",
      Operator::Mul => "*",
      Operator::Div => "/",
    }
  }

  /// Division by zero yields 0.
  pub fn apply(self, a: f64, b: f64) -> f64 {
    match self {
      Operator::Add => a + b,
      Operator::Sub => a - b,
      Operator::Mul => a * b,
      Operator::Div => {
        if b == 0.0 { 0.0 } else { a / b }
      }
    }
  }
}

impl std::fmt::Display for Operator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.symbol())
  }
}

/// Non-finite input becomes level 1; everything else is rounded and clamped to 1..=4.
pub fn clamp_level(raw: f64) -> u8 {
  if !raw.is_finite() {
    return MIN_LEVEL;
  }
  raw.round().clamp(f64::from(MIN_LEVEL), f64::from(MAX_LEVEL)) as u8
}

/// The five sub-modes of the grade-1 "number basics" unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberBasicsMode {
  Counting,
  Zero,
  Sequence,
  Compare,
  SplitCombine,
}

impl NumberBasicsMode {
  pub const ALL: [NumberBasicsMode; 5] = [
    NumberBasicsMode::Counting,
    NumberBasicsMode::Zero,
    NumberBasicsMode::Sequence,
    NumberBasicsMode::Compare,
    NumberBasicsMode::SplitCombine,
  ];

  pub fn parse(raw: &str) -> Option<NumberBasicsMode> {
    match raw.trim() {
      "counting" => Some(NumberBasicsMode::Counting),
      "zero" => Some(NumberBasicsMode::Zero),
      "sequence" => Some(NumberBasicsMode::Sequence),
      "compare" => Some(NumberBasicsMode::Compare),
      "split-combine" => Some(NumberBasicsMode::SplitCombine),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      NumberBasicsMode::Counting => "counting",
      NumberBasicsMode::Zero => "zero",
      NumberBasicsMode::Sequence => "sequence",
      NumberBasicsMode::Compare => "compare",
      NumberBasicsMode::SplitCombine => "split-combine",
    }
  }
}

/// Provenance and mode hints passed to `generate_problem`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemOptions {
  #[serde(default)] pub topic: String,
  #[serde(default)] pub chapter_id: String,
  #[serde(default)] pub chapter_title: String,
  #[serde(default)] pub number_basics_mode: Option<NumberBasicsMode>,
}

/// A generated problem. Immutable once returned; owned by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
  pub num1: f64,
  pub num2: f64,
  pub operator: Operator,
  pub answer: f64,
  pub level: u8,
  #[serde(default)] pub topic: String,
  #[serde(default)] pub chapter_id: String,
  #[serde(default)] pub chapter_title: String,
  pub seed: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visual: Option<Visual>,
}

/// A problem the learner missed, as persisted by the wrong-answer notebook.
/// `operator` stays a raw string: records come from storage and may be stale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongProblem {
  pub id: String,
  pub num1: f64,
  pub num2: f64,
  pub operator: String,
  pub answer: f64,
  pub level: u8,
  #[serde(default)] pub topic: String,
  #[serde(default)] pub chapter_id: String,
  #[serde(default)] pub chapter_title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visual: Option<Visual>,
  pub fail_count: u32,
  pub last_attempt: DateTime<Utc>,
}
