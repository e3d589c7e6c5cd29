//! Digit-by-digit answer entry for multi-digit answers.
//!
//! Slots are stored least significant first; the cursor starts at the most
//! significant place and walks toward the ones place as digits are typed.

use crate::domain::{Operator, Problem};
use crate::util::is_integral;

/// Decimal digits of `|n|` (floored), least significant first. `0` yields `[0]`.
pub fn digits_of(n: f64) -> Vec<u8> {
  let mut rest = if n.is_finite() { n.abs().floor() as u64 } else { 0 };
  let mut out = Vec::new();
  loop {
    out.push((rest % 10) as u8);
    rest /= 10;
    if rest == 0 {
      return out;
    }
  }
}

/// Whether a problem in a chapter of `chapter_level` is answered place by place.
pub fn is_place_value_candidate(chapter_level: u8, problem: &Problem) -> bool {
  if chapter_level < 2 {
    return false;
  }
  if !is_integral(problem.num1) || !is_integral(problem.num2) || !is_integral(problem.answer) {
    return false;
  }
  if problem.operator == Operator::Div && chapter_level < 4 {
    return false;
  }
  let big_operand = problem.num1.abs() >= 10.0 || problem.num2.abs() >= 10.0;
  big_operand || digits_of(problem.answer).len() > 1
}

/// Last ASCII digit in `raw`, if any.
pub fn normalize_key(raw: &str) -> Option<u8> {
  raw.chars().rev().find_map(|c| c.to_digit(10)).map(|d| d as u8)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaceInput {
  slots: Vec<Option<u8>>,
  active: usize,
}

impl PlaceInput {
  /// Empty slots sized to the answer's digit count.
  pub fn for_answer(answer: f64) -> Self {
    let len = digits_of(answer).len();
    PlaceInput { slots: vec![None; len], active: len - 1 }
  }

  /// Rebuild from client-held slots (least significant first); blanks are empty.
  pub fn from_slots<S: AsRef<str>>(slots: &[S]) -> Self {
    let slots: Vec<Option<u8>> = slots.iter().map(|s| normalize_key(s.as_ref())).collect();
    let active = slots.iter().rposition(|s| s.is_none()).unwrap_or(0);
    PlaceInput { slots, active }
  }

  /// Type into the active place and step toward the ones place.
  pub fn enter(&mut self, key: &str) {
    if let Some(slot) = self.slots.get_mut(self.active) {
      *slot = normalize_key(key);
    }
    self.active = self.active.saturating_sub(1);
  }

  /// The composed number, or `None` while any place is empty or it overflows `u64`.
  pub fn value(&self) -> Option<u64> {
    if self.slots.is_empty() {
      return None;
    }
    self
      .slots
      .iter()
      .rev()
      .try_fold(0u64, |acc, d| acc.checked_mul(10)?.checked_add(u64::from((*d)?)))
  }

  /// Most significant first; `"0"` when nothing has been typed.
  pub fn display(&self) -> String {
    let text: String = self
      .slots
      .iter()
      .rev()
      .filter_map(|d| d.map(|d| char::from(b'0' + d)))
      .collect();
    if text.is_empty() { "0".to_string() } else { text }
  }
}
