//! "Try a similar one": numeric variations of a missed problem.
//!
//! Operands are mutated in integer units (tenths for decimal problems) so
//! deltas stay exact. Every candidate is checked against the same rules
//! fresh generation follows; when no candidate survives `MAX_ATTEMPTS`, a
//! new problem is generated for the same operator, level and topic.

use rand::Rng;
use tracing::{debug, info};

use crate::domain::{Operator, Problem, ProblemOptions, WrongProblem, MAX_LEVEL, MIN_LEVEL};
use crate::engine::generate_problem;
use crate::seed::fresh_seed;
use crate::topic::Topic;
use crate::util::{format_number, is_integral};

pub const MAX_ATTEMPTS: usize = 40;
const LAST_DIGIT_CHANCE: f64 = 0.4;
const QUOTIENT_SPREAD: i64 = 2;
/// Operands beyond this magnitude are not mutated; a fresh problem is issued instead.
const MAX_OPERAND: f64 = 1e8;

/// Delta range for an operand magnitude: 10% to 20% of it, never below 1.
pub fn delta_window(base: i64) -> (i64, i64) {
  let base = base.saturating_abs().max(1);
  let min = (base / 10).max(1);
  let max = (base / 5).max(min);
  (min, max)
}

/// A scaled operand: `units / scale` is the real value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Scaled {
  units: i64,
  scale: i64,
}

impl Scaled {
  fn of(x: f64, scale: i64) -> Self {
    Scaled { units: (x * scale as f64).round() as i64, scale }
  }

  fn value(self) -> f64 {
    self.units as f64 / self.scale as f64
  }

  fn with_units(self, units: i64) -> Self {
    Scaled { units, ..self }
  }
}

struct Candidate {
  num1: f64,
  num2: f64,
  answer: f64,
}

/// A new problem close to `wrong`, or `None` when the record is unusable
/// (non-finite operands or an unknown operator).
pub fn generate_similar_problem<R: Rng + ?Sized>(rng: &mut R, wrong: &WrongProblem) -> Option<Problem> {
  if !wrong.num1.is_finite() || !wrong.num2.is_finite() {
    return None;
  }
  let operator = Operator::parse(&wrong.operator)?;
  let level = wrong.level.clamp(MIN_LEVEL, MAX_LEVEL);
  let opts = ProblemOptions {
    topic: wrong.topic.clone(),
    chapter_id: wrong.chapter_id.clone(),
    chapter_title: wrong.chapter_title.clone(),
    number_basics_mode: None,
  };

  if wrong.visual.is_some() && !wrong.topic.trim().is_empty() {
    debug!(target: "review", id = %wrong.id, topic = %wrong.topic, "visual problem, regenerating");
    return Some(generate_problem(rng, level, operator, &opts));
  }

  if wrong.num1.abs() > MAX_OPERAND || wrong.num2.abs() > MAX_OPERAND {
    info!(target: "review", id = %wrong.id, operator = %operator, "operands out of range, generating fresh");
    return Some(generate_problem(rng, level, operator, &opts));
  }

  let decimal = Topic::parse(&wrong.topic).is_decimal() || !is_integral(wrong.num1) || !is_integral(wrong.num2);
  for attempt in 0..MAX_ATTEMPTS {
    let candidate = match operator {
      Operator::Div => mutate_division(rng, wrong.num1, wrong.num2, decimal),
      _ => mutate_pair(rng, operator, wrong.num1, wrong.num2, decimal),
    };
    if let Some(c) = candidate {
      debug!(target: "review", id = %wrong.id, attempt, "mutated");
      return Some(finish(rng, level, operator, &opts, c));
    }
  }

  info!(target: "review", id = %wrong.id, operator = %operator, "no valid mutation, generating fresh");
  Some(generate_problem(rng, level, operator, &opts))
}

fn operand_scale(decimal: bool, operator: Operator, x: f64) -> i64 {
  if decimal && (matches!(operator, Operator::Add | Operator::Sub) || !is_integral(x)) {
    10
  } else {
    1
  }
}

fn nudge<R: Rng + ?Sized>(rng: &mut R, units: i64, window: (i64, i64), last_digit: bool) -> i64 {
  let next = if last_digit {
    units - units.rem_euclid(10) + rng.gen_range(0..=9)
  } else {
    let delta = rng.gen_range(window.0..=window.1);
    if rng.gen_bool(0.5) { units.saturating_add(delta) } else { units.saturating_sub(delta) }
  };
  next.max(0)
}

/// One attempt for `+ - *`. `None` means unchanged or rejected.
fn mutate_pair<R: Rng + ?Sized>(rng: &mut R, operator: Operator, num1: f64, num2: f64, decimal: bool) -> Option<Candidate> {
  let a = Scaled::of(num1, operand_scale(decimal, operator, num1));
  let b = Scaled::of(num2, operand_scale(decimal, operator, num2));
  let window = delta_window(a.units.saturating_abs().max(b.units.saturating_abs()));
  let last_digit = rng.gen_bool(LAST_DIGIT_CHANCE);

  let m1 = a.with_units(nudge(rng, a.units, window, last_digit));
  let m2 = b.with_units(nudge(rng, b.units, window, last_digit));
  if m1 == a && m2 == b {
    return None;
  }

  let answer = match operator {
    Operator::Add => (m1.units + m2.units) as f64 / m1.scale as f64,
    Operator::Sub => {
      if m1.units < m2.units {
        return None;
      }
      (m1.units - m2.units) as f64 / m1.scale as f64
    }
    _ => m1.units.checked_mul(m2.units)? as f64 / (m1.scale * m2.scale) as f64,
  };
  Some(Candidate { num1: m1.value(), num2: m2.value(), answer })
}

/// One attempt for `/`, rebuilt as divisor x quotient so it stays exact.
fn mutate_division<R: Rng + ?Sized>(rng: &mut R, num1: f64, num2: f64, decimal: bool) -> Option<Candidate> {
  let q_scale = if decimal { 10 } else { 1 };
  let divisor = (num2.round() as i64).max(1);
  let quotient = if num2 == 0.0 { Scaled { units: 0, scale: q_scale } } else { Scaled::of(num1 / num2, q_scale) };

  let window = delta_window(divisor);
  let delta = rng.gen_range(window.0..=window.1);
  let new_divisor = if rng.gen_bool(0.5) { divisor + delta } else { divisor - delta }.max(1);
  let new_quotient =
    quotient.with_units(quotient.units.saturating_add(rng.gen_range(-QUOTIENT_SPREAD..=QUOTIENT_SPREAD)).max(1));

  if new_divisor as f64 == num2 && new_quotient == quotient {
    return None;
  }
  let dividend = Scaled { units: new_divisor.checked_mul(new_quotient.units)?, scale: q_scale };
  Some(Candidate { num1: dividend.value(), num2: new_divisor as f64, answer: new_quotient.value() })
}

fn finish<R: Rng + ?Sized>(rng: &mut R, level: u8, operator: Operator, opts: &ProblemOptions, c: Candidate) -> Problem {
  let (n1, n2, ans) = (format_number(c.num1), format_number(c.num2), format_number(c.answer));
  let lvl = level.to_string();
  let seed = fresh_seed(
    &["similar", lvl.as_str(), operator.symbol(), opts.topic.as_str(), n1.as_str(), n2.as_str(), ans.as_str()],
    rng,
  );
  Problem {
    num1: c.num1,
    num2: c.num2,
    operator,
    answer: c.answer,
    level,
    topic: opts.topic.clone(),
    chapter_id: opts.chapter_id.clone(),
    chapter_title: opts.chapter_title.clone(),
    seed,
    visual: None,
  }
}
