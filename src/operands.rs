//! Per-operator operand generators.
//!
//! Each generator draws candidates from a level/topic range and keeps the
//! first pair that satisfies the pedagogical predicate (carry, borrow, small
//! sums). Loops are bounded; when a bound is exhausted a fixed pair that
//! still satisfies the predicate is returned. Division is always built as
//! `divisor * quotient`, so it never needs a retry.

use rand::Rng;

use crate::domain::Operator;
use crate::topic::Topic;
use crate::util::round_to_tenth;

/// Tries for one/two digit ranges.
const STANDARD_TRIES: usize = 100;
/// Tries for three/four digit ranges, where the predicates hit less often.
const WIDE_RANGE_TRIES: usize = 140;

/// 4 + 4: a small sum for the counting unit.
pub const FALLBACK_SMALL_SUM: (i64, i64) = (4, 4);
/// 48 + 7: ones digits 8 + 7 force a carry.
pub const FALLBACK_CARRY_PAIR: (i64, i64) = (48, 7);
/// 258 + 167: three-digit carry.
pub const FALLBACK_THREE_DIGIT_CARRY: (i64, i64) = (258, 167);
/// 2587 + 1436: four-digit carry.
pub const FALLBACK_FOUR_DIGIT_CARRY: (i64, i64) = (2587, 1436);
/// 7 - 3: non-negative single digits.
pub const FALLBACK_SMALL_DIFFERENCE: (i64, i64) = (7, 3);
/// 62 - 18: ones digits 2 < 8 force a borrow.
pub const FALLBACK_BORROW_PAIR: (i64, i64) = (62, 18);
/// 512 - 278: three-digit borrow.
pub const FALLBACK_THREE_DIGIT_BORROW: (i64, i64) = (512, 278);
/// 3002 - 1458: four-digit borrow through zeros.
pub const FALLBACK_FOUR_DIGIT_BORROW: (i64, i64) = (3002, 1458);
/// 800 - 600: level-4 difference.
pub const FALLBACK_WIDE_DIFFERENCE: (i64, i64) = (800, 600);

/// Raw operands. `answer` is set only when the generator defines it (division).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operands {
  pub num1: f64,
  pub num2: f64,
  pub answer: Option<f64>,
}

impl Operands {
  fn pair((a, b): (i64, i64)) -> Self {
    Operands { num1: a as f64, num2: b as f64, answer: None }
  }
}

pub fn carries(a: i64, b: i64) -> bool {
  a % 10 + b % 10 >= 10
}

pub fn borrows(minuend: i64, subtrahend: i64) -> bool {
  minuend >= subtrahend && minuend % 10 < subtrahend % 10
}

/// First grade-1 unit at level 1: operands never include zero and sums stay within 9.
pub fn is_early_unit(level: u8, topic: Topic, chapter_id: &str) -> bool {
  if level != 1 {
    return false;
  }
  let id = chapter_id.trim().to_ascii_lowercase();
  topic.is_early_unit() || id.starts_with("c01") || id.starts_with("c02")
}

fn sample_pair<R, D, P>(rng: &mut R, tries: usize, fallback: (i64, i64), mut draw: D, accept: P) -> (i64, i64)
where
  R: Rng + ?Sized,
  D: FnMut(&mut R) -> (i64, i64),
  P: Fn(i64, i64) -> bool,
{
  for _ in 0..tries {
    let (a, b) = draw(rng);
    if accept(a, b) {
      return (a, b);
    }
  }
  fallback
}

fn tenths<R: Rng + ?Sized>(rng: &mut R, lo: i64, hi: i64) -> f64 {
  round_to_tenth(rng.gen_range(lo..=hi) as f64 / 10.0)
}

/// Operands for `op` at `level`, shaped by `topic` and the chapter id.
pub fn operands_for<R: Rng + ?Sized>(rng: &mut R, op: Operator, level: u8, topic: Topic, chapter_id: &str) -> Operands {
  match op {
    Operator::Add => addition(rng, level, topic, chapter_id),
    Operator::Sub => subtraction(rng, level, topic, chapter_id),
    Operator::Mul => multiplication(rng, level, topic),
    Operator::Div => division(rng, level, topic),
  }
}

pub fn addition<R: Rng + ?Sized>(rng: &mut R, level: u8, topic: Topic, chapter_id: &str) -> Operands {
  if topic.is_decimal() {
    let num1 = tenths(rng, 1, 50);
    let num2 = tenths(rng, 1, 50);
    return Operands { num1, num2, answer: None };
  }

  let pair = match topic {
    Topic::FourDigit => sample_pair(
      rng,
      WIDE_RANGE_TRIES,
      FALLBACK_FOUR_DIGIT_CARRY,
      |r| (r.gen_range(1000..=8999), r.gen_range(1000..=8999)),
      carries,
    ),
    Topic::ThreeDigit => sample_pair(
      rng,
      WIDE_RANGE_TRIES,
      FALLBACK_THREE_DIGIT_CARRY,
      |r| (r.gen_range(100..=899), r.gen_range(100..=899)),
      carries,
    ),
    _ => match level {
      1 if is_early_unit(level, topic, chapter_id) => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_SMALL_SUM,
        |r| (r.gen_range(1..=8), r.gen_range(1..=8)),
        |a, b| a + b <= 9,
      ),
      1 => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_SMALL_SUM,
        |r| (r.gen_range(0..=9), r.gen_range(0..=9)),
        |a, b| a + b <= 9,
      ),
      2 => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_CARRY_PAIR,
        |r| (r.gen_range(10..=89), r.gen_range(1..=89)),
        carries,
      ),
      3 => (rng.gen_range(12..=300), rng.gen_range(8..=100)),
      _ => (rng.gen_range(100..=999), rng.gen_range(100..=999)),
    },
  };
  Operands::pair(pair)
}

pub fn subtraction<R: Rng + ?Sized>(rng: &mut R, level: u8, topic: Topic, chapter_id: &str) -> Operands {
  if topic.is_decimal() {
    let a = tenths(rng, 1, 50);
    let b = tenths(rng, 1, 50);
    let (num1, num2) = if a >= b { (a, b) } else { (b, a) };
    return Operands { num1, num2, answer: None };
  }

  let pair = match topic {
    Topic::FourDigit => sample_pair(
      rng,
      WIDE_RANGE_TRIES,
      FALLBACK_FOUR_DIGIT_BORROW,
      |r| (r.gen_range(2000..=9999), r.gen_range(1000..=9999)),
      borrows,
    ),
    Topic::ThreeDigit => sample_pair(
      rng,
      WIDE_RANGE_TRIES,
      FALLBACK_THREE_DIGIT_BORROW,
      |r| (r.gen_range(200..=999), r.gen_range(100..=999)),
      borrows,
    ),
    _ => match level {
      1 if is_early_unit(level, topic, chapter_id) => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_SMALL_DIFFERENCE,
        |r| (r.gen_range(1..=9), r.gen_range(1..=9)),
        |a, b| a >= b,
      ),
      1 => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_SMALL_DIFFERENCE,
        |r| (r.gen_range(0..=9), r.gen_range(0..=9)),
        |a, b| a >= b,
      ),
      2 => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_BORROW_PAIR,
        |r| (r.gen_range(10..=90), r.gen_range(0..=90)),
        borrows,
      ),
      3 => {
        let num1 = rng.gen_range(20..=500);
        (num1, rng.gen_range(1..=num1))
      }
      _ => sample_pair(
        rng,
        STANDARD_TRIES,
        FALLBACK_WIDE_DIFFERENCE,
        |r| (r.gen_range(100..=900), r.gen_range(50..=899)),
        |a, b| a >= b,
      ),
    },
  };
  Operands::pair(pair)
}

pub fn multiplication<R: Rng + ?Sized>(rng: &mut R, level: u8, topic: Topic) -> Operands {
  if topic.is_decimal() {
    let num1 = tenths(rng, 1, 30);
    let num2 = rng.gen_range(2..=5) as f64;
    return Operands { num1, num2, answer: None };
  }

  let pair = match level {
    1 => (rng.gen_range(0..=5), rng.gen_range(0..=5)),
    2 => (rng.gen_range(2..=9), rng.gen_range(2..=9)),
    3 => (rng.gen_range(2..=12), rng.gen_range(1..=9)),
    _ => (rng.gen_range(3..=18), rng.gen_range(3..=15)),
  };
  Operands::pair(pair)
}

pub fn division<R: Rng + ?Sized>(rng: &mut R, level: u8, topic: Topic) -> Operands {
  if topic.is_decimal() {
    let divisor = rng.gen_range(2..=5) as f64;
    let quotient = tenths(rng, 1, 20);
    return Operands { num1: round_to_tenth(divisor * quotient), num2: divisor, answer: Some(quotient) };
  }

  let (divisor, quotient): (i64, i64) = match level {
    1 => (rng.gen_range(1..=9), rng.gen_range(1..=9)),
    2 => (rng.gen_range(2..=9), rng.gen_range(2..=20)),
    3 => (rng.gen_range(2..=12), rng.gen_range(1..=30)),
    _ => (rng.gen_range(2..=12), rng.gen_range(2..=50)),
  };
  Operands {
    num1: (divisor * quotient) as f64,
    num2: divisor as f64,
    answer: Some(quotient as f64),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn as_int(x: f64) -> i64 {
    assert_eq!(x.fract(), 0.0, "expected an integer operand, got {x}");
    x as i64
  }

  #[test]
  fn level2_addition_always_carries() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
      let o = addition(&mut rng, 2, Topic::AdditionCarry, "");
      assert!(carries(as_int(o.num1), as_int(o.num2)), "{o:?}");
    }
  }

  #[test]
  fn level2_subtraction_always_borrows() {
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..100 {
      let o = subtraction(&mut rng, 2, Topic::SubtractionBorrow, "");
      assert!(borrows(as_int(o.num1), as_int(o.num2)), "{o:?}");
    }
  }

  #[test]
  fn subtraction_is_never_negative_at_any_level() {
    let mut rng = StdRng::seed_from_u64(13);
    for level in 1..=4 {
      for _ in 0..200 {
        let o = subtraction(&mut rng, level, Topic::General, "");
        assert!(o.num1 >= o.num2, "level {level}: {o:?}");
      }
    }
  }

  #[test]
  fn early_unit_has_no_zero_and_small_sums() {
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..200 {
      let o = addition(&mut rng, 1, Topic::Addition, "c01-number-basics");
      assert!(o.num1 >= 1.0 && o.num2 >= 1.0, "{o:?}");
      assert!(o.num1 + o.num2 <= 9.0, "{o:?}");
      let s = subtraction(&mut rng, 1, Topic::General, "C02-operations-basics");
      assert!(s.num1 >= 1.0 && s.num2 >= 1.0 && s.num1 >= s.num2, "{s:?}");
    }
  }

  #[test]
  fn early_unit_requires_level_one() {
    assert!(is_early_unit(1, Topic::General, "c01-add-basics"));
    assert!(is_early_unit(1, Topic::OperationsBasics, ""));
    assert!(!is_early_unit(2, Topic::NumberBasics, "c01-number-basics"));
    assert!(!is_early_unit(1, Topic::Shapes, "c07-shape-count"));
  }

  #[test]
  fn division_is_exact_by_construction() {
    let mut rng = StdRng::seed_from_u64(15);
    for level in 1..=4 {
      for _ in 0..200 {
        let o = division(&mut rng, level, Topic::Division);
        let (a, b) = (as_int(o.num1), as_int(o.num2));
        assert!(b > 0);
        assert_eq!(a % b, 0);
        assert_eq!(o.answer, Some((a / b) as f64));
      }
    }
  }

  #[test]
  fn digit_topics_shift_magnitude() {
    let mut rng = StdRng::seed_from_u64(16);
    for _ in 0..50 {
      let o = addition(&mut rng, 2, Topic::ThreeDigit, "");
      assert!((100.0..=999.0).contains(&o.num1) && (100.0..=999.0).contains(&o.num2));
      assert!(carries(as_int(o.num1), as_int(o.num2)));
      let o = subtraction(&mut rng, 3, Topic::FourDigit, "");
      assert!((1000.0..=9999.0).contains(&o.num1) && (1000.0..=9999.0).contains(&o.num2));
      assert!(o.num1 >= o.num2);
    }
  }

  #[test]
  fn decimal_operands_have_one_place() {
    let mut rng = StdRng::seed_from_u64(17);
    for op in Operator::ALL {
      for _ in 0..100 {
        let o = operands_for(&mut rng, op, 2, Topic::FractionDecimal, "c13-frac-dec");
        assert_eq!(round_to_tenth(o.num1), o.num1);
        assert_eq!(round_to_tenth(o.num2), o.num2);
        if op == Operator::Sub {
          assert!(o.num1 >= o.num2);
        }
        if op == Operator::Div {
          assert!(o.answer.is_some());
        }
      }
    }
  }

  #[test]
  fn fallback_pairs_satisfy_their_predicates() {
    assert!(carries(FALLBACK_CARRY_PAIR.0, FALLBACK_CARRY_PAIR.1));
    assert!(carries(FALLBACK_THREE_DIGIT_CARRY.0, FALLBACK_THREE_DIGIT_CARRY.1));
    assert!(carries(FALLBACK_FOUR_DIGIT_CARRY.0, FALLBACK_FOUR_DIGIT_CARRY.1));
    assert!(borrows(FALLBACK_BORROW_PAIR.0, FALLBACK_BORROW_PAIR.1));
    assert!(borrows(FALLBACK_THREE_DIGIT_BORROW.0, FALLBACK_THREE_DIGIT_BORROW.1));
    assert!(borrows(FALLBACK_FOUR_DIGIT_BORROW.0, FALLBACK_FOUR_DIGIT_BORROW.1));
    assert!(FALLBACK_SMALL_SUM.0 + FALLBACK_SMALL_SUM.1 <= 9);
    assert!(FALLBACK_WIDE_DIFFERENCE.0 >= FALLBACK_WIDE_DIFFERENCE.1);
  }

  #[test]
  fn exhausted_search_returns_fallback() {
    let mut rng = StdRng::seed_from_u64(18);
    let pair = sample_pair(&mut rng, 5, (1, 2), |r| (r.gen_range(0..=9), 0), |_, _| false);
    assert_eq!(pair, (1, 2));
  }
}
