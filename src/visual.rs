//! Visual representations attached to problems, and the selector that picks one.
//!
//! `select_visual` walks a fixed dispatch order (first match wins):
//!   1. level-1 addition/subtraction topics  -> split-combine manipulative
//!   2. level-2 carry/borrow topics           -> base-10 blocks
//!   3. fraction/decimal at level 2+          -> fraction cuts
//!   4. shapes, compare, length, clock, data  -> self-scoring visuals
//!   5. otherwise                             -> none
//!
//! Self-scoring visuals return a `VisualScoring`; when present it replaces
//! the arithmetic operands and answer. Layout values (placement, jitter,
//! colour) are derived from the problem seed via `seed::ranged_int`.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::Operator;
use crate::seed::{layout_key, ranged_int};
use crate::topic::Topic;
use crate::util::{fill_template, format_number};

const SHAPE_PALETTE: &[&str] = &["🔺", "🟦", "🟢", "⭐", "🔷", "🟨"];
const FRUIT_LABELS: &[&str] = &["🍎", "🍌", "🍇", "🍊", "🍓", "🍑", "🍉", "🍒"];
const MANIPULATIVE_TARGETS: &[&str] = &["🍎", "🍓", "🍪", "⚽", "🐟"];
const ORDINAL_ANIMALS: &[&str] = &["🐶", "🐱", "🐰", "🐻", "🐼", "🦊", "🐸", "🐵", "🐯"];
const COMPARE_GROUPS: &[(&str, &str)] = &[("사과", "🍎"), ("바나나", "🍌"), ("딸기", "🍓"), ("사탕", "🍬"), ("공", "⚽")];
const LENGTH_LABELS: (&str, &str) = ("연필", "지우개");
const CLOCK_TITLE_KEYWORDS: &[&str] = &["시계", "시각", "시간"];

const MIN_SHAPES: usize = 5;
const MAX_SHAPES: usize = 10;
const MIN_SPLIT_TOTAL: u32 = 2;
const MAX_SPLIT_TOTAL: u32 = 24;
const DISTINCT_TRIES: usize = 100;
/// 7 vs 3: used when two distinct small counts cannot be drawn.
const FALLBACK_DISTINCT_PAIR: (u32, u32) = (7, 3);

const PROMPT_COMBINE: &str = "{num1}개와 {num2}개를 모으면 모두 몇 개일까요?";
const PROMPT_SPLIT: &str = "{num1}개에서 {num2}개를 덜어 내면 몇 개가 남을까요?";
const PROMPT_CARRY: &str = "{num1} + {num2}: 일의 자리가 10을 넘으면 낱개 10개를 십 모형 하나로 바꿔요.";
const PROMPT_BORROW: &str = "{num1} - {num2}: 일의 자리가 모자라면 십 모형 하나를 낱개 10개로 쪼개요.";
const PROMPT_FRACTION: &str = "피자를 {denominator}조각으로 자르고 {numerator}조각에 색칠해 보세요.";
const PROMPT_SHAPES: &str = "‘{target}’ 개수를 세보세요.";
const PROMPT_CLOCK: &str = "시계를 보고 시각을 hhmm 형식으로 입력하세요.";
const PROMPT_CHART: &str = "{top}은(는) {second}보다 몇 개 더 많나요?";
const PROMPT_LENGTH: &str = "{longer}은(는) {shorter}보다 몇 칸 더 길까요?";
const PROMPT_ZERO: &str = "접시 위에 사과가 하나도 없어요. 사과는 몇 개일까요?";
const PROMPT_NEXT: &str = "{base} 다음에 오는 수는 무엇일까요?";
const PROMPT_PREVIOUS: &str = "{base} 바로 앞의 수는 무엇일까요?";
const PROMPT_ORDINAL: &str = "색칠된 동물은 왼쪽에서 몇 번째에 있을까요?";
const PROMPT_COMPARE: &str = "{left}와(과) {right} 중 어느 쪽이 몇 개 더 많을까요?";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Visual {
  CountShapes(CountShapes),
  ClockReading(ClockReading),
  ChartBar(ChartBar),
  MeasurementLength(MeasurementLength),
  ZeroConcept(ZeroConcept),
  Sequence(SequenceVisual),
  Compare(CompareVisual),
  Interactive(Manipulative),
}

/// Manipulatives the learner drags or taps, tagged by `subType`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subType", rename_all = "kebab-case")]
pub enum Manipulative {
  SplitCombine(SplitCombine),
  #[serde(rename = "base-10-blocks")]
  Base10Blocks(Base10Blocks),
  FractionCuts(FractionCuts),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
  pub left: i64,
  pub top: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jitter {
  pub x: i64,
  pub y: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountShapes {
  pub target: String,
  pub items: Vec<String>,
  /// Percent offsets inside the play area, one per item.
  pub placements: Vec<Placement>,
  pub prompt: String,
  pub answer: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
  pub hour: u32,
  pub minute: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockReading {
  pub time: ClockTime,
  pub prompt: String,
  /// `hour * 100 + minute`, i.e. the digits typed as hhmm.
  pub answer: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarDatum {
  pub label: String,
  pub value: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBar {
  pub question: String,
  pub data: Vec<BarDatum>,
  pub answer: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LengthItem {
  pub label: String,
  pub length: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementLength {
  pub question: String,
  pub items: Vec<LengthItem>,
  pub answer: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroConcept {
  pub count: u32,
  pub prompt: String,
  pub answer: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequenceMode {
  Next,
  Previous,
  Ordinal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceVisual {
  pub mode: SequenceMode,
  /// Reference number for next/previous; highlighted position for ordinal.
  pub base: u32,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub items: Vec<String>,
  pub prompt: String,
  pub answer: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompareGroup {
  pub label: String,
  pub emoji: String,
  pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareVisual {
  pub prompt: String,
  pub groups: Vec<CompareGroup>,
  pub answer: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitCombine {
  pub target: String,
  pub total_count: u32,
  pub is_addition: bool,
  pub prompt: String,
  pub jitter: Vec<Jitter>,
  pub seed: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base10Blocks {
  pub num1_tens: u32,
  pub num1_ones: u32,
  pub num2_tens: u32,
  pub num2_ones: u32,
  /// Initial rods and units on the board.
  pub tens_count: u32,
  pub ones_count: u32,
  pub is_carry_mode: bool,
  pub is_borrow_mode: bool,
  pub prompt: String,
  pub seed: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FractionCuts {
  pub denominator: u32,
  pub numerator: u32,
  pub total_slices: u32,
  pub colored_count: u32,
  pub hue: i64,
  pub prompt: String,
  pub seed: String,
}

impl Visual {
  /// The answer this visual scores by, if it defines one.
  pub fn answer(&self) -> Option<f64> {
    match self {
      Visual::CountShapes(v) => Some(f64::from(v.answer)),
      Visual::ClockReading(v) => Some(f64::from(v.answer)),
      Visual::ChartBar(v) => Some(f64::from(v.answer)),
      Visual::MeasurementLength(v) => Some(f64::from(v.answer)),
      Visual::ZeroConcept(v) => Some(f64::from(v.answer)),
      Visual::Sequence(v) => Some(f64::from(v.answer)),
      Visual::Compare(v) => Some(f64::from(v.answer)),
      Visual::Interactive(_) => None,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Visual::CountShapes(_) => "count-shapes",
      Visual::ClockReading(_) => "clock-reading",
      Visual::ChartBar(_) => "chart-bar",
      Visual::MeasurementLength(_) => "measurement-length",
      Visual::ZeroConcept(_) => "zero-concept",
      Visual::Sequence(_) => "sequence",
      Visual::Compare(_) => "compare",
      Visual::Interactive(Manipulative::SplitCombine(_)) => "split-combine",
      Visual::Interactive(Manipulative::Base10Blocks(_)) => "base-10-blocks",
      Visual::Interactive(Manipulative::FractionCuts(_)) => "fraction-cuts",
    }
  }
}

/// Numbers a self-scoring visual imposes on its problem.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualScoring {
  pub num1: f64,
  pub num2: f64,
  pub answer: f64,
}

impl VisualScoring {
  fn new(num1: u32, num2: u32, answer: u32) -> Self {
    VisualScoring { num1: f64::from(num1), num2: f64::from(num2), answer: f64::from(answer) }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuiltVisual {
  pub visual: Visual,
  pub scoring: Option<VisualScoring>,
}

impl BuiltVisual {
  fn display_only(visual: Visual) -> Self {
    BuiltVisual { visual, scoring: None }
  }

  fn scored(visual: Visual, scoring: VisualScoring) -> Self {
    BuiltVisual { visual, scoring: Some(scoring) }
  }
}

/// Everything the selector looks at.
#[derive(Clone, Copy, Debug)]
pub struct VisualRequest<'a> {
  pub topic: Topic,
  pub level: u8,
  pub operator: Operator,
  pub num1: f64,
  pub num2: f64,
  pub answer: f64,
  pub seed: &'a str,
  pub chapter_title: &'a str,
}

pub fn is_clock_chapter(topic: Topic, chapter_title: &str) -> bool {
  topic == Topic::Clock || CLOCK_TITLE_KEYWORDS.iter().any(|k| chapter_title.contains(k))
}

/// Pick and build the visual for a problem, or `None` for plain arithmetic.
pub fn select_visual<R: Rng + ?Sized>(rng: &mut R, req: &VisualRequest<'_>) -> Option<BuiltVisual> {
  let additive = matches!(req.operator, Operator::Add | Operator::Sub);
  let topic = req.topic;

  if req.level == 1
    && additive
    && (topic.is_addition_like() || topic.is_subtraction_like() || topic.is_early_unit())
  {
    return Some(split_combine(rng, req.operator, req.num1, req.num2, req.seed));
  }
  if req.level == 2 && matches!(topic, Topic::AdditionCarry | Topic::SubtractionBorrow) {
    return Some(base_ten_blocks(req.operator, req.num1, req.num2, req.seed));
  }
  if topic.is_decimal() && req.level >= 2 {
    return Some(fraction_cuts(req.answer, req.seed));
  }
  if topic.is_shape_counting() {
    return Some(count_shapes(rng, req.seed));
  }
  match topic {
    Topic::Compare => Some(compare(rng)),
    Topic::MeasurementLength => Some(measurement_length(rng)),
    _ if is_clock_chapter(topic, req.chapter_title) => Some(clock_reading(rng)),
    Topic::Data => Some(chart_bar(rng)),
    _ => None,
  }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, palette: &[&'a str]) -> &'a str {
  palette[rng.gen_range(0..palette.len())]
}

fn distinct_pair<R: Rng + ?Sized>(rng: &mut R, lo: u32, hi: u32) -> (u32, u32) {
  for _ in 0..DISTINCT_TRIES {
    let a = rng.gen_range(lo..=hi);
    let b = rng.gen_range(lo..=hi);
    if a != b {
      return (a, b);
    }
  }
  FALLBACK_DISTINCT_PAIR
}

pub fn split_combine<R: Rng + ?Sized>(rng: &mut R, op: Operator, num1: f64, num2: f64, seed: &str) -> BuiltVisual {
  let is_addition = op == Operator::Add;
  let raw_total = if is_addition { num1 + num2 } else { num1 };
  let total_count = (raw_total.max(0.0).round() as u32).clamp(MIN_SPLIT_TOTAL, MAX_SPLIT_TOTAL);
  let (a, b) = (format_number(num1), format_number(num2));
  let tpl = if is_addition { PROMPT_COMBINE } else { PROMPT_SPLIT };
  let jitter = (1..=total_count)
    .map(|i| {
      let id = format!("item-{}", i);
      Jitter {
        x: ranged_int(&layout_key(seed, &id, "x"), -18, 18),
        y: ranged_int(&layout_key(seed, &id, "y"), -10, 10),
      }
    })
    .collect();

  BuiltVisual::display_only(Visual::Interactive(Manipulative::SplitCombine(SplitCombine {
    target: pick(rng, MANIPULATIVE_TARGETS).to_string(),
    total_count,
    is_addition,
    prompt: fill_template(tpl, &[("num1", &a), ("num2", &b)]),
    jitter,
    seed: seed.to_string(),
  })))
}

pub fn base_ten_blocks(op: Operator, num1: f64, num2: f64, seed: &str) -> BuiltVisual {
  let (n1, n2) = (num1.max(0.0).round() as u32, num2.max(0.0).round() as u32);
  let (num1_tens, num1_ones) = (n1 / 10, n1 % 10);
  let (num2_tens, num2_ones) = (n2 / 10, n2 % 10);
  let is_borrow_mode = op == Operator::Sub;
  let (tens_count, ones_count) = if is_borrow_mode {
    (num1_tens, num1_ones)
  } else {
    (num1_tens + num2_tens, num1_ones + num2_ones)
  };
  let tpl = if is_borrow_mode { PROMPT_BORROW } else { PROMPT_CARRY };
  let (a, b) = (n1.to_string(), n2.to_string());

  BuiltVisual::display_only(Visual::Interactive(Manipulative::Base10Blocks(Base10Blocks {
    num1_tens,
    num1_ones,
    num2_tens,
    num2_ones,
    tens_count,
    ones_count,
    is_carry_mode: !is_borrow_mode,
    is_borrow_mode,
    prompt: fill_template(tpl, &[("num1", &a), ("num2", &b)]),
    seed: seed.to_string(),
  })))
}

/// Slice count and coloured slices derived from the decimal answer.
pub fn fraction_shape(answer: f64) -> (u32, u32) {
  let magnitude = if answer.is_finite() { answer.abs() } else { 0.0 };
  let denominator = (2 + ((magnitude * 10.0) % 8.0).floor() as i64).clamp(2, 10);
  let raw = ((magnitude * denominator as f64) % denominator as f64).floor() as i64;
  let numerator = if raw == 0 { 1 } else { raw }.clamp(1, denominator - 1);
  (denominator as u32, numerator as u32)
}

pub fn fraction_cuts(answer: f64, seed: &str) -> BuiltVisual {
  let (denominator, numerator) = fraction_shape(answer);
  let (d, n) = (denominator.to_string(), numerator.to_string());

  BuiltVisual::display_only(Visual::Interactive(Manipulative::FractionCuts(FractionCuts {
    denominator,
    numerator,
    total_slices: denominator,
    colored_count: numerator,
    hue: ranged_int(&format!("{}-color", seed), 18, 45),
    prompt: fill_template(PROMPT_FRACTION, &[("denominator", &d), ("numerator", &n)]),
    seed: seed.to_string(),
  })))
}

pub fn count_shapes<R: Rng + ?Sized>(rng: &mut R, seed: &str) -> BuiltVisual {
  let len = rng.gen_range(MIN_SHAPES..=MAX_SHAPES);
  let mut items: Vec<String> = (0..len).map(|_| pick(rng, SHAPE_PALETTE).to_string()).collect();
  let target = pick(rng, SHAPE_PALETTE).to_string();
  if !items.iter().any(|s| *s == target) {
    let slot = rng.gen_range(0..len);
    items[slot] = target.clone();
  }
  let answer = items.iter().filter(|s| **s == target).count() as u32;
  let placements = (0..len)
    .map(|i| Placement {
      left: ranged_int(&layout_key(seed, i, "left"), 6, 88),
      top: ranged_int(&layout_key(seed, i, "top"), 12, 82),
    })
    .collect();
  let prompt = fill_template(PROMPT_SHAPES, &[("target", &target)]);

  BuiltVisual::scored(
    Visual::CountShapes(CountShapes { target, items, placements, prompt, answer }),
    VisualScoring::new(answer, 0, answer),
  )
}

pub fn clock_reading<R: Rng + ?Sized>(rng: &mut R) -> BuiltVisual {
  let hour = rng.gen_range(1..=12);
  let minute = rng.gen_range(0..12) * 5;
  clock_at(hour, minute)
}

/// Clock visual for a fixed time. The answer is the hhmm digits, not minutes.
pub fn clock_at(hour: u32, minute: u32) -> BuiltVisual {
  let answer = hour * 100 + minute;
  BuiltVisual::scored(
    Visual::ClockReading(ClockReading {
      time: ClockTime { hour, minute },
      prompt: PROMPT_CLOCK.to_string(),
      answer,
    }),
    VisualScoring::new(hour, minute, answer),
  )
}

pub fn chart_bar<R: Rng + ?Sized>(rng: &mut R) -> BuiltVisual {
  let count = rng.gen_range(2..=5);
  let labels: Vec<&str> = FRUIT_LABELS.choose_multiple(rng, count).copied().collect();
  let mut values: Vec<u32> = labels.iter().map(|_| rng.gen_range(1..=7)).collect();

  // Each pass lowers the runner-up, or lifts a 1-vs-1 leader, so this terminates.
  let (top, second) = loop {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*b].cmp(&values[*a]));
    let (top, second) = (order[0], order[1]);
    if values[top] != values[second] {
      break (top, second);
    }
    if values[second] > 1 {
      values[second] -= 1;
    } else {
      values[top] += 1;
    }
  };

  let answer = values[top] - values[second];
  let question = fill_template(PROMPT_CHART, &[("top", labels[top]), ("second", labels[second])]);
  let data = labels
    .iter()
    .zip(&values)
    .map(|(label, value)| BarDatum { label: label.to_string(), value: *value })
    .collect();

  BuiltVisual::scored(
    Visual::ChartBar(ChartBar { question, data, answer }),
    VisualScoring::new(values[top], values[second], answer),
  )
}

pub fn measurement_length<R: Rng + ?Sized>(rng: &mut R) -> BuiltVisual {
  let (a, b) = distinct_pair(rng, 2, 9);
  let (first, second) = LENGTH_LABELS;
  let (longer, shorter) = if a > b { (first, second) } else { (second, first) };
  let answer = a.abs_diff(b);

  BuiltVisual::scored(
    Visual::MeasurementLength(MeasurementLength {
      question: fill_template(PROMPT_LENGTH, &[("longer", longer), ("shorter", shorter)]),
      items: vec![
        LengthItem { label: first.to_string(), length: a },
        LengthItem { label: second.to_string(), length: b },
      ],
      answer,
    }),
    VisualScoring::new(a.max(b), a.min(b), answer),
  )
}

pub fn zero_concept() -> BuiltVisual {
  BuiltVisual::scored(
    Visual::ZeroConcept(ZeroConcept { count: 0, prompt: PROMPT_ZERO.to_string(), answer: 0 }),
    VisualScoring::new(0, 0, 0),
  )
}

pub fn sequence<R: Rng + ?Sized>(rng: &mut R) -> BuiltVisual {
  let (mode, base, answer, items, scoring) = match rng.gen_range(0..3) {
    0 => {
      let base = rng.gen_range(1..=8);
      (SequenceMode::Next, base, base + 1, Vec::new(), VisualScoring::new(base, 1, base + 1))
    }
    1 => {
      let base = rng.gen_range(2..=9);
      (SequenceMode::Previous, base, base - 1, Vec::new(), VisualScoring::new(base, 1, base - 1))
    }
    _ => {
      let index = rng.gen_range(1..=9);
      let items = ORDINAL_ANIMALS.iter().map(|s| s.to_string()).collect();
      (SequenceMode::Ordinal, index, index, items, VisualScoring::new(index, 0, index))
    }
  };
  let base_text = base.to_string();
  let prompt = match mode {
    SequenceMode::Next => fill_template(PROMPT_NEXT, &[("base", &base_text)]),
    SequenceMode::Previous => fill_template(PROMPT_PREVIOUS, &[("base", &base_text)]),
    SequenceMode::Ordinal => PROMPT_ORDINAL.to_string(),
  };

  BuiltVisual::scored(Visual::Sequence(SequenceVisual { mode, base, items, prompt, answer }), scoring)
}

pub fn compare<R: Rng + ?Sized>(rng: &mut R) -> BuiltVisual {
  let (a, b) = distinct_pair(rng, 1, 9);
  let chosen: Vec<&(&str, &str)> = COMPARE_GROUPS.choose_multiple(rng, 2).collect();
  let (left, right) = (chosen[0], chosen[1]);
  let answer = a.abs_diff(b);

  BuiltVisual::scored(
    Visual::Compare(CompareVisual {
      prompt: fill_template(PROMPT_COMPARE, &[("left", left.0), ("right", right.0)]),
      groups: vec![
        CompareGroup { label: left.0.to_string(), emoji: left.1.to_string(), count: a },
        CompareGroup { label: right.0.to_string(), emoji: right.1.to_string(), count: b },
      ],
      answer,
    }),
    VisualScoring::new(a.max(b), a.min(b), answer),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn request(topic: Topic, level: u8, operator: Operator, num1: f64, num2: f64) -> VisualRequest<'static> {
    VisualRequest {
      topic,
      level,
      operator,
      num1,
      num2,
      answer: operator.apply(num1, num2),
      seed: "seed-1",
      chapter_title: "",
    }
  }

  #[test]
  fn shape_count_matches_items() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..300 {
      let built = count_shapes(&mut rng, "s");
      let Visual::CountShapes(v) = &built.visual else { panic!("wrong visual") };
      assert!((MIN_SHAPES..=MAX_SHAPES).contains(&v.items.len()));
      assert_eq!(v.placements.len(), v.items.len());
      let counted = v.items.iter().filter(|s| **s == v.target).count() as u32;
      assert_eq!(v.answer, counted);
      assert!(v.answer >= 1);
      assert_eq!(built.scoring.map(|s| s.answer), Some(f64::from(counted)));
    }
  }

  #[test]
  fn shape_placements_are_stable_for_a_seed() {
    let mut a = StdRng::seed_from_u64(5);
    let mut b = StdRng::seed_from_u64(5);
    let first = count_shapes(&mut a, "same-seed");
    let second = count_shapes(&mut b, "same-seed");
    assert_eq!(first, second);
  }

  #[test]
  fn clock_answer_is_hhmm_not_minutes() {
    let built = clock_at(3, 30);
    assert_eq!(built.visual.answer(), Some(330.0));
    assert_ne!(built.visual.answer(), Some(210.0));
    let s = built.scoring.expect("clock scores itself");
    assert_eq!((s.num1, s.num2, s.answer), (3.0, 30.0, 330.0));
  }

  #[test]
  fn random_clock_uses_five_minute_marks() {
    let mut rng = StdRng::seed_from_u64(22);
    for _ in 0..200 {
      let Visual::ClockReading(v) = clock_reading(&mut rng).visual else { panic!() };
      assert!((1..=12).contains(&v.time.hour));
      assert_eq!(v.time.minute % 5, 0);
      assert!(v.time.minute < 60);
      assert_eq!(v.answer, v.time.hour * 100 + v.time.minute);
    }
  }

  #[test]
  fn chart_top_two_are_distinct_and_named() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..300 {
      let Visual::ChartBar(v) = chart_bar(&mut rng).visual else { panic!() };
      assert!((2..=5).contains(&v.data.len()));
      let mut sorted = v.data.clone();
      sorted.sort_by(|a, b| b.value.cmp(&a.value));
      assert_ne!(sorted[0].value, sorted[1].value);
      assert_eq!(v.answer, sorted[0].value - sorted[1].value);
      assert!(v.question.contains(&sorted[0].label));
      assert!(v.question.contains(&sorted[1].label));
      let mut labels: Vec<_> = v.data.iter().map(|d| d.label.clone()).collect();
      labels.dedup();
      assert_eq!(labels.len(), v.data.len());
    }
  }

  #[test]
  fn length_and_compare_use_absolute_difference() {
    let mut rng = StdRng::seed_from_u64(24);
    for _ in 0..100 {
      let Visual::MeasurementLength(m) = measurement_length(&mut rng).visual else { panic!() };
      assert_ne!(m.items[0].length, m.items[1].length);
      assert_eq!(m.answer, m.items[0].length.abs_diff(m.items[1].length));
      assert!(m.items.iter().all(|i| (2..=9).contains(&i.length)));

      let Visual::Compare(c) = compare(&mut rng).visual else { panic!() };
      assert_ne!(c.groups[0].count, c.groups[1].count);
      assert_eq!(c.answer, c.groups[0].count.abs_diff(c.groups[1].count));
      assert_ne!(c.groups[0].label, c.groups[1].label);
    }
  }

  #[test]
  fn sequence_modes_answer_correctly() {
    let mut rng = StdRng::seed_from_u64(25);
    for _ in 0..200 {
      let Visual::Sequence(s) = sequence(&mut rng).visual else { panic!() };
      match s.mode {
        SequenceMode::Next => assert_eq!(s.answer, s.base + 1),
        SequenceMode::Previous => assert_eq!(s.answer, s.base - 1),
        SequenceMode::Ordinal => {
          assert_eq!(s.answer, s.base);
          assert!((1..=9).contains(&s.base));
        }
      }
      assert!(!s.prompt.is_empty());
    }
  }

  #[test]
  fn zero_concept_is_always_zero() {
    let built = zero_concept();
    assert_eq!(built.visual.answer(), Some(0.0));
    let Visual::ZeroConcept(z) = built.visual else { panic!() };
    assert_eq!(z.count, 0);
  }

  #[test]
  fn level1_addition_gets_split_combine() {
    let mut rng = StdRng::seed_from_u64(26);
    let built = select_visual(&mut rng, &request(Topic::Addition, 1, Operator::Add, 3.0, 4.0)).unwrap();
    assert!(built.scoring.is_none());
    let Visual::Interactive(Manipulative::SplitCombine(v)) = built.visual else { panic!() };
    assert_eq!(v.total_count, 7);
    assert!(v.prompt.contains('3') && v.prompt.contains('4'));
    assert_eq!(v.jitter.len(), 7);
    assert!(v.jitter.iter().all(|j| (-18..=18).contains(&j.x) && (-10..=10).contains(&j.y)));
  }

  #[test]
  fn split_combine_total_is_clamped() {
    let mut rng = StdRng::seed_from_u64(27);
    let small = split_combine(&mut rng, Operator::Sub, 1.0, 1.0, "s");
    let large = split_combine(&mut rng, Operator::Add, 20.0, 20.0, "s");
    let Visual::Interactive(Manipulative::SplitCombine(s)) = small.visual else { panic!() };
    let Visual::Interactive(Manipulative::SplitCombine(l)) = large.visual else { panic!() };
    assert_eq!(s.total_count, MIN_SPLIT_TOTAL);
    assert_eq!(l.total_count, MAX_SPLIT_TOTAL);
  }

  #[test]
  fn carry_and_borrow_get_base_ten_blocks() {
    let mut rng = StdRng::seed_from_u64(28);
    let built = select_visual(&mut rng, &request(Topic::AdditionCarry, 2, Operator::Add, 37.0, 28.0)).unwrap();
    let Visual::Interactive(Manipulative::Base10Blocks(b)) = built.visual else { panic!() };
    assert_eq!((b.num1_tens, b.num1_ones, b.num2_tens, b.num2_ones), (3, 7, 2, 8));
    assert_eq!((b.tens_count, b.ones_count), (5, 15));
    assert!(b.is_carry_mode && !b.is_borrow_mode);

    let built = select_visual(&mut rng, &request(Topic::SubtractionBorrow, 2, Operator::Sub, 62.0, 18.0)).unwrap();
    let Visual::Interactive(Manipulative::Base10Blocks(b)) = built.visual else { panic!() };
    assert_eq!((b.tens_count, b.ones_count), (6, 2));
    assert!(b.is_borrow_mode);
  }

  #[test]
  fn fraction_shape_rules() {
    // 3.7 -> 37 % 8 = 5 -> 7 slices; 3.7 * 7 = 25.9 % 7 = 4.9 -> 4
    assert_eq!(fraction_shape(3.7), (7, 4));
    // 0.8 -> 8 % 8 = 0 -> 2 slices; 1.6 % 2 = 1.6 -> 1
    assert_eq!(fraction_shape(0.8), (2, 1));
    // zero numerator is bumped to 1
    assert_eq!(fraction_shape(2.0).1, 1);
    for tenths in 1..200 {
      let (d, n) = fraction_shape(tenths as f64 / 10.0);
      assert!((2..=10).contains(&d));
      assert!(n >= 1 && n < d);
    }
  }

  #[test]
  fn decimal_topic_gets_fraction_cuts_from_level_two() {
    let mut rng = StdRng::seed_from_u64(29);
    let built = select_visual(&mut rng, &request(Topic::FractionDecimal, 2, Operator::Add, 1.2, 2.5)).unwrap();
    assert_eq!(built.visual.kind(), "fraction-cuts");
    assert!(select_visual(&mut rng, &request(Topic::FractionDecimal, 1, Operator::Mul, 1.2, 2.0)).is_none());
  }

  #[test]
  fn dispatch_for_self_scoring_topics() {
    let mut rng = StdRng::seed_from_u64(30);
    let kinds = [
      (Topic::Shapes, "count-shapes"),
      (Topic::GeometryFigures, "count-shapes"),
      (Topic::Circle, "count-shapes"),
      (Topic::Compare, "compare"),
      (Topic::MeasurementLength, "measurement-length"),
      (Topic::Clock, "clock-reading"),
      (Topic::Data, "chart-bar"),
    ];
    for (topic, kind) in kinds {
      let built = select_visual(&mut rng, &request(topic, 3, Operator::Add, 1.0, 2.0)).unwrap();
      assert_eq!(built.visual.kind(), kind);
      assert!(built.scoring.is_some());
    }
  }

  #[test]
  fn clock_by_chapter_title_keyword() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut req = request(Topic::General, 3, Operator::Add, 1.0, 2.0);
    req.chapter_title = "시각과 시간";
    assert_eq!(select_visual(&mut rng, &req).unwrap().visual.kind(), "clock-reading");
    req.chapter_title = "곱셈구구";
    assert!(select_visual(&mut rng, &req).is_none());
  }

  #[test]
  fn plain_topics_have_no_visual() {
    let mut rng = StdRng::seed_from_u64(32);
    assert!(select_visual(&mut rng, &request(Topic::Multiplication, 3, Operator::Mul, 4.0, 5.0)).is_none());
    assert!(select_visual(&mut rng, &request(Topic::Addition, 2, Operator::Add, 14.0, 5.0)).is_none());
    assert!(select_visual(&mut rng, &request(Topic::General, 1, Operator::Add, 1.0, 2.0)).is_none());
  }

  #[test]
  fn wire_format_has_type_and_subtype() {
    let mut rng = StdRng::seed_from_u64(33);
    let built = split_combine(&mut rng, Operator::Add, 2.0, 3.0, "s");
    let json = serde_json::to_value(&built.visual).unwrap();
    assert_eq!(json["type"], "interactive");
    assert_eq!(json["subType"], "split-combine");
    assert_eq!(json["totalCount"], 5);
    let back: Visual = serde_json::from_value(json).unwrap();
    assert_eq!(back, built.visual);

    let clock = serde_json::to_value(&clock_at(3, 30).visual).unwrap();
    assert_eq!(clock["type"], "clock-reading");
    assert_eq!(clock["time"]["hour"], 3);

    let blocks = serde_json::to_value(&base_ten_blocks(Operator::Add, 48.0, 7.0, "s").visual).unwrap();
    assert_eq!(blocks["subType"], "base-10-blocks");
    assert_eq!(blocks["isCarryMode"], true);
  }
}
