//! Problem assembler.
//!
//! `generate_problem` resolves operands for a (level, operator, topic),
//! derives a fresh seed, asks the visual selector for a representation and
//! applies the visual's scoring override when it has one. Grade-1 "number
//! basics" chapters take a separate path that builds the visual first.

use rand::Rng;
use tracing::debug;

use crate::curriculum::CurriculumChapter;
use crate::domain::{NumberBasicsMode, Operator, Problem, ProblemOptions, MAX_LEVEL, MIN_LEVEL};
use crate::operands::{self, operands_for};
use crate::seed::fresh_seed;
use crate::topic::Topic;
use crate::util::{format_number, round_to_tenth};
use crate::visual::{self, select_visual, BuiltVisual, VisualRequest};

const NUMBER_BASICS_TOPIC: &str = "number-basics";

const LEVEL1_OPERATIONS: &[Operator] = &[Operator::Add, Operator::Sub];
const LEVEL2_OPERATIONS: &[Operator] = &[Operator::Add, Operator::Sub, Operator::Mul];

/// Operators a learner at `level` may be asked.
pub fn operations_by_level(level: u8) -> &'static [Operator] {
  match level {
    0 | 1 => LEVEL1_OPERATIONS,
    2 => LEVEL2_OPERATIONS,
    _ => &Operator::ALL,
  }
}

/// Numbers before the visual override is applied.
struct Draft {
  num1: f64,
  num2: f64,
  answer: f64,
}

/// Generate one problem. `level` is clamped to 1..=4.
pub fn generate_problem<R: Rng + ?Sized>(rng: &mut R, level: u8, operator: Operator, opts: &ProblemOptions) -> Problem {
  let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
  let topic = Topic::parse(&opts.topic);

  if uses_number_basics(level, operator, topic, &opts.chapter_id) {
    return number_basics(rng, operator, topic, opts);
  }

  let ops = operands_for(rng, operator, level, topic, &opts.chapter_id);
  let answer = ops.answer.unwrap_or_else(|| operator.apply(ops.num1, ops.num2));
  let draft = Draft { num1: ops.num1, num2: ops.num2, answer };

  let (n1, n2, ans) = (format_number(draft.num1), format_number(draft.num2), format_number(draft.answer));
  let lvl = level.to_string();
  let seed = fresh_seed(
    &[
      lvl.as_str(),
      operator.symbol(),
      opts.topic.as_str(),
      opts.chapter_id.as_str(),
      opts.chapter_title.as_str(),
      n1.as_str(),
      n2.as_str(),
      ans.as_str(),
    ],
    rng,
  );

  let built = select_visual(
    rng,
    &VisualRequest {
      topic,
      level,
      operator,
      num1: draft.num1,
      num2: draft.num2,
      answer: draft.answer,
      seed: &seed,
      chapter_title: &opts.chapter_title,
    },
  );

  assemble(level, operator, topic, opts.topic.trim(), opts, draft, seed, built)
}

/// Pick an operator at random for `level` and generate a topic-less problem.
pub fn generate_random_problem<R: Rng + ?Sized>(rng: &mut R, level: u8) -> Problem {
  let ops = operations_by_level(level);
  let operator = ops[rng.gen_range(0..ops.len())];
  generate_problem(rng, level, operator, &ProblemOptions::default())
}

/// A problem for one curriculum chapter, using one of its operators.
pub fn generate_chapter_problem<R: Rng + ?Sized>(
  rng: &mut R,
  chapter: &CurriculumChapter,
  number_basics_mode: Option<NumberBasicsMode>,
) -> Problem {
  let operator = match chapter.operations.len() {
    0 => Operator::Add,
    n => chapter.operations[rng.gen_range(0..n)],
  };
  let opts = ProblemOptions {
    topic: chapter.topic.clone(),
    chapter_id: chapter.id.clone(),
    chapter_title: chapter.title.clone(),
    number_basics_mode,
  };
  generate_problem(rng, chapter.level, operator, &opts)
}

fn uses_number_basics(level: u8, operator: Operator, topic: Topic, chapter_id: &str) -> bool {
  level == 1
    && matches!(operator, Operator::Add | Operator::Sub)
    && (topic == Topic::NumberBasics || chapter_id.trim().to_ascii_lowercase().starts_with("c01"))
}

/// Level-1 number basics: one of five modes, forced or drawn at random.
/// An explicit arithmetic topic keeps the arithmetic manipulative.
fn number_basics<R: Rng + ?Sized>(rng: &mut R, operator: Operator, topic: Topic, opts: &ProblemOptions) -> Problem {
  let raw_topic = opts.topic.trim();
  let mode = match opts.number_basics_mode {
    Some(mode) => mode,
    None if topic == Topic::NumberBasics || raw_topic.is_empty() => {
      NumberBasicsMode::ALL[rng.gen_range(0..NumberBasicsMode::ALL.len())]
    }
    None => NumberBasicsMode::SplitCombine,
  };
  let label = if raw_topic.is_empty() { NUMBER_BASICS_TOPIC } else { raw_topic };
  let seed = fresh_seed(
    &["1", operator.symbol(), label, opts.chapter_id.as_str(), opts.chapter_title.as_str(), mode.as_str()],
    rng,
  );

  let (draft, built) = match mode {
    NumberBasicsMode::SplitCombine => {
      let ops = match operator {
        Operator::Sub => operands::subtraction(rng, 1, Topic::NumberBasics, &opts.chapter_id),
        _ => operands::addition(rng, 1, Topic::NumberBasics, &opts.chapter_id),
      };
      let answer = operator.apply(ops.num1, ops.num2);
      let built = visual::split_combine(rng, operator, ops.num1, ops.num2, &seed);
      (Draft { num1: ops.num1, num2: ops.num2, answer }, built)
    }
    NumberBasicsMode::Counting => (Draft::placeholder(), visual::count_shapes(rng, &seed)),
    NumberBasicsMode::Zero => (Draft::placeholder(), visual::zero_concept()),
    NumberBasicsMode::Sequence => (Draft::placeholder(), visual::sequence(rng)),
    NumberBasicsMode::Compare => (Draft::placeholder(), visual::compare(rng)),
  };

  assemble(1, operator, topic, label, opts, draft, seed, Some(built))
}

impl Draft {
  fn placeholder() -> Self {
    Draft { num1: 0.0, num2: 0.0, answer: 0.0 }
  }
}

/// A visual's scoring, when present, replaces the arithmetic numbers.
/// Decimal problems without an override are rounded to one place.
#[allow(clippy::too_many_arguments)]
fn assemble(
  level: u8,
  operator: Operator,
  topic: Topic,
  topic_label: &str,
  opts: &ProblemOptions,
  draft: Draft,
  seed: String,
  built: Option<BuiltVisual>,
) -> Problem {
  let (visual, scoring) = match built {
    Some(b) => (Some(b.visual), b.scoring),
    None => (None, None),
  };
  let (num1, num2, answer) = match scoring {
    Some(s) => (s.num1, s.num2, s.answer),
    None if topic.is_decimal() => (round_to_tenth(draft.num1), round_to_tenth(draft.num2), round_to_tenth(draft.answer)),
    None => (draft.num1, draft.num2, draft.answer),
  };

  debug!(
    target: "problem",
    level,
    operator = %operator,
    topic = topic_label,
    chapter_id = %opts.chapter_id,
    visual = visual.as_ref().map(|v| v.kind()).unwrap_or("none"),
    %seed,
    "generated problem"
  );

  Problem {
    num1,
    num2,
    operator,
    answer,
    level,
    topic: topic_label.to_string(),
    chapter_id: opts.chapter_id.trim().to_string(),
    chapter_title: opts.chapter_title.clone(),
    seed,
    visual,
  }
}
