//! Curriculum topics as a closed set.
//!
//! Chapters and callers pass topics as strings. They are parsed once into
//! `Topic`; anything unrecognised becomes `Topic::General`, which gets plain
//! arithmetic with no visual.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
  NumberBasics,
  OperationsBasics,
  Addition,
  AdditionCarry,
  Subtraction,
  SubtractionBorrow,
  ThreeDigit,
  FourDigit,
  Multiplication,
  Division,
  FractionDecimal,
  Shapes,
  GeometryFigures,
  Circle,
  Compare,
  MeasurementLength,
  Clock,
  Data,
  General,
}

impl Topic {
  pub fn parse(raw: &str) -> Topic {
    match raw.trim().to_ascii_lowercase().as_str() {
      "number-basics" => Topic::NumberBasics,
      "operations-basics" => Topic::OperationsBasics,
      "addition" => Topic::Addition,
      "addition-carry" => Topic::AdditionCarry,
      "subtraction" => Topic::Subtraction,
      "subtraction-borrow" => Topic::SubtractionBorrow,
      "three-digit" => Topic::ThreeDigit,
      "four-digit" => Topic::FourDigit,
      "multiplication" => Topic::Multiplication,
      "division" => Topic::Division,
      "fraction-decimal" => Topic::FractionDecimal,
      "shapes" => Topic::Shapes,
      "geometry-figures" => Topic::GeometryFigures,
      "circle" => Topic::Circle,
      "compare" => Topic::Compare,
      "measurement-length" => Topic::MeasurementLength,
      "clock" | "time" | "clock-reading" => Topic::Clock,
      "data" => Topic::Data,
      _ => Topic::General,
    }
  }

  pub fn is_addition_like(self) -> bool {
    matches!(self, Topic::Addition | Topic::AdditionCarry)
  }

  pub fn is_subtraction_like(self) -> bool {
    matches!(self, Topic::Subtraction | Topic::SubtractionBorrow)
  }

  /// Topics of the first grade-1 unit, where operands never include zero.
  pub fn is_early_unit(self) -> bool {
    matches!(self, Topic::NumberBasics | Topic::OperationsBasics)
  }

  pub fn is_decimal(self) -> bool {
    self == Topic::FractionDecimal
  }

  pub fn is_shape_counting(self) -> bool {
    matches!(self, Topic::Shapes | Topic::GeometryFigures | Topic::Circle)
  }
}
