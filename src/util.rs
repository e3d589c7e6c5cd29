//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// One decimal place, nudged by epsilon so 0.15-style halves round up.
pub fn round_to_tenth(x: f64) -> f64 {
  ((x + f64::EPSILON) * 10.0).round() / 10.0
}

/// Integer rendering for whole numbers, one decimal otherwise ("7", "2.5").
pub fn format_number(x: f64) -> String {
  if x.fract() == 0.0 { format!("{}", x as i64) } else { format!("{:.1}", x) }
}

pub fn is_integral(x: f64) -> bool {
  x.is_finite() && x.fract() == 0.0
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_all_keys() {
    let out = fill_template("{a}개와 {b}개, 다시 {a}", &[("a", "3"), ("b", "4")]);
    assert_eq!(out, "3개와 4개, 다시 3");
  }

  #[test]
  fn tenths() {
    assert_eq!(round_to_tenth(1.25), 1.3);
    assert_eq!(round_to_tenth(0.1 + 0.2), 0.3);
    assert_eq!(round_to_tenth(4.0), 4.0);
  }

  #[test]
  fn number_formatting() {
    assert_eq!(format_number(7.0), "7");
    assert_eq!(format_number(2.5), "2.5");
    assert_eq!(format_number(-3.0), "-3");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let out = trunc_for_log("가나다라마", 2);
    assert!(out.starts_with("가나…"));
  }
}
