//! Text codecs for the paper evaluation league.
//!
//! Everything here is pure and synchronous:
//!
//! - [`parse_review`] turns generated review text into a
//!   [`ReviewBody`](league_core::review::ReviewBody),
//! - [`parse_verdict`] turns judge text into a
//!   [`Verdict`](league_core::evaluation::Verdict),
//! - [`prompt`] renders the prompts both are produced from,
//! - [`interchange`] reads and writes the YAML paper and match documents.
//!
//! The two parsers never fail. Missing or malformed sections keep their
//! defaults.
//!
//! # Quick start
//!
//! ```
//! use league_codec::parse_review;
//!
//! let review = parse_review("Rating: 7\nConfidence: medium");
//! assert_eq!(review.rating, 7);
//! ```

pub mod error;
pub mod interchange;
pub mod prompt;
mod review;
mod verdict;

pub use error::{Error, Result};
pub use review::parse_review;
pub use verdict::parse_verdict;

/// Extract the integer a value starts with, e.g. `7` from `"7/10"`.
pub(crate) fn leading_int(value: &str) -> Option<i64> {
  let value = value.trim_start();
  let (sign, digits) = match value.strip_prefix('-') {
    Some(rest) => (-1, rest),
    None => (1, value.strip_prefix('+').unwrap_or(value)),
  };
  let end = digits
    .find(|c: char| !c.is_ascii_digit())
    .unwrap_or(digits.len());
  digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Case-insensitive `strip_prefix` for ASCII headers.
pub(crate) fn strip_header<'a>(line: &'a str, header: &str) -> Option<&'a str> {
  let head = line.get(..header.len())?;
  head
    .eq_ignore_ascii_case(header)
    .then(|| &line[header.len()..])
}

/// Strip a leading list marker: `-`, `*`, `1.` or `1)`.
pub(crate) fn strip_marker(line: &str) -> &str {
  if let Some(rest) = line.strip_prefix(['-', '*']) {
    return rest.trim_start();
  }
  let digits = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
  if digits == 0 {
    return line;
  }
  match line[digits..].strip_prefix(['.', ')']) {
    Some(rest) => rest.trim_start(),
    None => line,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leading_int_reads_prefix() {
    assert_eq!(leading_int("7/10"), Some(7));
    assert_eq!(leading_int(" 10 out of 10"), Some(10));
    assert_eq!(leading_int("-2"), Some(-2));
    assert_eq!(leading_int("seven"), None);
    assert_eq!(leading_int(""), None);
  }

  #[test]
  fn strip_header_ignores_case() {
    assert_eq!(strip_header("RATING: 7", "rating:"), Some(" 7"));
    assert_eq!(strip_header("rat", "rating:"), None);
    assert_eq!(strip_header("Résumé: x", "rating:"), None);
  }

  #[test]
  fn marker_stripping() {
    assert_eq!(strip_marker("- item"), "item");
    assert_eq!(strip_marker("12) item"), "item");
    assert_eq!(strip_marker("2024 results"), "2024 results");
  }
}
