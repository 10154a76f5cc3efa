//! Line-oriented review parser.
//!
//! Pipeline:
//!   raw &str
//!     └─ trimmed, non-blank lines
//!          └─ match_header()  → switch section (inline value for rating,
//!          │                    confidence and summary)
//!          └─ otherwise       → append to the active section

use league_core::review::{ReviewBody, ReviewConfidence};

use crate::{leading_int, strip_header, strip_marker};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
  Summary,
  Strengths,
  Weaknesses,
  Questions,
  Rating,
  Confidence,
}

const HEADERS: [(&str, Section); 6] = [
  ("summary:", Section::Summary),
  ("strengths:", Section::Strengths),
  ("weaknesses:", Section::Weaknesses),
  ("questions:", Section::Questions),
  ("rating:", Section::Rating),
  ("confidence:", Section::Confidence),
];

fn match_header(line: &str) -> Option<(Section, &str)> {
  HEADERS.iter().find_map(|(header, section)| {
    strip_header(line, header).map(|rest| (*section, rest.trim()))
  })
}

fn parse_confidence(value: &str) -> Option<ReviewConfidence> { value.trim().parse().ok() }

/// Parse generated review text.
///
/// Never fails: sections that are missing keep their defaults (empty summary
/// and lists, rating 0, confidence low).
pub fn parse_review(text: &str) -> ReviewBody {
  let mut review = ReviewBody::default();
  let mut current: Option<Section> = None;

  for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
    if let Some((section, inline)) = match_header(line) {
      current = Some(section);
      match section {
        Section::Summary => review.summary = inline.to_owned(),
        Section::Rating => {
          if let Some(rating) = leading_int(inline).and_then(|r| i32::try_from(r).ok()) {
            review.rating = rating;
          }
        }
        Section::Confidence => {
          if let Some(confidence) = parse_confidence(inline) {
            review.confidence = confidence;
          }
        }
        Section::Strengths | Section::Weaknesses | Section::Questions => {}
      }
      continue;
    }

    let list = match current {
      Some(Section::Summary) => {
        if !review.summary.is_empty() {
          review.summary.push(' ');
        }
        review.summary.push_str(line);
        continue;
      }
      Some(Section::Strengths) => &mut review.strengths,
      Some(Section::Weaknesses) => &mut review.weaknesses,
      Some(Section::Questions) => &mut review.questions,
      // Values are only read inline; stray lines before any header are
      // dropped too.
      Some(Section::Rating | Section::Confidence) | None => continue,
    };

    let item = strip_marker(line).trim();
    if !item.is_empty() {
      list.push(item.to_owned());
    }
  }

  review
}
