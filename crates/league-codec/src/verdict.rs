//! Judge output parser.

use league_core::{
  evaluation::{Criterion, Verdict},
  matches::Side,
};

use crate::{leading_int, strip_header, strip_marker};

fn match_criterion(line: &str) -> Option<Criterion> {
  Criterion::ALL.into_iter().find(|c| {
    strip_header(line, c.header())
      .is_some_and(|rest| rest.trim_start().starts_with(':'))
  })
}

/// The two competitor labels, tested longest first so that a label which is a
/// prefix (or substring) of the other cannot shadow it.
struct Labels<'a> {
  ordered: [(Side, &'a str); 2],
}

impl<'a> Labels<'a> {
  fn new(first: &'a str, second: &'a str) -> Self {
    let ordered = if second.len() > first.len() {
      [(Side::Second, second), (Side::First, first)]
    } else {
      [(Side::First, first), (Side::Second, second)]
    };
    Self { ordered }
  }

  /// `"<label>: <score>"` → the side and the text after the colon. List
  /// markers and bold markup around the label are ignored; the label itself
  /// may contain colons.
  fn score_line<'l>(&self, line: &'l str) -> Option<(Side, &'l str)> {
    let line = strip_marker(line).trim_start_matches('*');
    self.ordered.iter().find_map(|(side, name)| {
      let name = name.trim();
      if name.is_empty() {
        return None;
      }
      let rest = strip_header(line, name)?;
      rest
        .trim_start()
        .trim_start_matches('*')
        .strip_prefix(':')
        .map(|value| (*side, value.trim_start_matches(['*', ' '])))
    })
  }

  /// Case-insensitive substring match against the `Winner:` value. Anything
  /// naming neither side is a draw.
  fn winner(&self, value: &str) -> Option<Side> {
    let value = value.to_lowercase();
    self
      .ordered
      .iter()
      .find(|(_, name)| {
        let name = name.trim().to_lowercase();
        !name.is_empty() && value.contains(&name)
      })
      .map(|(side, _)| *side)
  }
}

/// Parse judge text comparing the reviews by `first` and `second`.
///
/// Never fails: unparseable scores stay 0 and a missing or unrecognised
/// winner is a draw. Everything from the `Reasoning:` line on is reasoning,
/// one line per non-blank source line.
pub fn parse_verdict(text: &str, first: &str, second: &str) -> Verdict {
  let labels = Labels::new(first, second);
  let mut verdict = Verdict::default();
  let mut current: Option<Criterion> = None;
  let mut reasoning: Option<Vec<&str>> = None;

  for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
    if let Some(lines) = reasoning.as_mut() {
      lines.push(line);
      continue;
    }

    if let Some(rest) = strip_header(line, "reasoning:") {
      let inline = rest.trim();
      reasoning = Some(if inline.is_empty() { Vec::new() } else { vec![inline] });
    } else if let Some(rest) = strip_header(line, "winner:") {
      verdict.winner = labels.winner(rest);
    } else if let Some(criterion) = match_criterion(line) {
      current = Some(criterion);
    } else if let Some(criterion) = current {
      let Some((side, value)) = labels.score_line(line) else {
        continue;
      };
      if let Some(score) = leading_int(value) {
        let score = score.clamp(0, 10) as u8;
        verdict.scores.get_mut(criterion).set(side, score);
      }
    }
  }

  verdict.reasoning = reasoning.map(|l| l.join("\n")).unwrap_or_default();
  verdict
}

#[cfg(test)]
mod tests {
  use league_core::evaluation::ScorePair;

  use super::*;

  const JUDGE: &str = "\
Technical Correctness:
GPT Reviewer: 8
Claude Reviewer: 7

Depth of Analysis:
GPT Reviewer: 6
Claude Reviewer: 9

Constructive Feedback:
GPT Reviewer: 7/10
Claude Reviewer: 8

Clarity:
GPT Reviewer: 9
Claude Reviewer: 8

Fairness:
GPT Reviewer: 8
Claude Reviewer: 8

Winner: Claude Reviewer

Reasoning:
Claude's review digs deeper into the method.
Winner: GPT Reviewer is mentioned here but is only prose.
";

  #[test]
  fn parses_scores_winner_and_reasoning() {
    let v = parse_verdict(JUDGE, "GPT Reviewer", "Claude Reviewer");
    assert_eq!(v.scores.technical_correctness, ScorePair { first: 8, second: 7 });
    assert_eq!(v.scores.depth_of_analysis, ScorePair { first: 6, second: 9 });
    assert_eq!(v.scores.constructive_feedback, ScorePair { first: 7, second: 8 });
    assert_eq!(v.scores.clarity, ScorePair { first: 9, second: 8 });
    assert_eq!(v.scores.fairness, ScorePair { first: 8, second: 8 });
    assert_eq!(v.winner, Some(Side::Second));
    assert_eq!(
      v.reasoning,
      "Claude's review digs deeper into the method.\nWinner: GPT Reviewer is mentioned here but is only prose."
    );
  }

  #[test]
  fn draw_and_missing_sections() {
    let v = parse_verdict("Winner: draw", "Alpha", "Beta");
    assert_eq!(v, Verdict::default());
  }

  #[test]
  fn longer_name_is_tested_first() {
    let v = parse_verdict("Winner: Reviewer Pro", "Reviewer", "Reviewer Pro");
    assert_eq!(v.winner, Some(Side::Second));

    let v = parse_verdict("Winner: Reviewer", "Reviewer", "Reviewer Pro");
    assert_eq!(v.winner, Some(Side::First));
  }

  #[test]
  fn score_lines_need_exact_label() {
    let text = "Clarity:\nReviewer Pro: 9\nReviewer: 3";
    let v = parse_verdict(text, "Reviewer", "Reviewer Pro");
    assert_eq!(v.scores.clarity, ScorePair { first: 3, second: 9 });
  }

  #[test]
  fn bulleted_score_lines_are_read() {
    let v = parse_verdict("Clarity:\n- Alpha: 8\n- Beta: 6", "Alpha", "Beta");
    assert_eq!(v.scores.clarity, ScorePair { first: 8, second: 6 });

    let v = parse_verdict("Fairness:\n1. **Alpha**: 5\n2. **Beta:** 7", "Alpha", "Beta");
    assert_eq!(v.scores.fairness, ScorePair { first: 5, second: 7 });
  }

  #[test]
  fn labels_may_contain_colons() {
    let v = parse_verdict("Clarity:\nGPT: v2: 8\nClaude: 6", "GPT: v2", "Claude");
    assert_eq!(v.scores.clarity, ScorePair { first: 8, second: 6 });
  }

  #[test]
  fn out_of_range_scores_are_clamped() {
    let v = parse_verdict("Fairness:\nA: 15\nB: n/a", "A", "B");
    assert_eq!(v.scores.fairness, ScorePair { first: 10, second: 0 });
  }

  #[test]
  fn inline_reasoning_is_kept() {
    let v = parse_verdict("Winner: A\nReasoning: more thorough.", "A", "B");
    assert_eq!(v.winner, Some(Side::First));
    assert_eq!(v.reasoning, "more thorough.");
  }

  #[test]
  fn scores_outside_a_criterion_are_ignored() {
    let v = parse_verdict("A: 9\nB: 9", "A", "B");
    assert_eq!(v.scores.total(Side::First), 0);
  }
}
