//! Prompt rendering for reviewers and judges.
//!
//! The formats asked for here are the ones [`crate::parse_review`] and
//! [`crate::parse_verdict`] read back.

use league_core::{evaluation::Criterion, paper::Paper, review::ReviewBody};

pub const REVIEWER_SYSTEM: &str = "You are an expert academic reviewer. Your task is to provide \
                                   detailed, constructive reviews of research papers.";

pub const JUDGE_SYSTEM: &str = "You are an expert academic meta-reviewer. Your task is to \
                                evaluate the quality of peer reviews and determine which review \
                                is more helpful, thorough, and insightful.";

const REVIEW_RUBRIC: &str = "\
Your review should include:
1. Summary: A brief summary of the paper's contributions and approach
2. Strengths: At least 3 specific strengths of the paper
3. Weaknesses: At least 3 specific weaknesses or limitations
4. Questions: 2-3 questions for the authors
5. Rating: A numerical rating from 1-10
6. Confidence: Your confidence in this review (low, medium, high)

Format your response as follows:

Summary:
[Your summary here]

Strengths:
- [Strength 1]
- [Strength 2]
- [Strength 3]

Weaknesses:
- [Weakness 1]
- [Weakness 2]
- [Weakness 3]

Questions:
1. [Question 1]
2. [Question 2]
3. [Question 3]

Rating: [1-10]

Confidence: [low/medium/high]
";

const CRITERIA_GUIDE: [(Criterion, &str); 5] = [
  (
    Criterion::TechnicalCorrectness,
    "Does the review accurately assess the paper's methods and claims?",
  ),
  (
    Criterion::DepthOfAnalysis,
    "Does the review provide insightful technical analysis?",
  ),
  (
    Criterion::ConstructiveFeedback,
    "Does the review offer actionable suggestions?",
  ),
  (Criterion::Clarity, "Is the review well-structured and clearly written?"),
  (Criterion::Fairness, "Does the review maintain objectivity and balance?"),
];

fn write_paper(out: &mut String, paper: &Paper) {
  out.push_str(&format!("Paper Title: {}\n", paper.title));
  out.push_str(&format!("Authors: {}\n", paper.author_line()));
  out.push_str(&format!("\nAbstract:\n{}\n\n", paper.abstract_text));
}

fn write_list(out: &mut String, heading: &str, items: &[String]) {
  out.push_str(&format!("{heading}:\n"));
  for item in items {
    out.push_str(&format!("- {item}\n"));
  }
  out.push('\n');
}

fn write_review(out: &mut String, label: &str, review: &ReviewBody) {
  out.push_str(&format!("Review by {label}:\n\n"));
  out.push_str(&format!("Summary: {}\n\n", review.summary));
  write_list(out, "Strengths", &review.strengths);
  write_list(out, "Weaknesses", &review.weaknesses);
  write_list(out, "Questions", &review.questions);
  out.push_str(&format!("Rating: {}\n", review.rating));
  out.push_str(&format!("Confidence: {}\n\n", review.confidence));
}

/// The user prompt asking an agent to review `paper`.
pub fn review_prompt(paper: &Paper) -> String {
  let mut out = String::from(
    "Please review the following research paper and provide a structured academic review.\n\n",
  );
  write_paper(&mut out, paper);
  out.push_str(REVIEW_RUBRIC);
  out
}

/// One side of a judged comparison.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
  /// The label the judge must use for this review's scores.
  pub label:  &'a str,
  pub paper:  &'a Paper,
  pub review: &'a ReviewBody,
}

/// The user prompt asking a judge to compare two reviews.
///
/// When both entries cover the same paper it is shown once; otherwise each
/// paper precedes its review.
pub fn verdict_prompt(first: Entry<'_>, second: Entry<'_>) -> String {
  let mut out = String::new();

  if first.paper.paper_id == second.paper.paper_id {
    out.push_str(
      "Compare the following two reviews of the same academic paper and evaluate which review \
       is better.\n\n",
    );
    write_paper(&mut out, first.paper);
    write_review(&mut out, first.label, first.review);
    write_review(&mut out, second.label, second.review);
  } else {
    out.push_str(
      "Compare the following two reviews, each of a different academic paper, and evaluate \
       which review is better.\n\n",
    );
    for entry in [first, second] {
      write_paper(&mut out, entry.paper);
      write_review(&mut out, entry.label, entry.review);
    }
  }

  out.push_str("Evaluate these reviews based on the following criteria:\n");
  for (i, (criterion, question)) in CRITERIA_GUIDE.iter().enumerate() {
    out.push_str(&format!("{}. {} (1-10): {question}\n", i + 1, criterion.header()));
  }
  out.push_str(
    "\nFor each criterion, provide a score for both reviews. Then determine which review is \
     better overall or if they are equally good (a draw).\n\nFormat your response exactly as \
     follows:\n\n",
  );
  for criterion in Criterion::ALL {
    out.push_str(&format!(
      "{}:\n{}: [score]\n{}: [score]\n\n",
      criterion.header(),
      first.label,
      second.label
    ));
  }
  out.push_str(&format!("Winner: [{}/{}/draw]\n\n", first.label, second.label));
  out.push_str("Reasoning:\n[Your reasoning for the winner determination]\n");
  out
}
