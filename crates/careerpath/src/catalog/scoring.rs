//! Pure scoring over a test definition and a set of submitted answers.
//!
//! Integer arithmetic only; the same test and answers always produce the same
//! totals bit for bit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{QuestionKind, Test};

/// Ceiling used for scale questions when computing the maximum possible score.
pub const SCALE_CEILING: i64 = 5;

/// The submitted answer for one question, in the shape the front end sends:
/// an answer id for multiple choice, a numeric value for scale questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl AnswerSubmission {
    pub fn choice(answer_id: impl Into<String>) -> Self {
        Self {
            answer_id: Some(answer_id.into()),
            value: None,
        }
    }

    pub fn scale(value: i64) -> Self {
        Self {
            answer_id: None,
            value: Some(serde_json::Value::from(value)),
        }
    }

    /// Interpret the submitted value as an integer; anything non-numeric is 0.
    fn scale_value(&self) -> i64 {
        match &self.value {
            Some(serde_json::Value::Number(number)) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(serde_json::Value::String(raw)) => raw.trim().parse::<i64>().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Total plus per-category accumulation for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_score: i64,
    pub category_scores: BTreeMap<String, i64>,
}

/// Score a submission against a test definition.
///
/// Stale or unknown question ids are ignored rather than failing the whole
/// submission; a multiple-choice answer id that matches nothing contributes 0.
pub fn score(test: &Test, answers: &BTreeMap<String, AnswerSubmission>) -> ScoreSummary {
    let mut summary = ScoreSummary::default();

    for (question_id, submission) in answers {
        let Some(question) = test.find_question(question_id) else {
            continue;
        };

        match &question.kind {
            QuestionKind::MultipleChoice { answers: options } => {
                let chosen = submission
                    .answer_id
                    .as_deref()
                    .and_then(|id| options.iter().find(|option| option.id == id));
                if let Some(option) = chosen {
                    summary.total_score += option.score;
                    for category in &option.categories {
                        *summary.category_scores.entry(category.clone()).or_insert(0) +=
                            option.score;
                    }
                }
            }
            QuestionKind::Scale { categories, .. } => {
                let value = submission.scale_value();
                summary.total_score += value;
                for category in categories {
                    *summary.category_scores.entry(category.clone()).or_insert(0) += value;
                }
            }
            QuestionKind::Text => {}
        }
    }

    summary
}

/// Maximum achievable total for a test, computed from the definition alone:
/// the best answer of each multiple-choice question plus the scale ceiling for
/// each scale question. Text questions carry no numeric score.
pub fn max_possible_score(test: &Test) -> i64 {
    test.questions
        .iter()
        .map(|question| match &question.kind {
            QuestionKind::MultipleChoice { answers } => answers
                .iter()
                .map(|option| option.score)
                .max()
                .unwrap_or(0),
            QuestionKind::Scale { .. } => SCALE_CEILING,
            QuestionKind::Text => 0,
        })
        .sum()
}
