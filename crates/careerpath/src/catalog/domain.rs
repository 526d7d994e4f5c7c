use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldError};

/// Identifier wrapper for quiz definitions. Human-assigned and stable, never a
/// generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TestId(pub String);

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Endpoint captions for a scale question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleLabels {
    pub min: String,
    pub max: String,
}

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub score: i64,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Question payload varying by question type. Scale questions carry their
/// category tags at question level; multiple-choice tags live on the answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        answers: Vec<AnswerOption>,
    },
    Scale {
        scale_labels: ScaleLabels,
        #[serde(default)]
        categories: Vec<String>,
    },
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// A quiz definition. Soft-deleted by flipping `is_active`, never hard-deleted;
/// `completed_count` only grows, as a side effect of successful submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: TestId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub duration_minutes: u32,
    pub category: String,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
    pub completed_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Test {
    pub fn find_question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Every category tag reachable through this test's questions and answers.
    pub fn declared_categories(&self) -> BTreeSet<String> {
        let mut categories = BTreeSet::new();
        for question in &self.questions {
            match &question.kind {
                QuestionKind::MultipleChoice { answers } => {
                    for answer in answers {
                        categories.extend(answer.categories.iter().cloned());
                    }
                }
                QuestionKind::Scale {
                    categories: tags, ..
                } => categories.extend(tags.iter().cloned()),
                QuestionKind::Text => {}
            }
        }
        categories
    }
}

fn default_icon() -> String {
    "🎯".to_string()
}

fn default_duration() -> u32 {
    15
}

/// Admin create/replace payload. Updates replace the whole document; the
/// stored `completed_count` and `created_at` survive a replace.
#[derive(Debug, Clone, Deserialize)]
pub struct TestDraft {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl TestDraft {
    /// Validate the payload shape, collecting every offending field at once.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut details = Vec::new();

        if self.id.trim().is_empty() {
            details.push(FieldError::new("id", "a stable test identifier is required"));
        }
        let title_len = self.title.chars().count();
        if !(3..=100).contains(&title_len) {
            details.push(FieldError::new("title", "must be 3 to 100 characters"));
        }
        let description_len = self.description.chars().count();
        if !(10..=500).contains(&description_len) {
            details.push(FieldError::new(
                "description",
                "must be 10 to 500 characters",
            ));
        }
        if !(5..=120).contains(&self.duration_minutes) {
            details.push(FieldError::new(
                "duration_minutes",
                "must be between 5 and 120 minutes",
            ));
        }
        let category_len = self.category.chars().count();
        if !(3..=50).contains(&category_len) {
            details.push(FieldError::new("category", "must be 3 to 50 characters"));
        }
        if self.questions.is_empty() {
            details.push(FieldError::new("questions", "at least one question is required"));
        }

        let mut seen_questions = BTreeSet::new();
        for question in &self.questions {
            if !seen_questions.insert(question.id.as_str()) {
                details.push(FieldError::new(
                    "questions",
                    format!("duplicate question id '{}'", question.id),
                ));
            }
            if let QuestionKind::MultipleChoice { answers } = &question.kind {
                let mut seen_answers = BTreeSet::new();
                for answer in answers {
                    if !seen_answers.insert(answer.id.as_str()) {
                        details.push(FieldError::new(
                            "questions",
                            format!(
                                "duplicate answer id '{}' in question '{}'",
                                answer.id, question.id
                            ),
                        ));
                    }
                }
            }
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(details))
        }
    }

    pub fn into_test(self, now: DateTime<Utc>) -> Test {
        Test {
            id: TestId(self.id),
            title: self.title,
            description: self.description,
            icon: self.icon,
            duration_minutes: self.duration_minutes,
            category: self.category,
            difficulty: self.difficulty,
            questions: self.questions,
            completed_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> TestDraft {
        TestDraft {
            id: "sample_test".to_string(),
            title: "Sample test".to_string(),
            description: "A description long enough to pass validation.".to_string(),
            icon: default_icon(),
            duration_minutes: 15,
            difficulty: Difficulty::Easy,
            category: "orientation".to_string(),
            questions: vec![Question {
                id: "q1".to_string(),
                prompt: "Pick one".to_string(),
                kind: QuestionKind::MultipleChoice {
                    answers: vec![AnswerOption {
                        id: "a1".to_string(),
                        text: "Option".to_string(),
                        score: 5,
                        categories: vec!["social".to_string()],
                    }],
                },
            }],
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn validation_reports_every_offending_field() {
        let mut bad = draft();
        bad.title = "ab".to_string();
        bad.category = "it".to_string();
        bad.questions.clear();

        match bad.validate().unwrap_err() {
            ApiError::Validation(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "category", "questions"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let mut bad = draft();
        let duplicate = bad.questions[0].clone();
        bad.questions.push(duplicate);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn question_wire_format_is_internally_tagged() {
        let question = Question {
            id: "q2".to_string(),
            prompt: "Rate teamwork".to_string(),
            kind: QuestionKind::Scale {
                scale_labels: ScaleLabels {
                    min: "Prefer solo work".to_string(),
                    max: "Love team work".to_string(),
                },
                categories: vec!["social".to_string()],
            },
        };
        let value = serde_json::to_value(&question).expect("serializes");
        assert_eq!(value["type"], "scale");
        assert_eq!(value["scale_labels"]["min"], "Prefer solo work");

        let roundtrip: Question = serde_json::from_value(value).expect("deserializes");
        assert_eq!(roundtrip, question);
    }
}
