//! Built-in sample catalog used to seed fresh deployments and drive the demo.

use chrono::{DateTime, TimeZone, Utc};

use super::domain::{
    AnswerOption, Difficulty, Question, QuestionKind, ScaleLabels, Test, TestId,
};

fn seeded_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("valid seed timestamp")
}

fn option(id: &str, text: &str, score: i64, categories: &[&str]) -> AnswerOption {
    AnswerOption {
        id: id.to_string(),
        text: text.to_string(),
        score,
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

fn choice(id: &str, prompt: &str, answers: Vec<AnswerOption>) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        kind: QuestionKind::MultipleChoice { answers },
    }
}

fn scale(id: &str, prompt: &str, min: &str, max: &str, categories: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        kind: QuestionKind::Scale {
            scale_labels: ScaleLabels {
                min: min.to_string(),
                max: max.to_string(),
            },
            categories: categories.iter().map(|c| c.to_string()).collect(),
        },
    }
}

pub fn career_orientation_basic() -> Test {
    let now = seeded_at();
    Test {
        id: TestId("career_orientation_basic".to_string()),
        title: "Career orientation basics".to_string(),
        description: "Identify your core inclinations and interests across fields of work."
            .to_string(),
        icon: "🎯".to_string(),
        duration_minutes: 15,
        category: "orientation".to_string(),
        difficulty: Difficulty::Easy,
        questions: vec![
            choice(
                "q1",
                "What attracts you most in a job?",
                vec![
                    option("a1", "Working with people and teams", 5, &["social", "leadership"]),
                    option("a2", "Solving technical problems", 5, &["technical", "analytical"]),
                    option("a3", "Creative projects", 5, &["creative"]),
                    option("a4", "Data analysis and research", 5, &["analytical"]),
                ],
            ),
            scale(
                "q2",
                "How much do you enjoy working in a team (1 to 5)?",
                "I prefer working alone",
                "I love team work",
                &["social", "leadership"],
            ),
            choice(
                "q3",
                "Which kind of task do you enjoy solving most?",
                vec![
                    option("a1", "Logic puzzles", 4, &["analytical"]),
                    option("a2", "Planning events", 4, &["leadership", "social"]),
                    option("a3", "Designing visuals", 4, &["creative"]),
                    option("a4", "Programming", 4, &["technical"]),
                ],
            ),
            scale(
                "q4",
                "How comfortable are you making decisions under uncertainty (1 to 5)?",
                "Very uncomfortable",
                "Completely comfortable",
                &["leadership"],
            ),
        ],
        completed_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn analytical_thinking() -> Test {
    let now = seeded_at();
    Test {
        id: TestId("analytical_thinking".to_string()),
        title: "Analytical thinking".to_string(),
        description: "Gauge how you approach structured problems, data, and abstractions."
            .to_string(),
        icon: "🧠".to_string(),
        duration_minutes: 20,
        category: "skills".to_string(),
        difficulty: Difficulty::Medium,
        questions: vec![
            choice(
                "q1",
                "A process keeps failing intermittently. What do you do first?",
                vec![
                    option("a1", "Collect logs and look for a pattern", 5, &["analytical"]),
                    option("a2", "Ask a colleague who knows the system", 3, &["social"]),
                    option("a3", "Rebuild the component from scratch", 2, &["technical"]),
                ],
            ),
            scale(
                "q2",
                "How much do you enjoy working with spreadsheets and datasets (1 to 5)?",
                "Not at all",
                "It is my favorite part",
                &["analytical", "technical"],
            ),
            scale(
                "q3",
                "How often do you sketch a model before starting work (1 to 5)?",
                "Never",
                "Always",
                &["analytical"],
            ),
        ],
        completed_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// The full built-in catalog.
pub fn sample_tests() -> Vec<Test> {
    vec![career_orientation_basic(), analytical_thinking()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scoring;

    #[test]
    fn sample_ids_are_unique_and_active() {
        let tests = sample_tests();
        let mut ids: Vec<_> = tests.iter().map(|t| t.id.0.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), tests.len());
        assert!(tests.iter().all(|t| t.is_active));
    }

    #[test]
    fn sample_tests_have_positive_max_scores() {
        for test in sample_tests() {
            assert!(scoring::max_possible_score(&test) > 0, "{}", test.id);
        }
    }
}
