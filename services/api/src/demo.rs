use std::collections::BTreeMap;

use chrono::Utc;
use clap::Args;
use serde_json::json;

use careerpath::catalog::{samples, scoring, AnswerSubmission};
use careerpath::progress::domain::{ResultId, TestResult};
use careerpath::progress::plan::generate_plan;

use crate::ServiceError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pretty-print the demo output
    #[arg(long)]
    pub(crate) pretty: bool,
}

/// Walk the sample catalog through the scoring engine and plan generator and
/// print the outcome, no server or storage involved.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), ServiceError> {
    let test = samples::career_orientation_basic();
    let now = Utc::now();

    let first_answers: BTreeMap<String, AnswerSubmission> = BTreeMap::from([
        ("q1".to_string(), AnswerSubmission::choice("a1")),
        ("q2".to_string(), AnswerSubmission::scale(4)),
        ("q3".to_string(), AnswerSubmission::choice("a2")),
        ("q4".to_string(), AnswerSubmission::scale(5)),
    ]);
    let second_answers: BTreeMap<String, AnswerSubmission> = BTreeMap::from([
        ("q1".to_string(), AnswerSubmission::choice("a4")),
        ("q2".to_string(), AnswerSubmission::scale(2)),
        ("q3".to_string(), AnswerSubmission::choice("a1")),
        ("q4".to_string(), AnswerSubmission::scale(2)),
    ]);

    let results: Vec<TestResult> = [first_answers, second_answers]
        .into_iter()
        .enumerate()
        .map(|(index, answers)| {
            let summary = scoring::score(&test, &answers);
            TestResult {
                id: ResultId(format!("demo-{}", index + 1)),
                user_id: "demo-user".to_string(),
                test_id: test.id.clone(),
                test_title: test.title.clone(),
                test_category: test.category.clone(),
                total_score: summary.total_score,
                category_scores: summary.category_scores,
                answers,
                time_taken_secs: 300,
                is_shared: false,
                created_at: now,
            }
        })
        .collect();

    let plan = generate_plan("demo-user", &results, now)
        .expect("demo history is non-empty");

    let output = json!({
        "test": { "id": test.id, "title": test.title, "max_score": scoring::max_possible_score(&test) },
        "attempts": results
            .iter()
            .map(|result| json!({
                "id": result.id,
                "total_score": result.total_score,
                "category_scores": result.category_scores,
            }))
            .collect::<Vec<_>>(),
        "learning_plan": plan,
    });

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .expect("demo output serializes");
    println!("{rendered}");
    Ok(())
}
