//! Learning-plan generation from a user's full result history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::domain::{
    CategoryScore, LearningPlan, PlanStatus, Priority, Recommendation, RecommendationKind,
    TestResult,
};

/// Category averages at or above this mark are strengths.
pub const STRENGTH_THRESHOLD: f64 = 4.0;
/// Category averages below this mark are improvement areas. Averages in
/// between land in neither list.
pub const IMPROVEMENT_THRESHOLD: f64 = 3.0;

/// Raised when a plan is requested with no completed tests to draw from.
#[derive(Debug, thiserror::Error)]
#[error("complete at least one test to generate a learning plan")]
pub struct NoResultHistory;

/// Regenerate a user's plan wholesale from their result history.
///
/// One observation per result per category present in that result; the same
/// history always yields the same partition and recommendation set, with only
/// the timestamps varying by `now`.
pub fn generate_plan(
    user_id: &str,
    results: &[TestResult],
    now: DateTime<Utc>,
) -> Result<LearningPlan, NoResultHistory> {
    if results.is_empty() {
        return Err(NoResultHistory);
    }

    let averages = category_averages(results);

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();
    for (category, average) in &averages {
        let entry = CategoryScore {
            category: category.clone(),
            score: *average,
        };
        if *average >= STRENGTH_THRESHOLD {
            strengths.push(entry);
        } else if *average < IMPROVEMENT_THRESHOLD {
            improvements.push(entry);
        }
    }

    // Strengths best-first, improvements weakest-first; ties settle on the
    // category name so regeneration stays stable.
    strengths.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    improvements.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    let recommendations = strengths
        .iter()
        .map(|entry| recommendation_for(RecommendationKind::Strength, &entry.category))
        .chain(
            improvements
                .iter()
                .map(|entry| recommendation_for(RecommendationKind::Improvement, &entry.category)),
        )
        .collect();

    Ok(LearningPlan {
        user_id: user_id.to_string(),
        strengths,
        improvements,
        recommendations,
        status: PlanStatus::Active,
        generated_at: now,
        updated_at: now,
    })
}

/// Arithmetic mean per category across every result where the category appears.
fn category_averages(results: &[TestResult]) -> BTreeMap<String, f64> {
    let mut observations: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for result in results {
        for (category, score) in &result.category_scores {
            let entry = observations.entry(category.clone()).or_insert((0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }

    observations
        .into_iter()
        .map(|(category, (sum, count))| (category, sum as f64 / count as f64))
        .collect()
}

fn recommendation_for(kind: RecommendationKind, category: &str) -> Recommendation {
    match kind {
        RecommendationKind::Strength => Recommendation {
            kind,
            category: category.to_string(),
            title: format!("Build on your strength: {category}"),
            description: format!(
                "You show excellent results in {category}. Keep investing in this direction."
            ),
            priority: Priority::Medium,
            estimated_time: "2-3 months".to_string(),
            resources: vec![
                "Advanced courses".to_string(),
                "Specialized projects".to_string(),
                "Mentorship".to_string(),
            ],
        },
        RecommendationKind::Improvement => Recommendation {
            kind,
            category: category.to_string(),
            title: format!("Skill development: {category}"),
            description: format!(
                "Dedicate focused attention to developing your {category} skills."
            ),
            priority: Priority::High,
            estimated_time: "3-6 months".to_string(),
            resources: vec![
                "Foundation courses".to_string(),
                "Practice exercises".to_string(),
                "Study materials".to_string(),
            ],
        },
    }
}
