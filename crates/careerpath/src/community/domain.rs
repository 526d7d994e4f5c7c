use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::insights::rollups::{MonthlyTrend, ScoreBucket};
use crate::progress::domain::ResultId;

/// A rating a user leaves on one of their own results. One row per
/// `(result, user)` pair; repeated submissions overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFeedback {
    pub result_id: ResultId,
    pub user_id: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl FeedbackRequest {
    pub fn rating(&self) -> Result<u8, ApiError> {
        match self.rating {
            Some(rating @ 1..=5) => Ok(rating as u8),
            _ => Err(ApiError::invalid_field(
                "rating",
                "must be between 1 and 5",
            )),
        }
    }
}

/// Sanitized public view of a shared result: scores and timing only, the
/// owner reduced to a display name.
#[derive(Debug, Clone, Serialize)]
pub struct SharedResultView {
    pub id: ResultId,
    pub test_title: String,
    pub test_category: String,
    pub total_score: i64,
    pub category_scores: BTreeMap<String, i64>,
    pub time_taken_secs: u64,
    pub completed_at: DateTime<Utc>,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub user_name: String,
    pub score: i64,
    pub time_taken_secs: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub test_id: String,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAnalytics {
    pub category: String,
    pub total_attempts: usize,
    pub average_score: i64,
    pub average_time: i64,
    pub score_distribution: Vec<ScoreBucket>,
    pub trends: Vec<MonthlyTrend>,
}

/// How the caller's score in one skill category sits against the population.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryComparison {
    pub user_score: i64,
    pub average_score: f64,
    pub better_than_average: bool,
    pub percentile: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub user_score: i64,
    pub user_time: u64,
    pub percentile: u8,
    pub total_participants: usize,
    pub average_score: i64,
    pub average_time: i64,
    pub category_comparison: BTreeMap<String, CategoryComparison>,
}
