use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{
    CategoryAnalytics, CategoryComparison, ComparisonReport, FeedbackRequest, LeaderboardRow,
    LeaderboardView, ResultFeedback, SharedResultView,
};
use super::repository::FeedbackRepository;
use crate::auth::{self, AuthenticatedUser, Authenticator, TokenVerifier};
use crate::catalog::domain::TestId;
use crate::error::ApiError;
use crate::insights::rollups;
use crate::progress::domain::{ResultId, TestResult};
use crate::progress::repository::{ProfileRepository, ResultRepository};

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

/// Service behind the public/comparison surface: shared results, leaderboards,
/// category analytics, result comparison, and feedback.
pub struct CommunityService<P, R, F, V> {
    profiles: Arc<P>,
    results: Arc<R>,
    feedback: Arc<F>,
    auth: Arc<Authenticator<V>>,
}

impl<P, R, F, V> CommunityService<P, R, F, V>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    F: FeedbackRepository + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        results: Arc<R>,
        feedback: Arc<F>,
        auth: Arc<Authenticator<V>>,
    ) -> Self {
        Self {
            profiles,
            results,
            feedback,
            auth,
        }
    }

    pub fn auth(&self) -> &Authenticator<V> {
        &self.auth
    }

    fn display_name(&self, user_id: &str) -> String {
        self.profiles
            .fetch(user_id)
            .ok()
            .flatten()
            .map(|profile| profile.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string())
    }

    /// Public view of a result; anything not explicitly shared reads as absent
    /// regardless of who asks.
    pub fn shared_result(&self, id: &ResultId) -> Result<SharedResultView, ApiError> {
        let result = match self.results.fetch(id)? {
            Some(result) if auth::is_public(result.is_shared) => result,
            _ => return Err(ApiError::not_found("Shared result")),
        };

        Ok(SharedResultView {
            user_name: self.display_name(&result.user_id),
            id: result.id,
            test_title: result.test_title,
            test_category: result.test_category,
            total_score: result.total_score,
            category_scores: result.category_scores,
            time_taken_secs: result.time_taken_secs,
            completed_at: result.created_at,
        })
    }

    pub fn leaderboard(
        &self,
        test_id: &TestId,
        limit: usize,
    ) -> Result<LeaderboardView, ApiError> {
        let results = self.results.list_for_test(test_id)?;
        let leaderboard = rollups::leaderboard(&results, limit)
            .into_iter()
            .map(|entry| LeaderboardRow {
                user_name: self.display_name(&entry.user_id),
                rank: entry.rank,
                score: entry.score,
                time_taken_secs: entry.time_taken_secs,
                completed_at: entry.completed_at,
            })
            .collect();

        Ok(LeaderboardView {
            test_id: test_id.0.clone(),
            leaderboard,
        })
    }

    pub fn category_analytics(&self, category: &str) -> Result<CategoryAnalytics, ApiError> {
        let results = self.results.list_for_category(category)?;
        if results.is_empty() {
            return Ok(CategoryAnalytics {
                category: category.to_string(),
                total_attempts: 0,
                average_score: 0,
                average_time: 0,
                score_distribution: Vec::new(),
                trends: Vec::new(),
            });
        }

        let attempts = results.len();
        let score_sum: i64 = results.iter().map(|r| r.total_score).sum();
        let time_sum: i64 = results.iter().map(|r| r.time_taken_secs as i64).sum();

        Ok(CategoryAnalytics {
            category: category.to_string(),
            total_attempts: attempts,
            average_score: (score_sum as f64 / attempts as f64).round() as i64,
            average_time: (time_sum as f64 / attempts as f64).round() as i64,
            score_distribution: rollups::score_distribution(&results),
            trends: rollups::monthly_trends(&results),
        })
    }

    /// Compare the caller's latest attempt at a test against everyone else's.
    pub fn compare(
        &self,
        user: &AuthenticatedUser,
        test_id: &TestId,
    ) -> Result<ComparisonReport, ApiError> {
        let all_results = self.results.list_for_test(test_id)?;
        let latest = all_results
            .iter()
            .filter(|result| result.user_id == user.id)
            .max_by_key(|result| result.created_at)
            .cloned()
            .ok_or_else(|| {
                ApiError::not_found_with_hint("Results", "You have not completed this test yet")
            })?;

        let population: Vec<i64> = all_results.iter().map(|r| r.total_score).collect();
        let standing = rollups::percentile(latest.total_score, &population);

        let participants = all_results.len();
        let score_sum: i64 = population.iter().sum();
        let time_sum: i64 = all_results.iter().map(|r| r.time_taken_secs as i64).sum();

        let category_comparison =
            Self::category_comparison(&latest, &all_results);

        Ok(ComparisonReport {
            user_score: latest.total_score,
            user_time: latest.time_taken_secs,
            percentile: standing.percentile,
            total_participants: participants,
            average_score: (score_sum as f64 / participants as f64).round() as i64,
            average_time: (time_sum as f64 / participants as f64).round() as i64,
            category_comparison,
        })
    }

    fn category_comparison(
        latest: &TestResult,
        all_results: &[TestResult],
    ) -> BTreeMap<String, CategoryComparison> {
        let mut comparison = BTreeMap::new();
        for (category, user_score) in &latest.category_scores {
            let scores: Vec<i64> = all_results
                .iter()
                .filter_map(|result| result.category_scores.get(category).copied())
                .collect();
            if scores.is_empty() {
                continue;
            }

            let average = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
            let at_or_below = scores.iter().filter(|&&s| s <= *user_score).count();
            comparison.insert(
                category.clone(),
                CategoryComparison {
                    user_score: *user_score,
                    average_score: (average * 100.0).round() / 100.0,
                    better_than_average: *user_score as f64 > average,
                    percentile: (at_or_below as f64 / scores.len() as f64 * 100.0).round() as u8,
                },
            );
        }
        comparison
    }

    /// Record feedback on one of the caller's own results. A foreign result
    /// reads as absent.
    pub fn submit_feedback(
        &self,
        user: &AuthenticatedUser,
        id: &ResultId,
        request: FeedbackRequest,
        now: DateTime<Utc>,
    ) -> Result<ResultFeedback, ApiError> {
        let rating = request.rating()?;

        match self.results.fetch(id)? {
            Some(result) if result.user_id == user.id => {}
            _ => return Err(ApiError::not_found("Result")),
        }

        let feedback = ResultFeedback {
            result_id: id.clone(),
            user_id: user.id.clone(),
            rating,
            comment: request.comment.unwrap_or_default(),
            created_at: now,
        };
        Ok(self.feedback.upsert(feedback)?)
    }
}
