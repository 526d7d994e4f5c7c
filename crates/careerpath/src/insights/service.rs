use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use super::export::{self, CsvDocument, ExportKind, ResultExportRow, UserExportRow};
use super::rollups::{self, DailyCount, DailyPerformance};
use crate::auth::{Authenticator, TokenVerifier};
use crate::catalog::domain::TestId;
use crate::catalog::repository::TestRepository;
use crate::error::{ApiError, RepositoryError};
use crate::progress::domain::UserProfile;
use crate::progress::repository::{ProfileRepository, ResultRepository};

pub const DEFAULT_PERFORMANCE_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopTest {
    pub id: TestId,
    pub title: String,
    pub completed_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSubmission {
    pub created_at: DateTime<Utc>,
    pub test_title: String,
}

/// Platform-wide dashboard numbers.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformOverview {
    pub total_users: usize,
    pub total_tests: usize,
    pub total_results: usize,
    pub top_tests: Vec<TopTest>,
    pub average_results_per_user: i64,
    pub recent_activity: Vec<RecentSubmission>,
    pub daily_activity: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestAnalyticsEntry {
    pub id: TestId,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub total_attempts: usize,
    pub average_score: i64,
    pub average_time: i64,
    pub completion_rate: u32,
    pub last_attempt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestAnalyticsSummary {
    pub total_tests: usize,
    pub most_popular: Option<TestAnalyticsEntry>,
    pub highest_scoring: Option<TestAnalyticsEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestAnalyticsReport {
    pub tests: Vec<TestAnalyticsEntry>,
    pub summary: TestAnalyticsSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAnalyticsEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
    pub total_tests: usize,
    pub average_score: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub favorite_category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAnalyticsSummary {
    pub total_users: usize,
    pub active_users_30d: usize,
    pub new_users_this_month: usize,
    pub average_tests_per_user: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAnalyticsReport {
    pub users: Vec<UserAnalyticsEntry>,
    pub summary: UserAnalyticsSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub attempts: usize,
    pub average_score: i64,
    pub average_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_attempts: usize,
    pub overall_average_score: i64,
    pub overall_average_time: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub period_days: u32,
    pub daily_performance: Vec<DailyPerformance>,
    pub category_performance: Vec<CategoryPerformance>,
    pub summary: PerformanceSummary,
}

/// Export payload in the caller's requested format.
#[derive(Debug, Clone)]
pub enum ExportDocument {
    Csv(CsvDocument),
    Json(serde_json::Value),
}

/// Admin analytics over the full persisted data set. Read-only by
/// construction: repositories in, aggregates out.
pub struct InsightsService<P, T, R, V> {
    profiles: Arc<P>,
    tests: Arc<T>,
    results: Arc<R>,
    auth: Arc<Authenticator<V>>,
}

impl<P, T, R, V> InsightsService<P, T, R, V>
where
    P: ProfileRepository + 'static,
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        tests: Arc<T>,
        results: Arc<R>,
        auth: Arc<Authenticator<V>>,
    ) -> Self {
        Self {
            profiles,
            tests,
            results,
            auth,
        }
    }

    pub fn auth(&self) -> &Authenticator<V> {
        &self.auth
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<PlatformOverview, ApiError> {
        let profiles = self.profiles.list()?;
        let tests = self.tests.list_active()?;
        let results = self.results.list_all()?;

        let mut by_popularity = tests.clone();
        by_popularity.sort_by(|a, b| b.completed_count.cmp(&a.completed_count));
        let top_tests = by_popularity
            .into_iter()
            .take(5)
            .map(|test| TopTest {
                id: test.id,
                title: test.title,
                completed_count: test.completed_count,
            })
            .collect();

        let average_results_per_user = if profiles.is_empty() {
            0
        } else {
            (results.len() as f64 / profiles.len() as f64).round() as i64
        };

        let mut newest_first = results.clone();
        newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_activity = newest_first
            .iter()
            .take(10)
            .map(|result| RecentSubmission {
                created_at: result.created_at,
                test_title: result.test_title.clone(),
            })
            .collect();

        let window_start = now - Duration::days(30);
        let recent: Vec<_> = results
            .iter()
            .filter(|result| result.created_at >= window_start)
            .cloned()
            .collect();

        Ok(PlatformOverview {
            total_users: profiles.len(),
            total_tests: tests.len(),
            total_results: results.len(),
            top_tests,
            average_results_per_user,
            recent_activity,
            daily_activity: rollups::daily_counts(&recent),
        })
    }

    pub fn test_analytics(&self) -> Result<TestAnalyticsReport, ApiError> {
        let tests = self.tests.list_active()?;
        let results = self.results.list_all()?;

        let entries: Vec<TestAnalyticsEntry> = tests
            .iter()
            .map(|test| {
                let attempts: Vec<_> = results
                    .iter()
                    .filter(|result| result.test_id == test.id)
                    .collect();
                let total_attempts = attempts.len();

                let (average_score, average_time, last_attempt) = if total_attempts == 0 {
                    (0, 0, None)
                } else {
                    let score_sum: i64 = attempts.iter().map(|r| r.total_score).sum();
                    let time_sum: i64 = attempts.iter().map(|r| r.time_taken_secs as i64).sum();
                    (
                        (score_sum as f64 / total_attempts as f64).round() as i64,
                        (time_sum as f64 / total_attempts as f64).round() as i64,
                        attempts.iter().map(|r| r.created_at).max(),
                    )
                };

                TestAnalyticsEntry {
                    id: test.id.clone(),
                    title: test.title.clone(),
                    category: test.category.clone(),
                    difficulty: test.difficulty.label().to_string(),
                    total_attempts,
                    average_score,
                    average_time,
                    completion_rate: rollups::completion_rate(total_attempts, test.completed_count),
                    last_attempt,
                }
            })
            .collect();

        let most_popular = entries
            .iter()
            .max_by_key(|entry| entry.total_attempts)
            .cloned();
        let highest_scoring = entries
            .iter()
            .max_by_key(|entry| entry.average_score)
            .cloned();

        Ok(TestAnalyticsReport {
            summary: TestAnalyticsSummary {
                total_tests: entries.len(),
                most_popular,
                highest_scoring,
            },
            tests: entries,
        })
    }

    pub fn user_analytics(&self, now: DateTime<Utc>) -> Result<UserAnalyticsReport, ApiError> {
        let profiles = self.profiles.list()?;
        let results = self.results.list_all()?;

        let entries: Vec<UserAnalyticsEntry> = profiles
            .iter()
            .map(|profile| {
                let history: Vec<_> = results
                    .iter()
                    .filter(|result| result.user_id == profile.id)
                    .cloned()
                    .collect();
                let total_tests = history.len();
                let average_score = if total_tests == 0 {
                    0
                } else {
                    let sum: i64 = history.iter().map(|r| r.total_score).sum();
                    (sum as f64 / total_tests as f64).round() as i64
                };

                UserAnalyticsEntry {
                    id: profile.id.clone(),
                    name: display_name(profile),
                    email: profile.email.clone(),
                    joined_at: profile.created_at,
                    total_tests,
                    average_score,
                    last_activity: history.iter().map(|r| r.created_at).max(),
                    favorite_category: rollups::favorite_category(&history),
                }
            })
            .collect();

        let window_start = now - Duration::days(30);
        let active_users_30d = entries
            .iter()
            .filter(|entry| entry.last_activity.is_some_and(|at| at >= window_start))
            .count();
        let new_users_this_month = entries
            .iter()
            .filter(|entry| {
                entry.joined_at.year() == now.year() && entry.joined_at.month() == now.month()
            })
            .count();
        let average_tests_per_user = if entries.is_empty() {
            0
        } else {
            let sum: usize = entries.iter().map(|entry| entry.total_tests).sum();
            (sum as f64 / entries.len() as f64).round() as i64
        };

        Ok(UserAnalyticsReport {
            summary: UserAnalyticsSummary {
                total_users: entries.len(),
                active_users_30d,
                new_users_this_month,
                average_tests_per_user,
            },
            users: entries,
        })
    }

    pub fn performance(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<PerformanceReport, ApiError> {
        let window_start = now - Duration::days(i64::from(days));
        let results: Vec<_> = self
            .results
            .list_all()?
            .into_iter()
            .filter(|result| result.created_at >= window_start)
            .collect();

        let mut by_category: BTreeMap<String, (usize, i64, i64)> = BTreeMap::new();
        for result in &results {
            let entry = by_category
                .entry(result.test_category.clone())
                .or_insert((0, 0, 0));
            entry.0 += 1;
            entry.1 += result.total_score;
            entry.2 += result.time_taken_secs as i64;
        }
        let category_performance = by_category
            .into_iter()
            .map(|(category, (attempts, score_sum, time_sum))| CategoryPerformance {
                category,
                attempts,
                average_score: (score_sum as f64 / attempts as f64).round() as i64,
                average_time: (time_sum as f64 / attempts as f64).round() as i64,
            })
            .collect();

        let total_attempts = results.len();
        let summary = if total_attempts == 0 {
            PerformanceSummary {
                total_attempts: 0,
                overall_average_score: 0,
                overall_average_time: 0,
            }
        } else {
            let score_sum: i64 = results.iter().map(|r| r.total_score).sum();
            let time_sum: i64 = results.iter().map(|r| r.time_taken_secs as i64).sum();
            PerformanceSummary {
                total_attempts,
                overall_average_score: (score_sum as f64 / total_attempts as f64).round() as i64,
                overall_average_time: (time_sum as f64 / total_attempts as f64).round() as i64,
            }
        };

        Ok(PerformanceReport {
            period_days: days,
            daily_performance: rollups::daily_performance(&results),
            category_performance,
            summary,
        })
    }

    pub fn export(
        &self,
        kind: ExportKind,
        as_csv: bool,
        now: DateTime<Utc>,
    ) -> Result<ExportDocument, ApiError> {
        match kind {
            ExportKind::Results => {
                let profiles = self.profiles.list()?;
                let mut results = self.results.list_all()?;
                results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

                let rows: Vec<ResultExportRow> = results
                    .into_iter()
                    .map(|result| {
                        let profile = profiles.iter().find(|p| p.id == result.user_id);
                        ResultExportRow {
                            id: result.id.0,
                            user_name: profile
                                .map(display_name)
                                .unwrap_or_else(|| "Anonymous".to_string()),
                            user_email: profile
                                .map(|p| p.email.clone())
                                .unwrap_or_else(|| "N/A".to_string()),
                            test_title: result.test_title,
                            test_category: result.test_category,
                            total_score: result.total_score,
                            time_taken_secs: result.time_taken_secs,
                            completed_at: result.created_at,
                        }
                    })
                    .collect();

                if as_csv {
                    let document = export::results_csv(&rows, now.date_naive())
                        .map_err(|error| csv_failure(&error))?;
                    Ok(ExportDocument::Csv(document))
                } else {
                    Ok(ExportDocument::Json(serde_json::json!({
                        "data": rows,
                        "exported_at": now,
                    })))
                }
            }
            ExportKind::Users => {
                let profiles = self.profiles.list()?;
                let results = self.results.list_all()?;

                let rows: Vec<UserExportRow> = profiles
                    .iter()
                    .map(|profile| UserExportRow {
                        id: profile.id.clone(),
                        name: display_name(profile),
                        email: profile.email.clone(),
                        tests_completed: results
                            .iter()
                            .filter(|result| result.user_id == profile.id)
                            .count(),
                        joined_at: profile.created_at,
                    })
                    .collect();

                if as_csv {
                    let document = export::users_csv(&rows, now.date_naive())
                        .map_err(|error| csv_failure(&error))?;
                    Ok(ExportDocument::Csv(document))
                } else {
                    Ok(ExportDocument::Json(serde_json::json!({
                        "data": rows,
                        "exported_at": now,
                    })))
                }
            }
        }
    }
}

fn display_name(profile: &UserProfile) -> String {
    if profile.name.is_empty() {
        "Anonymous".to_string()
    } else {
        profile.name.clone()
    }
}

fn csv_failure(error: &csv::Error) -> ApiError {
    ApiError::Upstream(RepositoryError::Unavailable(format!(
        "csv rendering failed: {error}"
    )))
}
