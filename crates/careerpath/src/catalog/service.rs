use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Difficulty, Question, Test, TestDraft, TestId};
use super::repository::TestRepository;
use super::scoring::{self, AnswerSubmission};
use crate::auth::{AuthenticatedUser, Authenticator, TokenVerifier};
use crate::error::{ApiError, FieldError, RepositoryError};
use crate::pagination::{paginate, PageInfo, PageParams};
use crate::progress::domain::{ResultId, TestResult};
use crate::progress::repository::ResultRepository;

static RESULT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_result_id() -> ResultId {
    let id = RESULT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResultId(format!("res-{id:06}"))
}

/// Filters accepted by the catalog listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestListQuery {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TestListQuery {
    pub fn page(&self) -> PageParams {
        let defaults = PageParams::default();
        PageParams {
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
        }
    }
}

/// Listing entry: the full definition minus its questions, plus a one-question
/// preview so cards can tease the content.
#[derive(Debug, Clone, Serialize)]
pub struct TestSummary {
    pub id: TestId,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub duration_minutes: u32,
    pub category: String,
    pub difficulty: Difficulty,
    pub questions_count: usize,
    pub questions_preview: Vec<Question>,
    pub completed_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<Test> for TestSummary {
    fn from(test: Test) -> Self {
        let questions_count = test.questions.len();
        let questions_preview = test.questions.into_iter().take(1).collect();
        Self {
            id: test.id,
            title: test.title,
            description: test.description,
            icon: test.icon,
            duration_minutes: test.duration_minutes,
            category: test.category,
            difficulty: test.difficulty,
            questions_count,
            questions_preview,
            completed_count: test.completed_count,
            created_at: test.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestListPage {
    pub tests: Vec<TestSummary>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyBreakdown {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularTest {
    pub id: TestId,
    pub title: String,
    pub completed_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_tests: usize,
    pub by_difficulty: DifficultyBreakdown,
    pub by_category: BTreeMap<String, usize>,
    pub total_completions: u64,
    pub most_popular: Vec<PopularTest>,
}

/// Detail view: the full definition, its maximum achievable score, and — for
/// an authenticated viewer — their completion history against it.
#[derive(Debug, Clone, Serialize)]
pub struct TestDetail {
    #[serde(flatten)]
    pub test: Test,
    pub max_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_attempts: Option<usize>,
}

/// Submission body posted at the end of an attempt. The client sends its own
/// totals for display continuity, but the stored record always carries the
/// server-recomputed scores.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSubmission {
    pub test_id: String,
    pub test_title: String,
    pub test_category: String,
    #[serde(default)]
    pub total_score: i64,
    #[serde(default)]
    pub category_scores: BTreeMap<String, i64>,
    pub answers: BTreeMap<String, AnswerSubmission>,
    pub time_taken: u64,
}

impl ResultSubmission {
    fn validate(&self) -> Result<(), ApiError> {
        let mut details = Vec::new();
        if self.test_id.trim().is_empty() {
            details.push(FieldError::new("test_id", "is required"));
        }
        if self.test_title.trim().is_empty() {
            details.push(FieldError::new("test_title", "is required"));
        }
        if self.test_category.trim().is_empty() {
            details.push(FieldError::new("test_category", "is required"));
        }
        if self.total_score < 0 {
            details.push(FieldError::new("total_score", "must not be negative"));
        }
        if details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(details))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestResultsPage {
    pub results: Vec<TestResult>,
    pub pagination: PageInfo,
}

/// Service composing the auth guard, the test/result repositories, and the
/// pure scoring engine.
pub struct CatalogService<T, R, V> {
    tests: Arc<T>,
    results: Arc<R>,
    auth: Arc<Authenticator<V>>,
}

impl<T, R, V> CatalogService<T, R, V>
where
    T: TestRepository + 'static,
    R: ResultRepository + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(tests: Arc<T>, results: Arc<R>, auth: Arc<Authenticator<V>>) -> Self {
        Self {
            tests,
            results,
            auth,
        }
    }

    pub fn auth(&self) -> &Authenticator<V> {
        &self.auth
    }

    pub fn list(&self, query: &TestListQuery) -> Result<TestListPage, ApiError> {
        let mut tests = self.tests.list_active()?;

        if let Some(category) = &query.category {
            tests.retain(|test| &test.category == category);
        }
        if let Some(difficulty) = query.difficulty {
            tests.retain(|test| test.difficulty == difficulty);
        }

        let (page, pagination) = paginate(tests, query.page());
        Ok(TestListPage {
            tests: page.into_iter().map(TestSummary::from).collect(),
            pagination,
        })
    }

    pub fn categories(&self) -> Result<Vec<CategoryCount>, ApiError> {
        let tests = self.tests.list_active()?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for test in &tests {
            *counts.entry(test.category.clone()).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, count)| CategoryCount { name, count })
            .collect())
    }

    pub fn stats(&self) -> Result<CatalogStats, ApiError> {
        let tests = self.tests.list_active()?;

        let mut by_difficulty = DifficultyBreakdown::default();
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        for test in &tests {
            match test.difficulty {
                Difficulty::Easy => by_difficulty.easy += 1,
                Difficulty::Medium => by_difficulty.medium += 1,
                Difficulty::Hard => by_difficulty.hard += 1,
            }
            *by_category.entry(test.category.clone()).or_insert(0) += 1;
        }

        let total_completions = tests.iter().map(|test| test.completed_count).sum();

        let mut by_popularity = tests.clone();
        by_popularity.sort_by(|a, b| b.completed_count.cmp(&a.completed_count));
        let most_popular = by_popularity
            .into_iter()
            .take(5)
            .map(|test| PopularTest {
                id: test.id,
                title: test.title,
                completed_count: test.completed_count,
            })
            .collect();

        Ok(CatalogStats {
            total_tests: tests.len(),
            by_difficulty,
            by_category,
            total_completions,
            most_popular,
        })
    }

    pub fn detail(
        &self,
        id: &TestId,
        viewer: Option<&AuthenticatedUser>,
    ) -> Result<TestDetail, ApiError> {
        let test = self
            .tests
            .find_active(id)?
            .ok_or_else(|| ApiError::not_found("Test"))?;
        let max_score = scoring::max_possible_score(&test);

        let (user_completed, user_attempts) = match viewer {
            Some(user) => {
                let attempts = self
                    .results
                    .list_for_user(&user.id)?
                    .iter()
                    .filter(|result| &result.test_id == id)
                    .count();
                (Some(attempts > 0), Some(attempts))
            }
            None => (None, None),
        };

        Ok(TestDetail {
            test,
            max_score,
            user_completed,
            user_attempts,
        })
    }

    pub fn create(&self, draft: TestDraft, now: DateTime<Utc>) -> Result<Test, ApiError> {
        draft.validate()?;
        match self.tests.insert(draft.into_test(now)) {
            Ok(test) => Ok(test),
            Err(RepositoryError::Conflict) => Err(ApiError::Conflict {
                resource: "Test".to_string(),
            }),
            Err(other) => Err(other.into()),
        }
    }

    pub fn update(
        &self,
        id: &TestId,
        draft: TestDraft,
        now: DateTime<Utc>,
    ) -> Result<Test, ApiError> {
        draft.validate()?;
        if draft.id != id.0 {
            return Err(ApiError::invalid_field(
                "id",
                "must match the test id in the path",
            ));
        }

        let existing = self
            .tests
            .find(id)?
            .ok_or_else(|| ApiError::not_found("Test"))?;

        let mut replacement = draft.into_test(now);
        replacement.completed_count = existing.completed_count;
        replacement.is_active = existing.is_active;
        replacement.created_at = existing.created_at;

        match self.tests.update(replacement) {
            Ok(test) => Ok(test),
            Err(RepositoryError::NotFound) => Err(ApiError::not_found("Test")),
            Err(other) => Err(other.into()),
        }
    }

    pub fn deactivate(&self, id: &TestId, now: DateTime<Utc>) -> Result<Test, ApiError> {
        match self.tests.deactivate(id, now) {
            Ok(test) => Ok(test),
            Err(RepositoryError::NotFound) => Err(ApiError::not_found("Test")),
            Err(other) => Err(other.into()),
        }
    }

    /// Persist one attempt: recompute the scores from the raw answers, store
    /// the result, and bump the test's completion counter best-effort.
    pub fn submit(
        &self,
        user: &AuthenticatedUser,
        id: &TestId,
        submission: ResultSubmission,
        now: DateTime<Utc>,
    ) -> Result<TestResult, ApiError> {
        submission.validate()?;

        let test = self
            .tests
            .find_active(id)?
            .ok_or_else(|| ApiError::not_found("Test"))?;

        if submission.test_id != id.0 {
            return Err(ApiError::invalid_field(
                "test_id",
                "must match the test id in the path",
            ));
        }

        let summary = scoring::score(&test, &submission.answers);
        let record = TestResult {
            id: next_result_id(),
            user_id: user.id.clone(),
            test_id: test.id.clone(),
            test_title: test.title.clone(),
            test_category: test.category.clone(),
            total_score: summary.total_score,
            category_scores: summary.category_scores,
            answers: submission.answers,
            time_taken_secs: submission.time_taken,
            is_shared: false,
            created_at: now,
        };

        let stored = self.results.insert(record)?;

        // The counter is non-critical: a failed increment must never fail the
        // submission itself.
        if let Err(error) = self.tests.increment_completed(id) {
            tracing::warn!(test_id = %id, %error, "completed_count increment failed");
        }

        Ok(stored)
    }

    pub fn results_for_test(
        &self,
        id: &TestId,
        page: PageParams,
    ) -> Result<TestResultsPage, ApiError> {
        let results = self.results.list_for_test(id)?;
        let (window, pagination) = paginate(results, page);
        Ok(TestResultsPage {
            results: window,
            pagination,
        })
    }
}
