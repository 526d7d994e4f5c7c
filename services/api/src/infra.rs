//! Process-local infrastructure: request state plus in-memory implementations
//! of the storage and token-verification seams. A hosted-provider deployment
//! swaps these for client-backed implementations of the same traits.

use std::collections::HashMap;
use std::env;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

use careerpath::auth::{AuthenticatedUser, TokenVerifier, VerifierError};
use careerpath::catalog::domain::{Test, TestId};
use careerpath::catalog::repository::TestRepository;
use careerpath::community::domain::ResultFeedback;
use careerpath::community::repository::FeedbackRepository;
use careerpath::error::RepositoryError;
use careerpath::progress::domain::{LearningPlan, ResultId, TestResult, UserProfile};
use careerpath::progress::repository::{PlanRepository, ProfileRepository, ResultRepository};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTestStore {
    tests: Arc<Mutex<HashMap<TestId, Test>>>,
}

impl InMemoryTestStore {
    pub(crate) fn seeded(tests: Vec<Test>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.tests.lock().expect("test store mutex poisoned");
            for test in tests {
                guard.insert(test.id.clone(), test);
            }
        }
        store
    }
}

impl TestRepository for InMemoryTestStore {
    fn list_active(&self) -> Result<Vec<Test>, RepositoryError> {
        let guard = self.tests.lock().expect("test store mutex poisoned");
        let mut tests: Vec<Test> = guard.values().filter(|t| t.is_active).cloned().collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tests)
    }

    fn find(&self, id: &TestId) -> Result<Option<Test>, RepositoryError> {
        let guard = self.tests.lock().expect("test store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_active(&self, id: &TestId) -> Result<Option<Test>, RepositoryError> {
        let guard = self.tests.lock().expect("test store mutex poisoned");
        Ok(guard.get(id).filter(|t| t.is_active).cloned())
    }

    fn insert(&self, test: Test) -> Result<Test, RepositoryError> {
        let mut guard = self.tests.lock().expect("test store mutex poisoned");
        if guard.contains_key(&test.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(test.id.clone(), test.clone());
        Ok(test)
    }

    fn update(&self, test: Test) -> Result<Test, RepositoryError> {
        let mut guard = self.tests.lock().expect("test store mutex poisoned");
        if !guard.contains_key(&test.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(test.id.clone(), test.clone());
        Ok(test)
    }

    fn deactivate(&self, id: &TestId, at: DateTime<Utc>) -> Result<Test, RepositoryError> {
        let mut guard = self.tests.lock().expect("test store mutex poisoned");
        let test = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        test.is_active = false;
        test.updated_at = at;
        Ok(test.clone())
    }

    fn increment_completed(&self, id: &TestId) -> Result<(), RepositoryError> {
        let mut guard = self.tests.lock().expect("test store mutex poisoned");
        let test = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        test.completed_count += 1;
        Ok(())
    }
}

fn newest_first(mut results: Vec<TestResult>) -> Vec<TestResult> {
    results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    results
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryResultStore {
    results: Arc<Mutex<HashMap<ResultId, TestResult>>>,
}

impl ResultRepository for InMemoryResultStore {
    fn insert(&self, result: TestResult) -> Result<TestResult, RepositoryError> {
        let mut guard = self.results.lock().expect("result store mutex poisoned");
        if guard.contains_key(&result.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(result.id.clone(), result.clone());
        Ok(result)
    }

    fn fetch(&self, id: &ResultId) -> Result<Option<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("result store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("result store mutex poisoned");
        Ok(newest_first(
            guard
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    fn list_for_test(&self, test_id: &TestId) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("result store mutex poisoned");
        Ok(newest_first(
            guard
                .values()
                .filter(|r| &r.test_id == test_id)
                .cloned()
                .collect(),
        ))
    }

    fn list_for_category(&self, category: &str) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("result store mutex poisoned");
        Ok(newest_first(
            guard
                .values()
                .filter(|r| r.test_category == category)
                .cloned()
                .collect(),
        ))
    }

    fn list_all(&self) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("result store mutex poisoned");
        Ok(newest_first(guard.values().cloned().collect()))
    }

    fn delete_owned(&self, id: &ResultId, user_id: &str) -> Result<bool, RepositoryError> {
        let mut guard = self.results.lock().expect("result store mutex poisoned");
        match guard.get(id) {
            Some(result) if result.user_id == user_id => {
                guard.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn set_shared(
        &self,
        id: &ResultId,
        user_id: &str,
        shared: bool,
    ) -> Result<Option<TestResult>, RepositoryError> {
        let mut guard = self.results.lock().expect("result store mutex poisoned");
        match guard.get_mut(id) {
            Some(result) if result.user_id == user_id => {
                result.is_shared = shared;
                Ok(Some(result.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
}

impl ProfileRepository for InMemoryProfileStore {
    fn fetch(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile store mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }

    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut guard = self.profiles.lock().expect("profile store mutex poisoned");
        guard.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn list(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile store mutex poisoned");
        let mut profiles: Vec<UserProfile> = guard.values().cloned().collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(profiles)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPlanStore {
    plans: Arc<Mutex<HashMap<String, LearningPlan>>>,
}

impl PlanRepository for InMemoryPlanStore {
    fn fetch(&self, user_id: &str) -> Result<Option<LearningPlan>, RepositoryError> {
        let guard = self.plans.lock().expect("plan store mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }

    fn upsert(&self, plan: LearningPlan) -> Result<LearningPlan, RepositoryError> {
        let mut guard = self.plans.lock().expect("plan store mutex poisoned");
        guard.insert(plan.user_id.clone(), plan.clone());
        Ok(plan)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryFeedbackStore {
    feedback: Arc<Mutex<HashMap<(ResultId, String), ResultFeedback>>>,
}

impl FeedbackRepository for InMemoryFeedbackStore {
    fn upsert(&self, feedback: ResultFeedback) -> Result<ResultFeedback, RepositoryError> {
        let mut guard = self.feedback.lock().expect("feedback store mutex poisoned");
        guard.insert(
            (feedback.result_id.clone(), feedback.user_id.clone()),
            feedback.clone(),
        );
        Ok(feedback)
    }
}

/// Token table seeded at startup; stands in for the hosted identity provider.
#[derive(Default, Clone)]
pub(crate) struct StaticTokenVerifier {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenVerifier {
    pub(crate) fn with_token(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    /// Operator-provisioned tokens: `APP_ADMIN_TOKEN` grants an admin session,
    /// `APP_USER_TOKEN` a regular one. Either may be absent.
    pub(crate) fn from_env() -> Self {
        let mut verifier = Self::default();
        if let Ok(token) = env::var("APP_ADMIN_TOKEN") {
            verifier = verifier.with_token(
                token,
                AuthenticatedUser {
                    id: "admin".to_string(),
                    email: env::var("APP_ADMIN_EMAIL")
                        .unwrap_or_else(|_| "admin@admin.com".to_string()),
                    name: Some("Administrator".to_string()),
                    role: Some("admin".to_string()),
                },
            );
        }
        if let Ok(token) = env::var("APP_USER_TOKEN") {
            verifier = verifier.with_token(
                token,
                AuthenticatedUser {
                    id: "demo-user".to_string(),
                    email: "demo@example.com".to_string(),
                    name: Some("Demo User".to_string()),
                    role: None,
                },
            );
        }
        verifier
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, VerifierError> {
        Ok(self.tokens.get(token).cloned())
    }
}
