//! Shared fixtures for the workflow tests: in-memory implementations of the
//! storage/auth seams plus a fully wired router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use careerpath::auth::router::{identity_router, IdentityService};
use careerpath::auth::{AdminPolicy, AuthenticatedUser, Authenticator, TokenVerifier, VerifierError};
use careerpath::catalog::domain::{Test, TestId};
use careerpath::catalog::repository::TestRepository;
use careerpath::catalog::{catalog_router, samples, CatalogService};
use careerpath::community::domain::ResultFeedback;
use careerpath::community::repository::FeedbackRepository;
use careerpath::community::{community_router, CommunityService};
use careerpath::config::SharingConfig;
use careerpath::error::RepositoryError;
use careerpath::insights::{insights_router, InsightsService};
use careerpath::progress::domain::{LearningPlan, ResultId, TestResult, UserProfile};
use careerpath::progress::repository::{PlanRepository, ProfileRepository, ResultRepository};
use careerpath::progress::{progress_router, ProgressService};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

#[derive(Default, Clone)]
pub struct MemoryTests {
    tests: Arc<Mutex<HashMap<TestId, Test>>>,
    fail_increments: Arc<Mutex<bool>>,
}

impl MemoryTests {
    pub fn seeded(tests: Vec<Test>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.tests.lock().expect("lock");
            for test in tests {
                guard.insert(test.id.clone(), test);
            }
        }
        store
    }

    pub fn completed_count(&self, id: &str) -> u64 {
        let guard = self.tests.lock().expect("lock");
        guard
            .get(&TestId(id.to_string()))
            .map(|test| test.completed_count)
            .unwrap_or(0)
    }

    pub fn break_increments(&self) {
        *self.fail_increments.lock().expect("lock") = true;
    }
}

impl TestRepository for MemoryTests {
    fn list_active(&self) -> Result<Vec<Test>, RepositoryError> {
        let guard = self.tests.lock().expect("lock");
        let mut tests: Vec<Test> = guard.values().filter(|t| t.is_active).cloned().collect();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tests)
    }

    fn find(&self, id: &TestId) -> Result<Option<Test>, RepositoryError> {
        Ok(self.tests.lock().expect("lock").get(id).cloned())
    }

    fn find_active(&self, id: &TestId) -> Result<Option<Test>, RepositoryError> {
        Ok(self
            .tests
            .lock()
            .expect("lock")
            .get(id)
            .filter(|t| t.is_active)
            .cloned())
    }

    fn insert(&self, test: Test) -> Result<Test, RepositoryError> {
        let mut guard = self.tests.lock().expect("lock");
        if guard.contains_key(&test.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(test.id.clone(), test.clone());
        Ok(test)
    }

    fn update(&self, test: Test) -> Result<Test, RepositoryError> {
        let mut guard = self.tests.lock().expect("lock");
        if !guard.contains_key(&test.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(test.id.clone(), test.clone());
        Ok(test)
    }

    fn deactivate(&self, id: &TestId, at: DateTime<Utc>) -> Result<Test, RepositoryError> {
        let mut guard = self.tests.lock().expect("lock");
        let test = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        test.is_active = false;
        test.updated_at = at;
        Ok(test.clone())
    }

    fn increment_completed(&self, id: &TestId) -> Result<(), RepositoryError> {
        if *self.fail_increments.lock().expect("lock") {
            return Err(RepositoryError::Unavailable("rpc offline".to_string()));
        }
        let mut guard = self.tests.lock().expect("lock");
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
pub struct MemoryResults {
    results: Arc<Mutex<HashMap<ResultId, TestResult>>>,
}

impl ResultRepository for MemoryResults {
    fn insert(&self, result: TestResult) -> Result<TestResult, RepositoryError> {
        let mut guard = self.results.lock().expect("lock");
        if guard.contains_key(&result.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(result.id.clone(), result.clone());
        Ok(result)
    }

    fn fetch(&self, id: &ResultId) -> Result<Option<TestResult>, RepositoryError> {
        Ok(self.results.lock().expect("lock").get(id).cloned())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("lock");
        Ok(newest_first(
            guard
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    fn list_for_test(&self, test_id: &TestId) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("lock");
        Ok(newest_first(
            guard
                .values()
                .filter(|r| &r.test_id == test_id)
                .cloned()
                .collect(),
        ))
    }

    fn list_for_category(&self, category: &str) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("lock");
        Ok(newest_first(
            guard
                .values()
                .filter(|r| r.test_category == category)
                .cloned()
                .collect(),
        ))
    }

    fn list_all(&self) -> Result<Vec<TestResult>, RepositoryError> {
        let guard = self.results.lock().expect("lock");
        Ok(newest_first(guard.values().cloned().collect()))
    }

    fn delete_owned(&self, id: &ResultId, user_id: &str) -> Result<bool, RepositoryError> {
        let mut guard = self.results.lock().expect("lock");
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
        let mut guard = self.results.lock().expect("lock");
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
pub struct MemoryProfiles {
    profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
}

impl ProfileRepository for MemoryProfiles {
    fn fetch(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.profiles.lock().expect("lock").get(user_id).cloned())
    }

    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        self.profiles
            .lock()
            .expect("lock")
            .insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn list(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("lock");
        let mut profiles: Vec<UserProfile> = guard.values().cloned().collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(profiles)
    }
}

#[derive(Default, Clone)]
pub struct MemoryPlans {
    plans: Arc<Mutex<HashMap<String, LearningPlan>>>,
}

impl PlanRepository for MemoryPlans {
    fn fetch(&self, user_id: &str) -> Result<Option<LearningPlan>, RepositoryError> {
        Ok(self.plans.lock().expect("lock").get(user_id).cloned())
    }

    fn upsert(&self, plan: LearningPlan) -> Result<LearningPlan, RepositoryError> {
        self.plans
            .lock()
            .expect("lock")
            .insert(plan.user_id.clone(), plan.clone());
        Ok(plan)
    }
}

#[derive(Default, Clone)]
pub struct MemoryFeedback {
    feedback: Arc<Mutex<HashMap<(ResultId, String), ResultFeedback>>>,
}

impl MemoryFeedback {
    pub fn all(&self) -> Vec<ResultFeedback> {
        self.feedback.lock().expect("lock").values().cloned().collect()
    }
}

impl FeedbackRepository for MemoryFeedback {
    fn upsert(&self, feedback: ResultFeedback) -> Result<ResultFeedback, RepositoryError> {
        self.feedback.lock().expect("lock").insert(
            (feedback.result_id.clone(), feedback.user_id.clone()),
            feedback.clone(),
        );
        Ok(feedback)
    }
}

#[derive(Default, Clone)]
pub struct TableVerifier {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl TokenVerifier for TableVerifier {
    fn verify(&self, token: &str) -> Result<Option<AuthenticatedUser>, VerifierError> {
        Ok(self.tokens.get(token).cloned())
    }
}

pub fn admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: "admin-1".to_string(),
        email: "root@admin.com".to_string(),
        name: Some("Root".to_string()),
        role: None,
    }
}

pub fn alice() -> AuthenticatedUser {
    AuthenticatedUser {
        id: "user-alice".to_string(),
        email: "alice@example.com".to_string(),
        name: Some("Alice".to_string()),
        role: None,
    }
}

pub fn bob() -> AuthenticatedUser {
    AuthenticatedUser {
        id: "user-bob".to_string(),
        email: "bob@example.com".to_string(),
        name: Some("Bob".to_string()),
        role: None,
    }
}

/// Everything the workflow tests need: the merged router plus handles on the
/// underlying stores for direct assertions.
pub struct Platform {
    pub router: Router,
    pub tests: Arc<MemoryTests>,
    pub results: Arc<MemoryResults>,
    pub profiles: Arc<MemoryProfiles>,
    pub plans: Arc<MemoryPlans>,
    pub feedback: Arc<MemoryFeedback>,
}

pub fn build_platform() -> Platform {
    let tests = Arc::new(MemoryTests::seeded(samples::sample_tests()));
    let results = Arc::new(MemoryResults::default());
    let profiles = Arc::new(MemoryProfiles::default());
    let plans = Arc::new(MemoryPlans::default());
    let feedback = Arc::new(MemoryFeedback::default());

    let mut verifier = TableVerifier::default();
    verifier.tokens.insert(ADMIN_TOKEN.to_string(), admin_user());
    verifier.tokens.insert(ALICE_TOKEN.to_string(), alice());
    verifier.tokens.insert(BOB_TOKEN.to_string(), bob());

    let authenticator = Arc::new(Authenticator::new(
        Arc::new(verifier),
        AdminPolicy::new("admin.com"),
    ));

    let catalog = Arc::new(CatalogService::new(
        tests.clone(),
        results.clone(),
        authenticator.clone(),
    ));
    let progress = Arc::new(ProgressService::new(
        profiles.clone(),
        results.clone(),
        plans.clone(),
        authenticator.clone(),
        SharingConfig {
            share_base_url: "http://localhost:3000".to_string(),
        },
    ));
    let community = Arc::new(CommunityService::new(
        profiles.clone(),
        results.clone(),
        feedback.clone(),
        authenticator.clone(),
    ));
    let insights = Arc::new(InsightsService::new(
        profiles.clone(),
        tests.clone(),
        results.clone(),
        authenticator.clone(),
    ));
    let identity = Arc::new(IdentityService::new(authenticator, profiles.clone()));

    let router = catalog_router(catalog)
        .merge(progress_router(progress))
        .merge(community_router(community))
        .merge(insights_router(insights))
        .merge(identity_router(identity));

    Platform {
        router,
        tests,
        results,
        profiles,
        plans,
        feedback,
    }
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    router.clone().oneshot(request).await.expect("router dispatch")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Submit an attempt at the sample orientation test through the real route.
pub async fn submit_orientation(
    router: &Router,
    token: &str,
    answers: Value,
) -> (StatusCode, Value) {
    let body = serde_json::json!({
        "test_id": "career_orientation_basic",
        "test_title": "Career orientation basics",
        "test_category": "orientation",
        "total_score": 0,
        "category_scores": {},
        "answers": answers,
        "time_taken": 300,
    });
    let response = send(
        router,
        "POST",
        "/api/tests/career_orientation_basic/submit",
        Some(token),
        Some(body),
    )
    .await;
    let status = response.status();
    (status, json_body(response).await)
}
