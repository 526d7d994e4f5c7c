use super::domain::{LearningPlan, ResultId, TestResult, UserProfile};
use crate::catalog::domain::TestId;
use crate::error::RepositoryError;

/// Storage abstraction over the provider's `profiles` table.
pub trait ProfileRepository: Send + Sync {
    fn fetch(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError>;
    /// Upsert keyed by the auth user id; last write wins under concurrent edits.
    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError>;
    fn list(&self) -> Result<Vec<UserProfile>, RepositoryError>;
}

/// Storage abstraction over the provider's `test_results` table.
///
/// Every listing returns rows ordered newest first. Owner-scoped operations
/// take the caller id so a foreign row behaves exactly like an absent one.
pub trait ResultRepository: Send + Sync {
    fn insert(&self, result: TestResult) -> Result<TestResult, RepositoryError>;
    fn fetch(&self, id: &ResultId) -> Result<Option<TestResult>, RepositoryError>;
    fn list_for_user(&self, user_id: &str) -> Result<Vec<TestResult>, RepositoryError>;
    fn list_for_test(&self, test_id: &TestId) -> Result<Vec<TestResult>, RepositoryError>;
    fn list_for_category(&self, category: &str) -> Result<Vec<TestResult>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<TestResult>, RepositoryError>;
    /// Delete scoped to the owner; `Ok(false)` when no owned row matched.
    fn delete_owned(&self, id: &ResultId, user_id: &str) -> Result<bool, RepositoryError>;
    /// Flip the shared flag, scoped to the owner; `Ok(None)` when no owned row matched.
    fn set_shared(
        &self,
        id: &ResultId,
        user_id: &str,
        shared: bool,
    ) -> Result<Option<TestResult>, RepositoryError>;
}

/// Storage abstraction over the provider's `learning_plans` table.
pub trait PlanRepository: Send + Sync {
    fn fetch(&self, user_id: &str) -> Result<Option<LearningPlan>, RepositoryError>;
    /// Upsert keyed by the unique user id; last write wins under concurrent edits.
    fn upsert(&self, plan: LearningPlan) -> Result<LearningPlan, RepositoryError>;
}
