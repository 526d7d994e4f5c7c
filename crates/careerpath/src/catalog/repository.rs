use chrono::{DateTime, Utc};

use super::domain::{Test, TestId};
use crate::error::RepositoryError;

/// Storage abstraction over the provider's `tests` table.
///
/// Soft deletes and the completion counter are explicit operations so the
/// service layer can be exercised against an in-memory fake.
pub trait TestRepository: Send + Sync {
    /// Active tests, newest first.
    fn list_active(&self) -> Result<Vec<Test>, RepositoryError>;
    /// Lookup regardless of the soft-delete flag (admin mutations).
    fn find(&self, id: &TestId) -> Result<Option<Test>, RepositoryError>;
    /// Lookup that treats soft-deleted tests as absent (read surface).
    fn find_active(&self, id: &TestId) -> Result<Option<Test>, RepositoryError>;
    fn insert(&self, test: Test) -> Result<Test, RepositoryError>;
    /// Whole-document replace keyed by the test id.
    fn update(&self, test: Test) -> Result<Test, RepositoryError>;
    /// Soft delete: flip `is_active` off, keep the row.
    fn deactivate(&self, id: &TestId, at: DateTime<Utc>) -> Result<Test, RepositoryError>;
    /// The provider's atomic server-side counter increment.
    fn increment_completed(&self, id: &TestId) -> Result<(), RepositoryError>;
}
