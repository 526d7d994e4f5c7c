use super::domain::ResultFeedback;
use crate::error::RepositoryError;

/// Storage abstraction over the provider's `result_feedback` table.
pub trait FeedbackRepository: Send + Sync {
    /// Upsert keyed by `(result_id, user_id)`.
    fn upsert(&self, feedback: ResultFeedback) -> Result<ResultFeedback, RepositoryError>;
}
