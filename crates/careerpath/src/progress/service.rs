use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    LearningPlan, LearningPlanUpdate, ProfileUpdate, ResultId, TestResult, UserProfile,
};
use super::plan;
use super::repository::{PlanRepository, ProfileRepository, ResultRepository};
use crate::auth::{AuthenticatedUser, Authenticator, TokenVerifier};
use crate::config::SharingConfig;
use crate::error::ApiError;
use crate::insights::rollups::{self, UserStats};
use crate::pagination::{paginate, PageInfo, PageParams};

/// Filters accepted by the personal result listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultListQuery {
    pub test_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ResultListQuery {
    fn page(&self) -> PageParams {
        let defaults = PageParams::default();
        PageParams {
            limit: self.limit.unwrap_or(defaults.limit),
            offset: self.offset.unwrap_or(defaults.offset),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultListPage {
    pub results: Vec<TestResult>,
    pub pagination: PageInfo,
}

/// Outcome of toggling a result's shared flag.
#[derive(Debug, Clone, Serialize)]
pub struct ShareOutcome {
    pub result: TestResult,
    pub share_url: Option<String>,
}

/// Service behind the per-user surface: profile, result history, and the
/// learning plan. Every operation is owner-scoped by construction — the
/// caller identity is threaded into each repository call.
pub struct ProgressService<P, R, L, V> {
    profiles: Arc<P>,
    results: Arc<R>,
    plans: Arc<L>,
    auth: Arc<Authenticator<V>>,
    sharing: SharingConfig,
}

impl<P, R, L, V> ProgressService<P, R, L, V>
where
    P: ProfileRepository + 'static,
    R: ResultRepository + 'static,
    L: PlanRepository + 'static,
    V: TokenVerifier + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        results: Arc<R>,
        plans: Arc<L>,
        auth: Arc<Authenticator<V>>,
        sharing: SharingConfig,
    ) -> Self {
        Self {
            profiles,
            results,
            plans,
            auth,
            sharing,
        }
    }

    pub fn auth(&self) -> &Authenticator<V> {
        &self.auth
    }

    /// Fetch the caller's profile, creating a minimal one on first access.
    pub fn profile(
        &self,
        user: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ApiError> {
        if let Some(profile) = self.profiles.fetch(&user.id)? {
            return Ok(profile);
        }
        let created = self.profiles.upsert(Self::base_profile(user, now))?;
        Ok(created)
    }

    pub fn update_profile(
        &self,
        user: &AuthenticatedUser,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ApiError> {
        update.validate()?;
        let existing = match self.profiles.fetch(&user.id)? {
            Some(profile) => profile,
            None => Self::base_profile(user, now),
        };
        let merged = update.apply(existing, now);
        Ok(self.profiles.upsert(merged)?)
    }

    fn base_profile(user: &AuthenticatedUser, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone().unwrap_or_default(),
            bio: String::new(),
            age: None,
            education: String::new(),
            experience: String::new(),
            avatar_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn results(
        &self,
        user: &AuthenticatedUser,
        query: &ResultListQuery,
    ) -> Result<ResultListPage, ApiError> {
        let mut results = self.results.list_for_user(&user.id)?;
        if let Some(test_id) = &query.test_id {
            results.retain(|result| &result.test_id.0 == test_id);
        }
        let (window, pagination) = paginate(results, query.page());
        Ok(ResultListPage {
            results: window,
            pagination,
        })
    }

    /// Owner-scoped fetch. A result owned by someone else reads as absent so
    /// existence never leaks across accounts.
    pub fn result(
        &self,
        user: &AuthenticatedUser,
        id: &ResultId,
    ) -> Result<TestResult, ApiError> {
        match self.results.fetch(id)? {
            Some(result) if result.user_id == user.id => Ok(result),
            _ => Err(ApiError::not_found("Result")),
        }
    }

    pub fn delete_result(
        &self,
        user: &AuthenticatedUser,
        id: &ResultId,
    ) -> Result<(), ApiError> {
        if self.results.delete_owned(id, &user.id)? {
            Ok(())
        } else {
            Err(ApiError::not_found("Result"))
        }
    }

    pub fn stats(&self, user: &AuthenticatedUser) -> Result<UserStats, ApiError> {
        let results = self.results.list_for_user(&user.id)?;
        Ok(rollups::user_stats(&results))
    }

    pub fn learning_plan(&self, user: &AuthenticatedUser) -> Result<LearningPlan, ApiError> {
        self.plans.fetch(&user.id)?.ok_or_else(|| {
            ApiError::not_found_with_hint(
                "Learning plan",
                "Complete some tests to generate a learning plan",
            )
        })
    }

    /// Regenerate the plan wholesale from the caller's result history.
    pub fn generate_learning_plan(
        &self,
        user: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> Result<LearningPlan, ApiError> {
        let results = self.results.list_for_user(&user.id)?;
        let plan = plan::generate_plan(&user.id, &results, now)
            .map_err(|_| ApiError::no_data("Complete at least one test to generate a learning plan"))?;
        Ok(self.plans.upsert(plan)?)
    }

    /// Whole-object replacement; the original generation timestamp survives.
    pub fn replace_learning_plan(
        &self,
        user: &AuthenticatedUser,
        update: LearningPlanUpdate,
        now: DateTime<Utc>,
    ) -> Result<LearningPlan, ApiError> {
        let generated_at = self
            .plans
            .fetch(&user.id)?
            .map(|existing| existing.generated_at)
            .unwrap_or(now);

        let plan = LearningPlan {
            user_id: user.id.clone(),
            strengths: update.strengths,
            improvements: update.improvements,
            recommendations: update.recommendations,
            status: update.status,
            generated_at,
            updated_at: now,
        };
        Ok(self.plans.upsert(plan)?)
    }

    pub fn share_result(
        &self,
        user: &AuthenticatedUser,
        id: &ResultId,
        shared: bool,
    ) -> Result<ShareOutcome, ApiError> {
        let result = self
            .results
            .set_shared(id, &user.id, shared)?
            .ok_or_else(|| ApiError::not_found("Result"))?;

        let share_url = shared.then(|| self.sharing.shared_result_url(&result.id.0));
        Ok(ShareOutcome { result, share_url })
    }
}
