//! Per-user progress: profiles, result history, and the derived learning plan.

pub mod domain;
pub mod plan;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    CategoryScore, LearningPlan, LearningPlanUpdate, PlanStatus, Priority, ProfileUpdate,
    Recommendation, RecommendationKind, ResultId, TestResult, UserProfile,
};
pub use plan::{generate_plan, NoResultHistory, IMPROVEMENT_THRESHOLD, STRENGTH_THRESHOLD};
pub use repository::{PlanRepository, ProfileRepository, ResultRepository};
pub use router::progress_router;
pub use service::{ProgressService, ResultListQuery};
