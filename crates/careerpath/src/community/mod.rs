//! Shared results, leaderboards, comparisons, and feedback.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    CategoryAnalytics, ComparisonReport, FeedbackRequest, LeaderboardView, ResultFeedback,
    SharedResultView,
};
pub use repository::FeedbackRepository;
pub use router::community_router;
pub use service::{CommunityService, DEFAULT_LEADERBOARD_LIMIT};
