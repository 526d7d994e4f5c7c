//! Quiz catalog: definitions, admin management, scoring, and submissions.

pub mod domain;
pub mod repository;
pub mod router;
pub mod samples;
pub mod scoring;
pub mod service;

pub use domain::{
    AnswerOption, Difficulty, Question, QuestionKind, ScaleLabels, Test, TestDraft, TestId,
};
pub use repository::TestRepository;
pub use router::catalog_router;
pub use scoring::{max_possible_score, score, AnswerSubmission, ScoreSummary};
pub use service::{CatalogService, ResultSubmission, TestListQuery};
