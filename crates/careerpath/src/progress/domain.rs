use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::domain::TestId;
use crate::catalog::scoring::AnswerSubmission;
use crate::error::{ApiError, FieldError};

/// Identifier wrapper for stored test results.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultId(pub String);

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed attempt at a test. Created exactly once per submission and
/// never edited in place; only the owner may delete it. The title and category
/// are denormalized at submission time, not joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: ResultId,
    pub user_id: String,
    pub test_id: TestId,
    pub test_title: String,
    pub test_category: String,
    pub total_score: i64,
    pub category_scores: BTreeMap<String, i64>,
    pub answers: BTreeMap<String, AnswerSubmission>,
    pub time_taken_secs: u64,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-user profile, 1:1 with the auth identity. Created lazily on first
/// access and upserted on edit; concurrent edits are last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile edit; omitted fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub age: Option<u32>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut details = Vec::new();

        if let Some(name) = &self.name {
            let len = name.chars().count();
            if !(2..=100).contains(&len) {
                details.push(FieldError::new("name", "must be 2 to 100 characters"));
            }
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > 500 {
                details.push(FieldError::new("bio", "must be at most 500 characters"));
            }
        }
        if let Some(age) = self.age {
            if !(13..=120).contains(&age) {
                details.push(FieldError::new("age", "must be between 13 and 120"));
            }
        }
        if let Some(education) = &self.education {
            if education.chars().count() > 200 {
                details.push(FieldError::new("education", "must be at most 200 characters"));
            }
        }
        if let Some(experience) = &self.experience {
            if experience.chars().count() > 500 {
                details.push(FieldError::new(
                    "experience",
                    "must be at most 500 characters",
                ));
            }
        }
        if let Some(avatar_url) = &self.avatar_url {
            if !avatar_url.is_empty()
                && !(avatar_url.starts_with("http://") || avatar_url.starts_with("https://"))
            {
                details.push(FieldError::new("avatar_url", "must be an http(s) URL"));
            }
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(details))
        }
    }

    /// Merge this edit onto an existing profile.
    pub fn apply(self, mut profile: UserProfile, now: DateTime<Utc>) -> UserProfile {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(bio) = self.bio {
            profile.bio = bio;
        }
        if let Some(age) = self.age {
            profile.age = Some(age);
        }
        if let Some(education) = self.education {
            profile.education = education;
        }
        if let Some(experience) = self.experience {
            profile.experience = experience;
        }
        if let Some(avatar_url) = self.avatar_url {
            profile.avatar_url = avatar_url;
        }
        profile.updated_at = now;
        profile
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Strength,
    Improvement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A category paired with its average score across the user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub category: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub estimated_time: String,
    pub resources: Vec<String>,
}

/// Derived, regenerable summary of a user's strengths and improvement areas.
/// At most one per user; regenerated wholesale from the full result history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPlan {
    pub user_id: String,
    pub strengths: Vec<CategoryScore>,
    pub improvements: Vec<CategoryScore>,
    pub recommendations: Vec<Recommendation>,
    pub status: PlanStatus,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whole-object replacement accepted by the learning-plan PUT.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LearningPlanUpdate {
    #[serde(default)]
    pub strengths: Vec<CategoryScore>,
    #[serde(default)]
    pub improvements: Vec<CategoryScore>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub status: PlanStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile() -> UserProfile {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        UserProfile {
            id: "user-1".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            bio: String::new(),
            age: None,
            education: String::new(),
            experience: String::new(),
            avatar_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn profile_update_collects_all_field_errors() {
        let update = ProfileUpdate {
            name: Some("a".to_string()),
            age: Some(7),
            avatar_url: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        match update.validate().unwrap_err() {
            ApiError::Validation(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["name", "age", "avatar_url"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn profile_update_merges_only_provided_fields() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let update = ProfileUpdate {
            bio: Some("Explorer of careers".to_string()),
            age: Some(30),
            ..Default::default()
        };
        let merged = update.apply(profile(), now);
        assert_eq!(merged.name, "Alice");
        assert_eq!(merged.bio, "Explorer of careers");
        assert_eq!(merged.age, Some(30));
        assert_eq!(merged.updated_at, now);
    }

    #[test]
    fn recommendation_kind_serializes_as_type() {
        let recommendation = Recommendation {
            kind: RecommendationKind::Improvement,
            category: "technical".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            priority: Priority::High,
            estimated_time: "3-6 months".to_string(),
            resources: vec![],
        };
        let value = serde_json::to_value(&recommendation).expect("serializes");
        assert_eq!(value["type"], "improvement");
        assert_eq!(value["priority"], "high");
    }
}
