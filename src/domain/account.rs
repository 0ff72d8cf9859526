use crate::domain::course::CourseId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque purchaser identifier, supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a progress tracker record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackerId(String);

impl TrackerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-enrollment progress record, created with zero completed units.
///
/// Mutation of `completed_units` happens in the course-consumption flow,
/// outside the purchase workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTracker {
    pub id: TrackerId,
    pub course: CourseId,
    pub owner: AccountId,
    pub completed_units: u32,
}

impl ProgressTracker {
    pub fn new(id: TrackerId, course: CourseId, owner: AccountId) -> Self {
        Self {
            id,
            course,
            owner,
            completed_units: 0,
        }
    }
}

/// A purchaser account as seen by the enrollment workflow.
///
/// The workflow only ever appends to `courses` and `progress`; access grants
/// are never removed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub courses: Vec<CourseId>,
    #[serde(default)]
    pub progress: Vec<TrackerId>,
}

impl Account {
    pub fn new(id: AccountId, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: display_name.into(),
            courses: Vec::new(),
            progress: Vec::new(),
        }
    }

    pub fn owns(&self, course: &CourseId) -> bool {
        self.courses.contains(course)
    }
}
