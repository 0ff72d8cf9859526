use crate::domain::account::{AccountId, TrackerId};
use crate::domain::course::{CourseId, Price};
use crate::error::{PurchaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Provider-issued order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Provider-issued payment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A priced, validated purchase request.
///
/// Produced by the eligibility checker and consumed by the order initiator.
/// Never persisted; once the provider order exists, the order handle is the
/// only artifact that survives the request.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseQuote {
    pub purchaser: AccountId,
    pub courses: Vec<CourseId>,
    pub total: Price,
    pub currency: String,
}

/// Order handle returned by the payment provider, held only transiently
/// while the client completes payment out of band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHandle {
    pub id: OrderId,
    pub amount: Price,
    pub currency: String,
    pub receipt: String,
}

/// A client-supplied payment confirmation, verified before any enrollment.
///
/// The course list is trusted from the client and re-validated against the
/// catalog before access is granted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentConfirmation {
    pub purchaser: AccountId,
    pub order: OrderId,
    pub payment: PaymentId,
    pub signature: String,
    pub courses: Vec<CourseId>,
}

impl PaymentConfirmation {
    /// Rejects structurally incomplete confirmations before any verification
    /// work is done.
    pub fn validate(&self) -> Result<()> {
        if self.order.as_str().is_empty()
            || self.payment.as_str().is_empty()
            || self.signature.is_empty()
        {
            return Err(PurchaseError::InvalidRequest(
                "missing payment details".to_string(),
            ));
        }
        if self.courses.is_empty() {
            return Err(PurchaseError::InvalidRequest(
                "course list must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of the enrollment executor for a single course.
#[derive(Debug)]
pub enum CourseOutcome {
    /// Access granted and progress tracker created by this call.
    Enrolled { tracker: TrackerId, notified: bool },
    /// Access was already granted by an earlier call; retry no-op.
    AlreadyEnrolled,
    /// The course could not be granted; the rest of the request proceeded.
    Failed(PurchaseError),
}

impl CourseOutcome {
    /// Whether the purchaser holds access to the course after this outcome.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Enrolled { .. } | Self::AlreadyEnrolled)
    }
}

/// Overall status of a confirmation after the executor has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    /// Every requested course is granted.
    Complete,
    /// Payment was captured but at least one course failed; must be surfaced
    /// to the caller, never masked as plain success.
    Partial,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
        }
    }
}

/// Aggregate result of a confirmation: one outcome per requested course, in
/// request order.
#[derive(Debug, Default)]
pub struct EnrollmentReport {
    outcomes: Vec<(CourseId, CourseOutcome)>,
}

impl EnrollmentReport {
    pub fn push(&mut self, course: CourseId, outcome: CourseOutcome) {
        self.outcomes.push((course, outcome));
    }

    pub fn outcomes(&self) -> &[(CourseId, CourseOutcome)] {
        &self.outcomes
    }

    pub fn status(&self) -> EnrollmentStatus {
        if self.outcomes.iter().all(|(_, o)| o.is_granted()) {
            EnrollmentStatus::Complete
        } else {
            EnrollmentStatus::Partial
        }
    }

    pub fn granted(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_granted()).count()
    }
}

/// Collapses client-supplied duplicates while preserving first-seen order,
/// so a repeated id is neither double-charged nor double-enrolled.
pub fn dedupe_preserving_order(ids: &[CourseId]) -> Vec<CourseId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}
