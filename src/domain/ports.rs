use crate::domain::account::{Account, AccountId, TrackerId};
use crate::domain::course::{Course, CourseId, Price};
use crate::domain::purchase::OrderHandle;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a conditional enrollment insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// The (course, purchaser) record was created by this call.
    Created,
    /// The record already existed; nothing was written.
    AlreadyEnrolled,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>>;

    /// Lists every course whose id is not in `except`. Serves the browsing
    /// surfaces that sit outside the purchase workflow.
    async fn find_courses_except(&self, except: &[CourseId]) -> Result<Vec<Course>>;

    /// Appends the purchaser to the course's enrolled set. Duplicate
    /// detection and the append are a single atomic store operation, so the
    /// insert stays correct under concurrent confirmation retries.
    async fn enroll(&self, course: &CourseId, purchaser: &AccountId) -> Result<EnrollOutcome>;

    /// Removes a record created by `enroll`. Compensation for a failed
    /// enrollment step only; never part of the happy path.
    async fn revoke_enrollment(&self, course: &CourseId, purchaser: &AccountId) -> Result<()>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Provisions an account if absent; an existing account is left intact.
    /// Account creation belongs to the out-of-scope user service; the store
    /// carries the operation so drivers and tests can seed purchasers.
    async fn register(&self, account: Account) -> Result<()>;

    async fn add_course(&self, id: &AccountId, course: &CourseId) -> Result<()>;

    async fn add_progress_ref(&self, id: &AccountId, tracker: &TrackerId) -> Result<()>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Creates a tracker with zero completed units for the enrollment.
    async fn create_tracker(&self, course: &CourseId, purchaser: &AccountId) -> Result<TrackerId>;
}

/// Order request sent to the external payment provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub amount: Price,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Opens an order at the provider; external call with non-deterministic
    /// latency. The returned handle is passed to the client verbatim.
    async fn create_order(&self, request: OrderRequest) -> Result<OrderHandle>;
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Best-effort delivery; callers treat failure as advisory.
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

pub type CatalogStoreRef = Arc<dyn CatalogStore>;
pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type ProgressStoreRef = Arc<dyn ProgressStore>;
pub type PaymentProviderRef = Arc<dyn PaymentProvider>;
pub type NotificationSenderRef = Arc<dyn NotificationSender>;
