use crate::domain::account::{Account, AccountId, ProgressTracker, TrackerId};
use crate::domain::course::{Course, CourseId};
use crate::domain::ports::{AccountStore, CatalogStore, EnrollOutcome, ProgressStore};
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory catalog.
///
/// Enrollment membership lives on the course record. The conditional insert
/// holds the write lock across the duplicate check and the append, so
/// concurrent confirmation retries cannot double-enroll.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    courses: Arc<RwLock<HashMap<CourseId, Course>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or replaces a course. Catalog authoring is out of scope; this
    /// exists for drivers and tests.
    pub async fn insert_course(&self, course: Course) {
        let mut courses = self.courses.write().await;
        courses.insert(course.id.clone(), course);
    }

    /// Deletes a course, returning whether it existed. Lets tests model a
    /// course disappearing between initiation and confirmation.
    pub async fn remove_course(&self, id: &CourseId) -> bool {
        let mut courses = self.courses.write().await;
        courses.remove(id).is_some()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>> {
        let courses = self.courses.read().await;
        Ok(courses.get(id).cloned())
    }

    async fn find_courses_except(&self, except: &[CourseId]) -> Result<Vec<Course>> {
        let courses = self.courses.read().await;
        let mut listed: Vec<Course> = courses
            .values()
            .filter(|course| !except.contains(&course.id))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listed)
    }

    async fn enroll(&self, course: &CourseId, purchaser: &AccountId) -> Result<EnrollOutcome> {
        let mut courses = self.courses.write().await;
        let course = courses
            .get_mut(course)
            .ok_or_else(|| PurchaseError::CourseNotFound(course.clone()))?;
        if course.enrolled.insert(purchaser.clone()) {
            Ok(EnrollOutcome::Created)
        } else {
            Ok(EnrollOutcome::AlreadyEnrolled)
        }
    }

    async fn revoke_enrollment(&self, course: &CourseId, purchaser: &AccountId) -> Result<()> {
        let mut courses = self.courses.write().await;
        if let Some(course) = courses.get_mut(course) {
            course.enrolled.remove(purchaser);
        }
        Ok(())
    }
}

/// A thread-safe in-memory store for purchaser accounts.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find(&self, id: &AccountId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(id).cloned())
    }

    async fn register(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        // Re-provisioning an existing id must not reset its grants.
        accounts.entry(account.id.clone()).or_insert(account);
        Ok(())
    }

    async fn add_course(&self, id: &AccountId, course: &CourseId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| PurchaseError::AccountNotFound(id.clone()))?;
        if !account.courses.contains(course) {
            account.courses.push(course.clone());
        }
        Ok(())
    }

    async fn add_progress_ref(&self, id: &AccountId, tracker: &TrackerId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(id)
            .ok_or_else(|| PurchaseError::AccountNotFound(id.clone()))?;
        if !account.progress.contains(tracker) {
            account.progress.push(tracker.clone());
        }
        Ok(())
    }
}

/// A thread-safe in-memory progress store with sequential tracker ids.
#[derive(Default, Clone)]
pub struct InMemoryProgressStore {
    trackers: Arc<RwLock<HashMap<TrackerId, ProgressTracker>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tracker(&self, id: &TrackerId) -> Option<ProgressTracker> {
        let trackers = self.trackers.read().await;
        trackers.get(id).cloned()
    }

    pub async fn tracker_count(&self) -> usize {
        let trackers = self.trackers.read().await;
        trackers.len()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn create_tracker(&self, course: &CourseId, purchaser: &AccountId) -> Result<TrackerId> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = TrackerId::new(format!("trk_{n}"));
        let tracker = ProgressTracker::new(id.clone(), course.clone(), purchaser.clone());
        let mut trackers = self.trackers.write().await;
        trackers.insert(id.clone(), tracker);
        Ok(id)
    }
}

pub use crate::infrastructure::notify::RecordingNotifier;
