use crate::domain::account::{Account, AccountId};
use crate::domain::course::{Course, CourseId};
use crate::domain::ports::{
    AccountStore, AccountStoreRef, CatalogStore, CatalogStoreRef, EnrollOutcome,
    NotificationSender, NotificationSenderRef, ProgressStore, ProgressStoreRef,
};
use crate::domain::purchase::{CourseOutcome, EnrollmentReport, dedupe_preserving_order};
use crate::error::{PurchaseError, Result};
use tracing::warn;

/// Grants course access after a verified payment.
///
/// Each course is processed independently: one course's failure never aborts
/// the rest, and the aggregate report carries the per-course outcomes. The
/// access grant itself is the conditional insert at the catalog store, so a
/// client retry converges instead of double-enrolling.
pub struct EnrollmentExecutor {
    catalog: CatalogStoreRef,
    accounts: AccountStoreRef,
    progress: ProgressStoreRef,
    notifier: NotificationSenderRef,
}

impl EnrollmentExecutor {
    pub fn new(
        catalog: CatalogStoreRef,
        accounts: AccountStoreRef,
        progress: ProgressStoreRef,
        notifier: NotificationSenderRef,
    ) -> Self {
        Self {
            catalog,
            accounts,
            progress,
            notifier,
        }
    }

    /// Runs the grant sequence for every requested course, in request order,
    /// and returns the aggregate report. Only a store-level fault that
    /// prevents reading the purchaser's account aborts the whole call.
    pub async fn enroll_all(
        &self,
        purchaser: &AccountId,
        courses: &[CourseId],
    ) -> Result<EnrollmentReport> {
        let mut report = EnrollmentReport::default();
        for id in dedupe_preserving_order(courses) {
            let outcome = match self.enroll_one(purchaser, &id).await {
                Ok(outcome) => outcome,
                Err(err) => CourseOutcome::Failed(err),
            };
            report.push(id, outcome);
        }
        Ok(report)
    }

    async fn enroll_one(&self, purchaser: &AccountId, course_id: &CourseId) -> Result<CourseOutcome> {
        // Re-check existence: the course set in the confirmation is client
        // supplied, and a course can disappear between begin and confirm.
        let course = self
            .catalog
            .find_course(course_id)
            .await?
            .ok_or_else(|| PurchaseError::CourseNotFound(course_id.clone()))?;
        let account = self
            .accounts
            .find(purchaser)
            .await?
            .ok_or_else(|| PurchaseError::AccountNotFound(purchaser.clone()))?;

        match self.catalog.enroll(course_id, purchaser).await? {
            // Retry of an earlier confirmation; the grant, tracker and
            // account refs already exist.
            EnrollOutcome::AlreadyEnrolled => return Ok(CourseOutcome::AlreadyEnrolled),
            EnrollOutcome::Created => {}
        }

        // A tracker must exist iff the enrollment record does. If the tracker
        // cannot be created, the fresh enrollment is revoked so the pair is
        // created whole or not at all.
        let tracker = match self.progress.create_tracker(course_id, purchaser).await {
            Ok(tracker) => tracker,
            Err(err) => {
                self.catalog.revoke_enrollment(course_id, purchaser).await?;
                return Err(err);
            }
        };
        self.accounts.add_course(purchaser, course_id).await?;
        self.accounts.add_progress_ref(purchaser, &tracker).await?;

        let notified = self.notify(&account, &course).await;
        Ok(CourseOutcome::Enrolled { tracker, notified })
    }

    /// Best-effort dispatch with its own error channel: a failed send is
    /// logged and flagged on the outcome, never unwinding the grant.
    async fn notify(&self, account: &Account, course: &Course) -> bool {
        let subject = format!("Successfully enrolled into {}", course.title);
        let body = format!(
            "Hi {}, you now have access to \"{}\". Happy learning!",
            account.display_name, course.title
        );
        match self.notifier.send(&account.email, &subject, &body).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    course = %course.id,
                    purchaser = %account.id,
                    error = %err,
                    "enrollment notification failed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::TrackerId;
    use crate::domain::course::Price;
    use crate::domain::purchase::EnrollmentStatus;
    use crate::infrastructure::in_memory::{
        InMemoryAccountStore, InMemoryCatalog, InMemoryProgressStore, RecordingNotifier,
    };
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Fixture {
        catalog: InMemoryCatalog,
        accounts: InMemoryAccountStore,
        progress: InMemoryProgressStore,
        notifier: RecordingNotifier,
        executor: EnrollmentExecutor,
    }

    async fn fixture(course_ids: &[&str]) -> Fixture {
        let catalog = InMemoryCatalog::new();
        for id in course_ids {
            catalog
                .insert_course(Course::new(
                    CourseId::new(*id),
                    format!("Course {id}"),
                    Price::new(dec!(100)).unwrap(),
                ))
                .await;
        }
        let accounts = InMemoryAccountStore::new();
        accounts
            .register(Account::new(AccountId::new("u1"), "u1@example.com", "U One"))
            .await
            .unwrap();
        let progress = InMemoryProgressStore::new();
        let notifier = RecordingNotifier::new();
        let executor = EnrollmentExecutor::new(
            Arc::new(catalog.clone()),
            Arc::new(accounts.clone()),
            Arc::new(progress.clone()),
            Arc::new(notifier.clone()),
        );
        Fixture {
            catalog,
            accounts,
            progress,
            notifier,
            executor,
        }
    }

    #[tokio::test]
    async fn test_enroll_grants_access_tracker_and_notification() {
        let f = fixture(&["c1"]).await;
        let u1 = AccountId::new("u1");

        let report = f.executor.enroll_all(&u1, &[CourseId::new("c1")]).await.unwrap();
        assert_eq!(report.status(), EnrollmentStatus::Complete);
        assert_eq!(report.granted(), 1);

        let course = f.catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.owned_by(&u1));

        let account = f.accounts.find(&u1).await.unwrap().unwrap();
        assert_eq!(account.courses, vec![CourseId::new("c1")]);
        assert_eq!(account.progress.len(), 1);

        assert_eq!(f.progress.tracker_count().await, 1);
        let sent = f.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "u1@example.com");
        assert!(sent[0].subject.contains("Course c1"));
    }

    #[tokio::test]
    async fn test_enrollment_is_idempotent_under_retry() {
        let f = fixture(&["c1"]).await;
        let u1 = AccountId::new("u1");
        let courses = [CourseId::new("c1")];

        let first = f.executor.enroll_all(&u1, &courses).await.unwrap();
        let second = f.executor.enroll_all(&u1, &courses).await.unwrap();

        // The retry is a no-op success, not an error.
        assert_eq!(second.status(), EnrollmentStatus::Complete);
        assert!(matches!(
            second.outcomes()[0].1,
            CourseOutcome::AlreadyEnrolled
        ));
        assert!(matches!(first.outcomes()[0].1, CourseOutcome::Enrolled { .. }));

        // Exactly one enrollment record, tracker and account ref.
        let course = f.catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert_eq!(course.enrolled.len(), 1);
        assert_eq!(f.progress.tracker_count().await, 1);
        let account = f.accounts.find(&u1).await.unwrap().unwrap();
        assert_eq!(account.courses.len(), 1);
        assert_eq!(account.progress.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated_and_reported() {
        let f = fixture(&["c1"]).await;
        let u1 = AccountId::new("u1");

        // c2 was deleted from the catalog between begin and confirm.
        let report = f
            .executor
            .enroll_all(&u1, &[CourseId::new("c1"), CourseId::new("c2")])
            .await
            .unwrap();

        assert_eq!(report.status(), EnrollmentStatus::Partial);
        assert_eq!(report.granted(), 1);
        assert!(matches!(report.outcomes()[0].1, CourseOutcome::Enrolled { .. }));
        assert!(matches!(
            &report.outcomes()[1].1,
            CourseOutcome::Failed(PurchaseError::CourseNotFound(id)) if *id == CourseId::new("c2")
        ));

        let course = f.catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.owned_by(&u1));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_remaining_courses() {
        let f = fixture(&["c1", "c3"]).await;
        let u1 = AccountId::new("u1");

        let report = f
            .executor
            .enroll_all(
                &u1,
                &[CourseId::new("c1"), CourseId::new("c2"), CourseId::new("c3")],
            )
            .await
            .unwrap();

        // The missing middle course must not stop c3.
        assert_eq!(report.granted(), 2);
        assert!(matches!(report.outcomes()[2].1, CourseOutcome::Enrolled { .. }));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_unwind_enrollment() {
        let f = fixture(&["c1"]).await;
        f.notifier.set_failing(true);
        let u1 = AccountId::new("u1");

        let report = f.executor.enroll_all(&u1, &[CourseId::new("c1")]).await.unwrap();
        assert_eq!(report.status(), EnrollmentStatus::Complete);
        assert!(matches!(
            report.outcomes()[0].1,
            CourseOutcome::Enrolled { notified: false, .. }
        ));

        let course = f.catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.owned_by(&u1));
        assert_eq!(f.progress.tracker_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_account_is_a_per_course_failure() {
        let f = fixture(&["c1"]).await;
        let ghost = AccountId::new("ghost");

        let report = f.executor.enroll_all(&ghost, &[CourseId::new("c1")]).await.unwrap();
        assert_eq!(report.status(), EnrollmentStatus::Partial);
        assert!(matches!(
            &report.outcomes()[0].1,
            CourseOutcome::Failed(PurchaseError::AccountNotFound(_))
        ));

        let course = f.catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.enrolled.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_enroll_once() {
        let f = fixture(&["c1"]).await;
        let u1 = AccountId::new("u1");

        let report = f
            .executor
            .enroll_all(&u1, &[CourseId::new("c1"), CourseId::new("c1")])
            .await
            .unwrap();
        assert_eq!(report.outcomes().len(), 1);
        assert_eq!(f.progress.tracker_count().await, 1);
    }

    struct BrokenProgressStore;

    #[async_trait::async_trait]
    impl ProgressStore for BrokenProgressStore {
        async fn create_tracker(
            &self,
            _course: &CourseId,
            _purchaser: &AccountId,
        ) -> Result<TrackerId> {
            Err(PurchaseError::Internal(Box::new(std::io::Error::other(
                "tracker store down",
            ))))
        }
    }

    #[tokio::test]
    async fn test_tracker_failure_revokes_fresh_enrollment() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_course(Course::new(
                CourseId::new("c1"),
                "Course c1",
                Price::new(dec!(100)).unwrap(),
            ))
            .await;
        let accounts = InMemoryAccountStore::new();
        accounts
            .register(Account::new(AccountId::new("u1"), "u1@example.com", "U One"))
            .await
            .unwrap();
        let executor = EnrollmentExecutor::new(
            Arc::new(catalog.clone()),
            Arc::new(accounts.clone()),
            Arc::new(BrokenProgressStore),
            Arc::new(RecordingNotifier::new()),
        );
        let u1 = AccountId::new("u1");

        let report = executor.enroll_all(&u1, &[CourseId::new("c1")]).await.unwrap();
        assert_eq!(report.status(), EnrollmentStatus::Partial);

        // Enrollment and tracker are created whole or not at all: the failed
        // tracker step revoked the enrollment record.
        let course = catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.enrolled.is_empty());
        let account = accounts.find(&u1).await.unwrap().unwrap();
        assert!(account.courses.is_empty());
    }
}
