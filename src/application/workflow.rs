use crate::application::checkout::EligibilityChecker;
use crate::application::enrollment::EnrollmentExecutor;
use crate::application::orders::OrderInitiator;
use crate::application::signature::SignatureVerifier;
use crate::domain::account::AccountId;
use crate::domain::course::CourseId;
use crate::domain::ports::{
    AccountStoreRef, CatalogStoreRef, NotificationSenderRef, PaymentProviderRef, ProgressStoreRef,
};
use crate::domain::purchase::{EnrollmentReport, OrderHandle, PaymentConfirmation};
use crate::error::{PurchaseError, Result};
use std::sync::Arc;

/// Sequences pricing, order creation, signature verification and enrollment
/// into the two operations a transport layer exposes.
///
/// A single purchase attempt moves `Initiated -> AwaitingConfirmation ->
/// {Verified -> Enrolled(partial|complete), Rejected}`. Nothing persists
/// before a verified confirmation, so an abandoned attempt needs no cleanup.
pub struct PurchaseWorkflow {
    checker: EligibilityChecker,
    initiator: OrderInitiator,
    verifier: SignatureVerifier,
    executor: EnrollmentExecutor,
}

impl PurchaseWorkflow {
    pub fn new(
        catalog: CatalogStoreRef,
        accounts: AccountStoreRef,
        progress: ProgressStoreRef,
        provider: PaymentProviderRef,
        notifier: NotificationSenderRef,
        secret: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            checker: EligibilityChecker::new(Arc::clone(&catalog)),
            initiator: OrderInitiator::new(provider),
            verifier: SignatureVerifier::new(secret),
            executor: EnrollmentExecutor::new(catalog, accounts, progress, notifier),
        }
    }

    /// Validates and prices the request, then opens a provider order for the
    /// client to pay out of band. The first error from either stage wins and
    /// no local state is written.
    pub async fn begin_purchase(
        &self,
        purchaser: &AccountId,
        courses: &[CourseId],
    ) -> Result<OrderHandle> {
        let quote = self.checker.price_request(purchaser, courses).await?;
        self.initiator.create_order(&quote).await
    }

    /// Verifies the provider signature, then grants access per course.
    ///
    /// A structurally incomplete confirmation or a bad signature rejects
    /// before any state change. The purchaser identity is the authenticated
    /// caller's; binding it to the initiating caller is the authentication
    /// collaborator's job.
    pub async fn confirm_purchase(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<EnrollmentReport> {
        confirmation.validate()?;
        if !self.verifier.verify(
            &confirmation.order,
            &confirmation.payment,
            &confirmation.signature,
        ) {
            return Err(PurchaseError::VerificationFailed);
        }
        self.executor
            .enroll_all(&confirmation.purchaser, &confirmation.courses)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::course::{Course, Price};
    use crate::domain::ports::{AccountStore, CatalogStore};
    use crate::domain::purchase::{OrderId, PaymentId};
    use crate::infrastructure::in_memory::{
        InMemoryAccountStore, InMemoryCatalog, InMemoryProgressStore, RecordingNotifier,
    };
    use crate::infrastructure::provider::SandboxProvider;
    use crate::domain::account::Account;
    use rust_decimal_macros::dec;

    async fn workflow() -> (PurchaseWorkflow, InMemoryCatalog) {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_course(Course::new(
                CourseId::new("c1"),
                "Course c1",
                Price::new(dec!(500)).unwrap(),
            ))
            .await;
        let accounts = InMemoryAccountStore::new();
        accounts
            .register(Account::new(AccountId::new("u1"), "u1@example.com", "U One"))
            .await
            .unwrap();
        let wf = PurchaseWorkflow::new(
            Arc::new(catalog.clone()),
            Arc::new(accounts),
            Arc::new(InMemoryProgressStore::new()),
            Arc::new(SandboxProvider::new()),
            Arc::new(RecordingNotifier::new()),
            "testsecret",
        );
        (wf, catalog)
    }

    #[tokio::test]
    async fn test_begin_purchase_returns_order_handle() {
        let (wf, _) = workflow().await;
        let handle = wf
            .begin_purchase(&AccountId::new("u1"), &[CourseId::new("c1")])
            .await
            .unwrap();
        assert_eq!(handle.amount.value(), dec!(500));
    }

    #[tokio::test]
    async fn test_confirm_rejects_missing_fields_before_verification() {
        let (wf, _) = workflow().await;
        let confirmation = PaymentConfirmation {
            purchaser: AccountId::new("u1"),
            order: OrderId::new("order_1"),
            payment: PaymentId::new(""),
            signature: "deadbeef".to_string(),
            courses: vec![CourseId::new("c1")],
        };
        assert!(matches!(
            wf.confirm_purchase(&confirmation).await,
            Err(PurchaseError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_rejects_bad_signature_without_state_change() {
        let (wf, catalog) = workflow().await;
        let confirmation = PaymentConfirmation {
            purchaser: AccountId::new("u1"),
            order: OrderId::new("order_1"),
            payment: PaymentId::new("pay_1"),
            signature: "00".repeat(32),
            courses: vec![CourseId::new("c1")],
        };
        assert!(matches!(
            wf.confirm_purchase(&confirmation).await,
            Err(PurchaseError::VerificationFailed)
        ));

        let course = catalog.find_course(&CourseId::new("c1")).await.unwrap().unwrap();
        assert!(course.enrolled.is_empty());
    }
}
