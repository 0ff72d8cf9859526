use crate::domain::account::AccountId;
use crate::domain::course::CourseId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PurchaseError>;

#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("course not found: {0}")]
    CourseNotFound(CourseId),
    #[error("already enrolled in course {0}")]
    AlreadyEnrolled(CourseId),
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("order creation failed: {0}")]
    OrderCreationFailed(String),
    #[error("payment verification failed")]
    VerificationFailed,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl PurchaseError {
    /// Stable machine-readable kind, used by transport layers to classify
    /// failures without parsing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::CourseNotFound(_) => "course_not_found",
            Self::AlreadyEnrolled(_) => "already_enrolled",
            Self::AccountNotFound(_) => "account_not_found",
            Self::OrderCreationFailed(_) => "order_creation_failed",
            Self::VerificationFailed => "verification_failed",
            Self::Csv(_) => "csv",
            Self::Io(_) => "io",
            #[cfg(feature = "storage-rocksdb")]
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }
}
