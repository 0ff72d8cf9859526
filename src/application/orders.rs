use crate::domain::ports::{OrderRequest, PaymentProvider, PaymentProviderRef};
use crate::domain::purchase::{OrderHandle, PurchaseQuote};
use crate::error::{PurchaseError, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;

const RECEIPT_TOKEN_LEN: usize = 24;

/// Opens provider orders for validated quotes.
///
/// The provider client is a constructed, injected instance; there is no
/// global provider connection.
pub struct OrderInitiator {
    provider: PaymentProviderRef,
}

impl OrderInitiator {
    pub fn new(provider: PaymentProviderRef) -> Self {
        Self { provider }
    }

    /// Sends the quote to the provider and returns its order handle
    /// verbatim. Nothing is persisted locally, so a provider failure needs
    /// no rollback.
    pub async fn create_order(&self, quote: &PurchaseQuote) -> Result<OrderHandle> {
        let request = OrderRequest {
            amount: quote.total,
            currency: quote.currency.clone(),
            receipt: new_receipt_token(),
        };
        self.provider.create_order(request).await.map_err(|err| match err {
            PurchaseError::OrderCreationFailed(_) => err,
            other => PurchaseError::OrderCreationFailed(other.to_string()),
        })
    }
}

/// Cryptographically random receipt token; unguessable and collision-free
/// across concurrent requests, unlike a counter.
fn new_receipt_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECEIPT_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("rcpt_{suffix}")
}
