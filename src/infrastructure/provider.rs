use crate::domain::ports::{OrderRequest, PaymentProvider};
use crate::domain::purchase::{OrderHandle, OrderId};
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Stand-in for the external payment provider.
///
/// Issues sequential order ids (`order_1`, `order_2`, ...) so scripted
/// drivers can reference orders they are about to create, and remembers every
/// handle it issued. A deployment supplies its own `PaymentProvider` adapter;
/// this one backs the CLI driver and the tests.
#[derive(Default, Clone)]
pub struct SandboxProvider {
    orders: Arc<RwLock<HashMap<OrderId, OrderHandle>>>,
    next_id: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl SandboxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the provider being unreachable or rejecting orders.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn order(&self, id: &OrderId) -> Option<OrderHandle> {
        let orders = self.orders.read().await;
        orders.get(id).cloned()
    }

    pub async fn order_count(&self) -> usize {
        let orders = self.orders.read().await;
        orders.len()
    }
}

#[async_trait]
impl PaymentProvider for SandboxProvider {
    async fn create_order(&self, request: OrderRequest) -> Result<OrderHandle> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PurchaseError::OrderCreationFailed(
                "provider unavailable".to_string(),
            ));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = OrderHandle {
            id: OrderId::new(format!("order_{n}")),
            amount: request.amount,
            currency: request.currency,
            receipt: request.receipt,
        };
        let mut orders = self.orders.write().await;
        orders.insert(handle.id.clone(), handle.clone());
        Ok(handle)
    }
}
