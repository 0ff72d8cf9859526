use crate::domain::purchase::{OrderId, PaymentId};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Proves that a payment confirmation was issued by the payment provider.
///
/// The provider signs `"{orderId}|{paymentId}"` with a shared secret using
/// HMAC-SHA256 and sends the hex digest alongside the confirmation. A
/// mismatch is a legitimate negative result, never an error path. Pure
/// computation, no I/O.
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Hex HMAC-SHA256 digest over `orderId|paymentId`.
    pub fn sign(&self, order: &OrderId, payment: &PaymentId) -> String {
        hex::encode(self.digest(order, payment))
    }

    /// Constant-time check of a claimed signature. Malformed hex and
    /// wrong-length digests compare unequal rather than erroring.
    pub fn verify(&self, order: &OrderId, payment: &PaymentId, claimed: &str) -> bool {
        let Ok(claimed) = hex::decode(claimed) else {
            return false;
        };
        let expected = self.digest(order, payment);
        expected.as_slice().ct_eq(claimed.as_slice()).into()
    }

    fn digest(&self, order: &OrderId, payment: &PaymentId) -> [u8; 32] {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any size");
        mac.update(order.as_str().as_bytes());
        mac.update(b"|");
        mac.update(payment.as_str().as_bytes());
        let bytes = mac.finalize().into_bytes();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes);
        digest
    }
}

// The secret must never reach logs or error messages.
impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}
