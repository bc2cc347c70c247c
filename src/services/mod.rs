pub mod reconciler;
pub mod signature;
pub mod wallet_balance;

pub use reconciler::{Acknowledgement, ReconcileError, WebhookReconciler};
pub use signature::{HmacSha512Verifier, InvalidSignature, SignatureVerifier, VerifiedPayload};
pub use wallet_balance::BalanceProjector;
