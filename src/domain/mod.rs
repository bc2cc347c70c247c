pub mod event;
pub mod state_machine;
pub mod transaction;

pub use event::{EventKind, MalformedEvent, ProviderEvent};
pub use transaction::{
    PaymentProvider, Transaction, TransactionDraft, TransactionIntent, TransactionStatus,
    TransactionType,
};
