pub mod memory_transaction_repository;
pub mod notifier;
pub mod paystack;
pub mod postgres_transaction_repository;

pub use memory_transaction_repository::InMemoryTransactionRepository;
pub use notifier::{ChannelNotifier, RecordingNotifier};
pub use paystack::PaystackClient;
pub use postgres_transaction_repository::PostgresTransactionRepository;
