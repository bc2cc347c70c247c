pub mod fund_wallet;

pub use fund_wallet::{FundWallet, FundWalletError, FundWalletInput, FundWalletOutput};
