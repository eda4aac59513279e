// Core modules
pub mod analysis;
pub mod api;
pub mod backtest;
pub mod models;
pub mod risk;
pub mod storage;
pub mod strategy;

// Re-export commonly used types
pub use api::*;
pub use backtest::{BacktestConfig, BacktestEngine, BacktestReport};
pub use models::*;
pub use storage::KlineStore;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
