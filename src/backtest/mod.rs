pub mod account;
pub mod config;
pub mod engine;
pub mod report;
pub mod settlement;
pub mod synthetic;

pub use account::SimulatedAccount;
pub use config::BacktestConfig;
pub use engine::{BacktestEngine, BacktestObserver, EngineState, LogObserver, NoopObserver};
pub use report::BacktestReport;
pub use settlement::{settle, Settlement};
pub use synthetic::{MarketScenario, SyntheticKlineGenerator};
