pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod nse_client;
pub mod pricing;
pub mod processor;
pub mod report;
pub mod scorer;
pub mod selector;
pub mod telegram;
pub mod trend;
pub mod yahoo_client;

// Re-exports (public API)
pub use config::{EngineConfig, ScoreWeights, ScoringConfig, SessionWindow, TrendConfig};
pub use error::AnalyzerError;
pub use models::{
    OptionKind, OptionQuote, PriceBar, PricingResult, Recommendation, ScoredContract, Trend,
    TrendMap,
};
pub use nse_client::NSEClient;
pub use processor::{build_report, evaluate_symbol, MarketSnapshot, RunReport, SymbolEvaluation};
pub use selector::{final_candidates, select_best, select_final, MarketContext, SymbolBest};
