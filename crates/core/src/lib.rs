pub mod config;
pub mod config_loader;
pub mod error;
pub mod market;
pub mod report_formatter;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, EntityConfig, FeatureWeights, NormalizationConfig, ScoringConfig, StorageConfig,
    UniverseConfig,
};
pub use config_loader::ConfigLoader;
pub use error::ConfigError;
pub use market::{DailyBar, MarketData};
pub use report_formatter::ReportFormatter;
pub use traits::{ExplanationInput, Explainer, HistorySink, MarketDataSource};
pub use types::{
    AllocationState, BaselineStatus, DailyResult, EntityId, Feature, HistoryRecord, RawFeatures,
    SectorResult, Universe,
};
