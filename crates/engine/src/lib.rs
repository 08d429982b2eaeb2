pub mod backfill;
pub mod baseline;
pub mod classifier;
pub mod composite;
pub mod error;
pub mod explain;
pub mod features;
pub mod normalizer;

// Re-export the scoring pipeline
pub use baseline::{
    BaselineObservation, BulkLoadStats, RollingBaselineStore, RollingWindow, WindowSummary,
};
pub use classifier::StateClassifier;
pub use composite::CompositeScorer;
pub use features::FeatureExtractor;
pub use normalizer::{NormalizedFeatureSet, Normalizer};

// Re-export orchestration
pub use backfill::{BackfillOrchestrator, BackfillRun, MemoryHistory};
pub use explain::ExplanationGenerator;

pub use error::{BaselineError, EngineError};
