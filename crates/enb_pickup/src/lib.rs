pub mod gate;
pub mod pipeline;
pub mod service;
pub mod teams;

pub use gate::{GateOutcome, NotificationGate};
pub use pipeline::{ArticleOutcome, PickupPipeline, PickupReport, PipelineConfig, SkipReason};
pub use service::{HighRelevanceReport, PickupService, ProcessingReport};
pub use teams::TeamsNotifier;
