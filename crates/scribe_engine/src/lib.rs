//! Scribe engine: AI transport, retry policy, caching and the editing session.
mod config;
mod error;
mod optimizer;
mod orchestrator;
mod recovery;
mod session;
mod transport;
mod types;

pub use config::SessionConfig;
pub use error::{classify_status, AiError, AiErrorKind};
pub use optimizer::{
    cache_key, OptimisticUpdate, OptimizedResponse, OptimizerMetrics, OptimizerSettings,
    PerformanceOptimizer, RequestOptions,
};
pub use orchestrator::{status_for, OrchestratorSettings, ProgressSink, RequestOrchestrator};
pub use recovery::{
    backoff_delay, fallback_mode, retry_strategy, should_gracefully_degrade, ErrorState,
    RecoveryStrategy, DEGRADE_AFTER_TIMEOUTS,
};
pub use session::{EditingSession, EditorHost};
pub use transport::{
    operation_path, parse_response_body, Endpoint, EndpointSettings, RequestEnvelope,
    ReqwestEndpoint,
};
pub use types::{AiResponse, EngineEvent, OperationParams, OperationRequest};
