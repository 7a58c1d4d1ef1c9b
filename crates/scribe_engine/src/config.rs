use crate::optimizer::OptimizerSettings;
use crate::orchestrator::OrchestratorSettings;
use crate::transport::EndpointSettings;

/// Everything needed to build an `EditingSession`.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub endpoint: EndpointSettings,
    pub orchestrator: OrchestratorSettings,
    pub optimizer: OptimizerSettings,
}
