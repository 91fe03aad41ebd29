use tracing::{info, warn};

use super::{ArimaAdapter, DriftAdapter, ForecastModel, ModelKind, ProphetAdapter};

/// Which model families are available in this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub arima: bool,
    pub prophet: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { arima: true, prophet: true }
    }
}

impl Capabilities {
    pub fn supports(&self, kind: ModelKind) -> bool {
        match kind {
            ModelKind::Arima => self.arima,
            ModelKind::Prophet => self.prophet,
        }
    }
}

/// Availability of one model family.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescription {
    pub kind: ModelKind,
    pub available: bool,
    /// Adapter that will serve requests for this kind
    pub adapter: String,
}

/// Maps each model kind to the adapter serving it, resolved once at startup.
///
/// Kinds whose capability is disabled are served by [`DriftAdapter`].
pub struct ModelRegistry {
    capabilities: Capabilities,
    adapters: Vec<(ModelKind, Box<dyn ForecastModel>)>,
    fallback: DriftAdapter,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl ModelRegistry {
    pub fn from_capabilities(capabilities: Capabilities) -> Self {
        let mut adapters: Vec<(ModelKind, Box<dyn ForecastModel>)> = Vec::new();
        for kind in ModelKind::ALL {
            if !capabilities.supports(kind) {
                warn!("{} is disabled, requests will use the degraded drift forecast", kind);
                continue;
            }
            let adapter: Box<dyn ForecastModel> = match kind {
                ModelKind::Arima => Box::new(ArimaAdapter::default()),
                ModelKind::Prophet => Box::new(ProphetAdapter::default()),
            };
            info!("{} served by {}", kind, adapter.name());
            adapters.push((kind, adapter));
        }

        Self { capabilities, adapters, fallback: DriftAdapter }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn adapter(&self, kind: ModelKind) -> &dyn ForecastModel {
        self.adapters
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, adapter)| adapter.as_ref())
            .unwrap_or(&self.fallback)
    }

    pub fn is_degraded(&self, kind: ModelKind) -> bool {
        !self.adapters.iter().any(|(k, _)| *k == kind)
    }

    pub fn describe(&self) -> Vec<ModelDescription> {
        ModelKind::ALL
            .into_iter()
            .map(|kind| ModelDescription {
                kind,
                available: !self.is_degraded(kind),
                adapter: self.adapter(kind).name().to_string(),
            })
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::from_capabilities(Capabilities::default())
    }
}
