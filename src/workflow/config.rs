use crate::error::MattingError;
use std::collections::HashMap;
use std::fmt;

/// Matting category requested from the workflow service.
///
/// Drives which [`ServiceConfig`] the request is routed to. `Auto` is
/// never registered itself: it resolves to `Product`'s config, else
/// `Portrait`'s, a fixed precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum RequestCategory {
    Portrait,
    Product,
    Graphic,
    Auto,
}

impl fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestCategory::Portrait => "portrait",
            RequestCategory::Product => "product",
            RequestCategory::Graphic => "graphic",
            RequestCategory::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Endpoint plus credential for one category. Immutable once built.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub credential: String,
}

impl ServiceConfig {
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
        }
    }
}

/// Category → config table, built once at startup and read-only after.
#[derive(Debug, Default)]
pub struct ServiceRoutes {
    configs: HashMap<RequestCategory, ServiceConfig>,
}

impl ServiceRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, category: RequestCategory, config: ServiceConfig) {
        self.configs.insert(category, config);
    }

    /// Resolve a category to its config.
    ///
    /// `Auto` falls back to `Product`, then `Portrait`. Fails with
    /// [`MattingError::UnsupportedCategory`] when nothing is registered
    /// for the resolved category.
    pub fn resolve(&self, category: RequestCategory) -> Result<&ServiceConfig, MattingError> {
        let config = match category {
            RequestCategory::Auto => self
                .configs
                .get(&RequestCategory::Product)
                .or_else(|| self.configs.get(&RequestCategory::Portrait)),
            other => self.configs.get(&other),
        };
        config.ok_or(MattingError::UnsupportedCategory(category))
    }
}
