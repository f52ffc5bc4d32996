//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::translator::{ProcessTranslator, Translator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    translator: Arc<dyn Translator>,
}

impl AppState {
    /// Create state backed by the external process named in `config`
    pub fn new(config: Config) -> Self {
        let translator = Arc::new(ProcessTranslator::new(config.translator.clone()));
        Self::with_translator(config, translator)
    }

    /// Create state with a caller-supplied translator
    pub fn with_translator(config: Config, translator: Arc<dyn Translator>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, translator }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the translator
    pub fn translator(&self) -> &dyn Translator {
        self.inner.translator.as_ref()
    }
}
