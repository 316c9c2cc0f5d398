use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::model::LanguageModel;
use crate::translate::TranslationGateway;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<TranslationGateway>,
}

impl AppState {
    /// Hand the loaded model to the gateway; nothing else keeps a reference
    pub fn new(config: &GatewayConfig, model: Box<dyn LanguageModel>) -> Self {
        Self {
            gateway: Arc::new(TranslationGateway::new(model, config)),
        }
    }
}
