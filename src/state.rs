use std::sync::Arc;

use crate::config::Args;
use crate::extract::ResponseExtractor;
use crate::llm::{AnalysisModel, AnthropicClient, UpstreamError};
use crate::rate_limit::RateLimiter;

// app's shared state
pub struct AppState {
    pub model: Option<Arc<dyn AnalysisModel>>, // None when no API key is configured
    pub rate_limiter: Arc<RateLimiter>,
    pub extractor: ResponseExtractor,
    pub max_document_chars: usize,
    pub raw_preview_chars: usize,
    pub max_upload_bytes: usize,
    pub api_key: Option<String>, // only inspected by the status endpoint
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, UpstreamError> {
        let api_key = args
            .anthropic_api_key
            .clone()
            .filter(|key| !key.trim().is_empty());

        let model: Option<Arc<dyn AnalysisModel>> = match &api_key {
            Some(key) => {
                let client = AnthropicClient::new(
                    &args.anthropic_base_url,
                    key.clone(),
                    args.model.clone(),
                    args.max_tokens,
                    args.request_timeout(),
                )?;
                Some(Arc::new(client) as Arc<dyn AnalysisModel>)
            }
            None => None,
        };

        let rate_limiter = Arc::new(RateLimiter::new(args.rate_limit, args.rate_window()));
        Ok(Self::new(args, model, rate_limiter, api_key))
    }

    pub fn new(
        args: &Args,
        model: Option<Arc<dyn AnalysisModel>>,
        rate_limiter: Arc<RateLimiter>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            model,
            rate_limiter,
            extractor: ResponseExtractor::lenient(args.lenient_repair),
            max_document_chars: args.max_document_chars,
            raw_preview_chars: args.raw_preview_chars,
            max_upload_bytes: args.max_upload_bytes,
            api_key,
        }
    }
}
