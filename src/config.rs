use clap::Parser;
use std::time::Duration;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "disclosure-analyzer")]
#[command(about = "Real-estate disclosure analysis service backed by an LLM")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Anthropic API key. Missing key is reported per request, not at startup
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com")]
    pub anthropic_base_url: String,

    // Model id sent with every analysis request
    #[arg(short, long, env = "ANALYZER_MODEL", default_value = "claude-3-opus-20240229")]
    pub model: String,

    // Output-length ceiling for the model reply
    #[arg(long, env = "ANALYZER_MAX_TOKENS", default_value_t = 4000)]
    pub max_tokens: u32,

    // Upstream request timeout in seconds
    #[arg(long, env = "ANALYZER_REQUEST_TIMEOUT", default_value_t = 300)]
    pub request_timeout: u64,

    // Character budget for the document forwarded to the model
    #[arg(long, env = "ANALYZER_MAX_DOCUMENT_CHARS", default_value_t = 75_000)]
    pub max_document_chars: usize,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window: u64,

    // How often expired rate-limit records are pruned (0 disables)
    #[arg(long, env = "RATE_LIMIT_SWEEP_INTERVAL", default_value_t = 300)]
    pub rate_sweep_interval: u64,

    // Characters of the raw model reply included in parse errors (0 omits it)
    #[arg(long, env = "ANALYZER_RAW_PREVIEW_CHARS", default_value_t = 200)]
    pub raw_preview_chars: usize,

    // Accept repaired replies even when required fields are missing
    #[arg(long, env = "ANALYZER_LENIENT_REPAIR", default_value_t = false)]
    pub lenient_repair: bool,

    // Upload size limit for document extraction
    #[arg(long, env = "ANALYZER_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.rate_sweep_interval > 0).then(|| Duration::from_secs(self.rate_sweep_interval))
    }
}

// Mirrors the clap defaults without touching the process environment
impl Default for Args {
    fn default() -> Self {
        Self {
            port: 8080,
            anthropic_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-opus-20240229".to_string(),
            max_tokens: 4000,
            request_timeout: 300,
            max_document_chars: 75_000,
            rate_limit: 5,
            rate_window: 60,
            rate_sweep_interval: 300,
            raw_preview_chars: 200,
            lenient_repair: false,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    // Declared clap default, independent of the environment
    fn declared_default(id: &str) -> String {
        let command = Args::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .unwrap_or_else(|| panic!("no argument {id}"));
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    #[test]
    fn test_cli_defaults_match_reference_limits() {
        let defaults = Args::default();
        assert_eq!(declared_default("rate_limit"), defaults.rate_limit.to_string());
        assert_eq!(declared_default("rate_window"), defaults.rate_window.to_string());
        assert_eq!(
            declared_default("max_document_chars"),
            defaults.max_document_chars.to_string()
        );
        assert_eq!(
            declared_default("raw_preview_chars"),
            defaults.raw_preview_chars.to_string()
        );
        assert_eq!(declared_default("max_tokens"), defaults.max_tokens.to_string());

        assert_eq!(defaults.rate_limit, 5);
        assert_eq!(defaults.rate_window(), Duration::from_secs(60));
        assert_eq!(defaults.max_document_chars, 75_000);
        assert_eq!(defaults.raw_preview_chars, 200);
        assert!(!defaults.lenient_repair);
    }

    #[test]
    fn test_zero_rate_window_rejected() {
        assert!(Args::try_parse_from(["disclosure-analyzer", "--rate-window", "0"]).is_err());
        assert!(Args::try_parse_from(["disclosure-analyzer", "--rate-window", "1"]).is_ok());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        assert!(Args::try_parse_from(["disclosure-analyzer", "--rate-limit", "0"]).is_err());
    }

    #[test]
    fn test_sweep_disabled_with_zero() {
        let args = Args {
            rate_sweep_interval: 0,
            ..Args::default()
        };
        assert!(args.sweep_interval().is_none());
        assert_eq!(Args::default().sweep_interval(), Some(Duration::from_secs(300)));
    }
}
