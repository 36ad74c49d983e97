//! Process-wide configuration for the extraction service.
//!
//! Everything the server reads from the environment (credentials, provider
//! endpoints, timeouts, the pdfium location) lives in one immutable
//! [`ServerConfig`] built once at startup and shared as `Arc<ServerConfig>`.
//! Request handlers only ever read it, so there is no global mutable state
//! to reason about.
//!
//! Request-supplied API keys never touch this struct: they override the
//! configured credential for that single request in
//! [`crate::pipeline::ai::clean_with_ai`].

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Default Gemini REST endpoint root.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default Groq OpenAI-compatible endpoint root.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default SambaNova OpenAI-compatible endpoint root.
pub const SAMBANOVA_BASE_URL: &str = "https://api.sambanova.ai/v1";

/// Configuration for the HTTP service and its collaborators.
///
/// Built via [`ServerConfig::builder()`], [`ServerConfig::from_env()`] or
/// [`ServerConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf_extract::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .port(9000)
///     .ai_timeout_secs(30)
///     .gemini_api_key("test-key")
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Interface to bind. Default: `0.0.0.0`.
    pub host: IpAddr,

    /// TCP port. Default: 8000.
    pub port: u16,

    /// Path to `libpdfium` (file) or to the directory holding it.
    ///
    /// When `None`, the working directory and then the system library
    /// search path are tried.
    pub pdfium_library_path: Option<PathBuf>,

    /// Server-side Gemini key (`GEMINI_API_KEY`).
    pub gemini_api_key: Option<String>,
    /// Server-side Groq key (`GROQ_API_KEY`).
    pub groq_api_key: Option<String>,
    /// Server-side SambaNova key (`SAMBANOVA_API_KEY`).
    pub sambanova_api_key: Option<String>,

    /// Gemini model id. Default: `gemini-2.0-flash`.
    pub gemini_model: String,
    /// Groq model id. Default: `llama-3.3-70b-versatile`.
    pub groq_model: String,
    /// SambaNova model id. Default: `Meta-Llama-3.3-70B-Instruct`.
    pub sambanova_model: String,

    pub gemini_base_url: String,
    pub groq_base_url: String,
    pub sambanova_base_url: String,

    /// Sampling temperature for every provider. Default: 0.3.
    pub temperature: f32,

    /// `maxOutputTokens` sent to Gemini. Default: 65536.
    pub gemini_max_output_tokens: u32,

    /// `max_tokens` sent to chat-completions providers. Default: 8192.
    ///
    /// Groq and SambaNova cap completions far below Gemini; asking for more
    /// gets the request rejected outright.
    pub chat_max_tokens: u32,

    /// Ceiling on a single AI provider call, in seconds. Default: 120.
    ///
    /// A whole-document cleanup of a 50-page datasheet routinely takes
    /// 30–60 s on Gemini Flash. Past the ceiling the call counts as failed
    /// and the raw text is returned instead.
    pub ai_timeout_secs: u64,

    /// Largest accepted request body in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Run the pattern cleaner over successful AI output. Default: true.
    ///
    /// Models still wrap answers in code fences or echo running headers;
    /// the cleaner strips both.
    pub postprocess_ai_output: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            pdfium_library_path: None,
            gemini_api_key: None,
            groq_api_key: None,
            sambanova_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            groq_model: "llama-3.3-70b-versatile".to_string(),
            sambanova_model: "Meta-Llama-3.3-70B-Instruct".to_string(),
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            groq_base_url: GROQ_BASE_URL.to_string(),
            sambanova_base_url: SAMBANOVA_BASE_URL.to_string(),
            temperature: 0.3,
            gemini_max_output_tokens: 65_536,
            chat_max_tokens: 8192,
            ai_timeout_secs: 120,
            max_upload_bytes: 50 * 1024 * 1024,
            postprocess_ai_output: true,
        }
    }
}

fn redact(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("sambanova_api_key", &redact(&self.sambanova_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("groq_model", &self.groq_model)
            .field("sambanova_model", &self.sambanova_model)
            .field("temperature", &self.temperature)
            .field("ai_timeout_secs", &self.ai_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("postprocess_ai_output", &self.postprocess_ai_output)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Recognised variables: `HOST`, `PORT`, `PDFIUM_LIB_PATH`,
    /// `GEMINI_API_KEY`, `GROQ_API_KEY`, `SAMBANOVA_API_KEY`,
    /// `AI_TIMEOUT_SECS`. Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, ExtractError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ServerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ExtractError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(host) = get("HOST") {
            let ip = host.parse::<IpAddr>().map_err(|_| {
                ExtractError::Internal(format!("HOST is not an IP address: {host:?}"))
            })?;
            builder = builder.host(ip);
        }
        if let Some(port) = get("PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|_| ExtractError::Internal(format!("PORT is not a port: {port:?}")))?;
            builder = builder.port(port);
        }
        if let Some(path) = get("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_library_path(path);
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            builder = builder.gemini_api_key(key);
        }
        if let Some(key) = get("GROQ_API_KEY") {
            builder = builder.groq_api_key(key);
        }
        if let Some(key) = get("SAMBANOVA_API_KEY") {
            builder = builder.sambanova_api_key(key);
        }
        if let Some(secs) = get("AI_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                ExtractError::Internal(format!("AI_TIMEOUT_SECS is not a number: {secs:?}"))
            })?;
            builder = builder.ai_timeout_secs(secs);
        }

        builder.build()
    }

    /// The socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The server-side credential for `model`, if one was configured.
    pub fn credential_for(&self, model: AiModel) -> Option<&str> {
        match model {
            AiModel::Gemini => self.gemini_api_key.as_deref(),
            AiModel::Groq => self.groq_api_key.as_deref(),
            AiModel::SambaNova => self.sambanova_api_key.as_deref(),
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: IpAddr) -> Self {
        self.config.host = host;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn groq_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.groq_api_key = Some(key.into());
        self
    }

    pub fn sambanova_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.sambanova_api_key = Some(key.into());
        self
    }

    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini_model = model.into();
        self
    }

    pub fn groq_model(mut self, model: impl Into<String>) -> Self {
        self.config.groq_model = model.into();
        self
    }

    pub fn sambanova_model(mut self, model: impl Into<String>) -> Self {
        self.config.sambanova_model = model.into();
        self
    }

    /// Point a provider at a different endpoint root (proxies, tests).
    pub fn base_url(mut self, model: AiModel, url: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        match model {
            AiModel::Gemini => self.config.gemini_base_url = url,
            AiModel::Groq => self.config.groq_base_url = url,
            AiModel::SambaNova => self.config.sambanova_base_url = url,
        }
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn gemini_max_output_tokens(mut self, n: u32) -> Self {
        self.config.gemini_max_output_tokens = n.max(1);
        self
    }

    pub fn chat_max_tokens(mut self, n: u32) -> Self {
        self.config.chat_max_tokens = n.max(1);
        self
    }

    pub fn ai_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ai_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn postprocess_ai_output(mut self, v: bool) -> Self {
        self.config.postprocess_ai_output = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, ExtractError> {
        let c = &self.config;
        if c.ai_timeout_secs == 0 {
            return Err(ExtractError::Internal(
                "AI timeout must be at least 1 second".into(),
            ));
        }
        if c.max_upload_bytes < 1024 {
            return Err(ExtractError::Internal(format!(
                "Upload limit must be ≥ 1024 bytes, got {}",
                c.max_upload_bytes
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The AI provider a cleaning request is routed to.
///
/// Groq and SambaNova speak the OpenAI chat-completions dialect and share a
/// client; Gemini has its own request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiModel {
    /// Google Gemini. (default)
    #[default]
    Gemini,
    /// Groq-hosted Llama.
    Groq,
    /// SambaNova-hosted Llama.
    SambaNova,
}

impl AiModel {
    pub const ALL: [AiModel; 3] = [AiModel::Gemini, AiModel::Groq, AiModel::SambaNova];

    /// Wire name, as accepted in the `model` form field and echoed in `model_used`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::Gemini => "gemini",
            AiModel::Groq => "groq",
            AiModel::SambaNova => "sambanova",
        }
    }

    /// Human-facing provider name for diagnostics.
    pub fn display_name(&self) -> &'static str {
        match self {
            AiModel::Gemini => "Gemini",
            AiModel::Groq => "Groq",
            AiModel::SambaNova => "SambaNova",
        }
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiModel {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(AiModel::Gemini),
            "groq" => Ok(AiModel::Groq),
            "sambanova" => Ok(AiModel::SambaNova),
            other => Err(ExtractError::Validation(format!(
                "Model must be 'gemini', 'groq', or 'sambanova' (got {other:?})"
            ))),
        }
    }
}
