//! Configuration types for a document-pair run and the optional mail stage.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. The collaborator endpoints are plain
//! configuration: pointing at a test webhook or a production one is a matter
//! of passing a different URL.
//!
//! [`MailConfig`] is separate because the notification stage is optional and
//! carries credentials the pipeline itself never needs.

use crate::error::DocPairError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type declared for every uploaded document.
pub const DEFAULT_MEDIA_TYPE: &str = "application/pdf";

/// Configuration for a document-pair run.
///
/// # Example
/// ```rust
/// use edgequake_docpair::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .ocr_url("https://ocr.example.com/upload-pdf/")
///     .analysis_url("https://n8n.example.com/webhook/compare")
///     .ocr_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Endpoint receiving the multipart `file` upload. Required.
    pub ocr_url: String,

    /// Endpoint receiving the `{"documents": [...]}` aggregate. Required.
    pub analysis_url: String,

    /// Per-document OCR call timeout in seconds. Default: 60.
    pub ocr_timeout_secs: u64,

    /// Analysis call timeout in seconds. Default: 60.
    pub analysis_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Media type declared on the multipart part for documents that do not
    /// declare their own. Default: `application/pdf`.
    pub media_type: String,

    /// Issue both OCR calls at once. Default: false.
    ///
    /// Results are tagged with their submission index and re-ordered before
    /// aggregation, so "Document 1" is always the first input.
    pub concurrent_extraction: bool,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ocr_url: String::new(),
            analysis_url: String::new(),
            ocr_timeout_secs: 60,
            analysis_timeout_secs: 60,
            download_timeout_secs: 120,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            concurrent_extraction: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("ocr_url", &self.ocr_url)
            .field("analysis_url", &self.analysis_url)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("media_type", &self.media_type)
            .field("concurrent_extraction", &self.concurrent_extraction)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn ocr_url(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_url = url.into();
        self
    }

    pub fn analysis_url(mut self, url: impl Into<String>) -> Self {
        self.config.analysis_url = url.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn analysis_timeout_secs(mut self, secs: u64) -> Self {
        self.config.analysis_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.config.media_type = media_type.into();
        self
    }

    pub fn concurrent_extraction(mut self, v: bool) -> Self {
        self.config.concurrent_extraction = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocPairError> {
        let c = &self.config;
        validate_endpoint("OCR URL", &c.ocr_url)?;
        validate_endpoint("analysis URL", &c.analysis_url)?;
        if c.ocr_timeout_secs == 0 || c.analysis_timeout_secs == 0 {
            return Err(DocPairError::InvalidConfig(
                "Collaborator timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.media_type.trim().is_empty() {
            return Err(DocPairError::InvalidConfig("Media type must not be empty".into()));
        }
        Ok(self.config)
    }
}

fn validate_endpoint(label: &str, url: &str) -> Result<(), DocPairError> {
    if url.trim().is_empty() {
        return Err(DocPairError::InvalidConfig(format!("{label} is required")));
    }
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(DocPairError::InvalidConfig(format!(
            "{label} must use http or https, got '{}'",
            parsed.scheme()
        ))),
        Err(e) => Err(DocPairError::InvalidConfig(format!(
            "{label} '{url}' is not a valid URL: {e}"
        ))),
    }
}

// ── Mail ─────────────────────────────────────────────────────────────────

/// How the SMTP session is encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MailSecurity {
    /// Plain connection upgraded with STARTTLS (usually port 587). (default)
    #[default]
    StartTls,
    /// TLS from the first byte (usually port 465).
    Implicit,
}

/// Settings for the summary-mail stage.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host. Default: `smtp.gmail.com`.
    pub relay: String,
    /// SMTP port. Default: 587.
    pub port: u16,
    /// Session encryption. Default: STARTTLS.
    pub security: MailSecurity,
    /// Login user for the relay.
    pub username: String,
    /// Login password (or app password) for the relay.
    pub password: String,
    /// `From:` address. Falls back to `username` when `None`.
    pub sender: Option<String>,
    /// SMTP command timeout in seconds. Default: 60.
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay: "smtp.gmail.com".to_string(),
            port: 587,
            security: MailSecurity::default(),
            username: String::new(),
            password: String::new(),
            sender: None,
            timeout_secs: 60,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("relay", &self.relay)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl MailConfig {
    /// Create a config for `username` / `password` on the default relay.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_relay(mut self, relay: impl Into<String>, port: u16) -> Self {
        self.relay = relay.into();
        self.port = port;
        self
    }

    pub fn with_security(mut self, security: MailSecurity) -> Self {
        self.security = security;
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// The address used in `From:`.
    pub fn sender_address(&self) -> &str {
        self.sender.as_deref().unwrap_or(&self.username)
    }
}
