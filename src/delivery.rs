//! WhatsApp delivery through the Twilio Messages API.
//!
//! Credentials and addresses come from configuration and are validated once
//! up front, before anything is sent. Message sends are plain form POSTs
//! with basic auth; WhatsApp media additionally requires a public https URL,
//! so the PDF is referenced by the URL it is published under rather than
//! uploaded directly.

use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::utils::truncate_for_log;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const SEND_TIMEOUT: Duration = Duration::from_secs(30);
/// How much of an API error body is kept when reporting a failure.
const ERROR_BODY_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("missing Twilio settings: {0}")]
    MissingConfig(String),
    #[error("{field} must start with \"whatsapp:\"")]
    BadAddress { field: &'static str },
    #[error("public base URL is not a valid URL: {0}")]
    BadBaseUrl(#[from] url::ParseError),
    #[error("media URL must be public https, got {0}")]
    MediaNotHttps(String),
    #[error("Twilio API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Validated Twilio account settings and WhatsApp addresses.
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub to: String,
}

impl DeliverySettings {
    /// Pull the Twilio settings out of the configuration, reporting every
    /// missing variable at once rather than one per run.
    pub fn from_config(cfg: &Config) -> Result<Self, DeliveryError> {
        let fields = [
            ("TWILIO_ACCOUNT_SID", &cfg.twilio_account_sid),
            ("TWILIO_AUTH_TOKEN", &cfg.twilio_auth_token),
            ("FROM_WHATSAPP", &cfg.from_whatsapp),
            ("TO_WHATSAPP", &cfg.to_whatsapp),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(DeliveryError::MissingConfig(missing.join(", ")));
        }

        let settings = Self {
            account_sid: cfg.twilio_account_sid.clone().unwrap_or_default(),
            auth_token: cfg.twilio_auth_token.clone().unwrap_or_default(),
            from: cfg.from_whatsapp.clone().unwrap_or_default(),
            to: cfg.to_whatsapp.clone().unwrap_or_default(),
        };
        if !settings.from.starts_with("whatsapp:") {
            return Err(DeliveryError::BadAddress {
                field: "FROM_WHATSAPP",
            });
        }
        if !settings.to.starts_with("whatsapp:") {
            return Err(DeliveryError::BadAddress { field: "TO_WHATSAPP" });
        }
        Ok(settings)
    }
}

fn check_media_url(media_url: &str) -> Result<(), DeliveryError> {
    if media_url.starts_with("https://") {
        Ok(())
    } else {
        Err(DeliveryError::MediaNotHttps(media_url.to_string()))
    }
}

/// Twilio message sender bound to one account and one WhatsApp conversation.
#[derive(Debug)]
pub struct MessageClient {
    client: Client,
    settings: DeliverySettings,
}

impl MessageClient {
    pub fn new(settings: DeliverySettings) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }

    /// Send one WhatsApp message, optionally with a media attachment.
    ///
    /// # Arguments
    ///
    /// * `body` - Message text.
    /// * `media_url` - Public https URL of an attachment, if any.
    ///
    /// # Returns
    ///
    /// `Ok(())` once Twilio accepts the message; a [`DeliveryError::Api`]
    /// carrying the truncated response body when it refuses it.
    #[instrument(level = "info", skip_all, fields(media = media_url.is_some()))]
    pub async fn send_message(
        &self,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<(), DeliveryError> {
        if let Some(media) = media_url {
            check_media_url(media)?;
        }

        let endpoint = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE, self.settings.account_sid
        );
        let mut form: Vec<(&str, &str)> = vec![
            ("From", self.settings.from.as_str()),
            ("To", self.settings.to.as_str()),
            ("Body", body),
        ];
        if let Some(media) = media_url {
            form.push(("MediaUrl", media));
        }

        let t0 = Instant::now();
        let response = self
            .client
            .post(&endpoint)
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .form(&form)
            .send()
            .await?;
        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let body = truncate_for_log(&body, ERROR_BODY_LIMIT);
            warn!(status, elapsed_ms = t0.elapsed().as_millis() as u128, "Twilio rejected message");
            return Err(DeliveryError::Api { status, body });
        }
        info!(
            status,
            elapsed_ms = t0.elapsed().as_millis() as u128,
            chars = body.chars().count(),
            "Sent WhatsApp message"
        );
        Ok(())
    }
}

/// Build the public URL a published output file is reachable under.
///
/// Joins `public_base_url`, the optional path prefix, and the file's
/// basename. WhatsApp media must be fetchable by Twilio, so only the URL is
/// assembled here; publishing the file is an external concern.
pub fn public_document_url(cfg: &Config, filename: &str) -> Result<String, DeliveryError> {
    let base = cfg
        .public_base_url
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| DeliveryError::MissingConfig("PUBLIC_BASE_URL".to_string()))?;
    Url::parse(base)?;

    let basename = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let prefix = cfg.public_path_prefix.trim_matches('/');
    let base = base.trim_end_matches('/');
    if prefix.is_empty() {
        Ok(format!("{}/{}", base, basename))
    } else {
        Ok(format!("{}/{}/{}", base, prefix, basename))
    }
}
