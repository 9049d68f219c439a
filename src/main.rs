//! # Cyber Newsletter
//!
//! An RSS/Atom aggregation pipeline that pulls cybersecurity news from
//! curated feeds, scores each item for risk, removes near-duplicate
//! coverage, and renders the top stories as a landscape PDF briefing with a
//! plain-text digest and optional WhatsApp delivery.
//!
//! ## Features
//!
//! - Fetches 15 curated security feeds concurrently (RSS 2.0 and Atom)
//! - Scores items by weighted keywords, source trust, and recency
//! - De-duplicates by canonical link and near-identical titles
//! - Two-column landscape PDF with threat-category sections and a sidebar
//!   index, plus a `briefing.json` sidecar for automation
//! - Optional WhatsApp delivery of the chunked text digest and the PDF link
//!   via Twilio
//!
//! ## Usage
//!
//! ```sh
//! cyber_newsletter --top-n 10 --lookback-hours 72 --out-dir ./out
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetch**: Download and parse every configured feed (4 at a time)
//! 2. **Rank**: Normalize, de-duplicate, score, and keep the top N
//! 3. **Classify**: Assign each ranked article a threat category
//! 4. **Render**: Lay out the newsletter and write the PDF and JSON sidecar
//! 5. **Deliver**: Optionally send the digest and PDF link over WhatsApp

use chrono::{DateTime, Utc};
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classify;
mod cli;
mod config;
mod dedup;
mod delivery;
mod feeds;
mod layout;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod scoring;
mod utils;

use cli::Cli;
use config::Config;
use delivery::{DeliveryError, DeliverySettings, MessageClient, public_document_url};
use layout::text::SerifMetrics;
use models::Article;
use outputs::digest::{build_text_digest, chunk_text, prefix_parts};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("cyber_newsletter starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.top_n, ?args.lookback_hours, ?args.out_dir, "Parsed CLI arguments");
    let cfg = Config::from_cli(&args);

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&cfg.out_dir).await {
        error!(
            path = %cfg.out_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Fetch and rank ----
    let now = Utc::now();
    let batches = feeds::fetch_all(&cfg).await?;
    let articles = pipeline::rank(&cfg, now, batches);
    info!(
        count = articles.len(),
        top_n = cfg.top_n,
        lookback_hours = cfg.lookback_hours,
        "Collected and ranked articles"
    );

    let classified = classify::classify_ranked(&articles);

    // ---- Render outputs ----
    let document = layout::engine::render_document(&cfg, &SerifMetrics, now, &articles, &classified);
    let pdf_path = outputs::pdf::write_pdf(&cfg, &document, now).await?;

    if let Err(e) = outputs::json::write_briefing(&cfg, now, &articles, &classified).await {
        error!(error = %e, "Failed to write briefing JSON");
    }

    // ---- Optional WhatsApp delivery ----
    if cfg.send_whatsapp_text || cfg.send_whatsapp_pdf {
        if let Err(e) = deliver(&cfg, now, &articles).await {
            error!(error = %e, "WhatsApp delivery failed");
            return Err(e.into());
        }
    } else {
        info!("Not sending via WhatsApp; set SEND_WHATSAPP_TEXT=1 and/or SEND_WHATSAPP_PDF=1");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        pdf = %pdf_path.display(),
        "Execution complete"
    );

    Ok(())
}

/// Send the enabled WhatsApp messages: the chunked text digest and/or the
/// public PDF link with a caption.
async fn deliver(
    cfg: &Config,
    now: DateTime<Utc>,
    articles: &[Article],
) -> Result<(), DeliveryError> {
    let settings = DeliverySettings::from_config(cfg)?;
    let client = MessageClient::new(settings)?;

    if cfg.send_whatsapp_text {
        let digest = build_text_digest(cfg, now, articles);
        let parts = prefix_parts(chunk_text(&digest, cfg.whatsapp_max_len));
        let total = parts.len();
        for (i, part) in parts.iter().enumerate() {
            client.send_message(part, None).await?;
            debug!(part = i + 1, total, "Sent digest part");
            sleep(Duration::from_secs(1)).await;
        }
        info!(parts = total, "WhatsApp text digest sent");
    }

    if cfg.send_whatsapp_pdf {
        // WhatsApp media must be a public https URL; the published copy
        // is expected at latest.pdf regardless of the local filename.
        let public_pdf_url = public_document_url(cfg, "latest.pdf")?;
        let caption = format!(
            "Cybersecurity Briefing • Top {} • {}h\n{}",
            cfg.top_n, cfg.lookback_hours, public_pdf_url
        );
        client.send_message(&caption, Some(&public_pdf_url)).await?;
        info!(url = %public_pdf_url, "WhatsApp PDF sent");
    }

    Ok(())
}
