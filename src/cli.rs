//! Command-line interface definitions.
//!
//! Every knob is a long flag backed by an environment variable with a
//! default, so the tool runs unattended from cron with plain env config and
//! still supports one-off overrides on the command line.

use clap::Parser;

/// Parse the 0/1-style switches the environment surface uses.
///
/// Accepts `1`/`true`/`yes` and `0`/`false`/`no`, case-insensitively.
pub fn parse_switch(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(format!(
            "expected one of 1/0/true/false/yes/no, got '{other}'"
        )),
    }
}

/// Command-line arguments for the newsletter generator.
///
/// # Examples
///
/// ```sh
/// # Generate the PDF and JSON briefing into ./out
/// cyber_newsletter
///
/// # Narrow the window and send the text digest
/// LOOKBACK_HOURS=24 SEND_WHATSAPP_TEXT=1 cyber_newsletter
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of articles to keep in the ranked briefing
    #[arg(long, env = "TOP_N", default_value_t = 10)]
    pub top_n: usize,

    /// Only consider articles published within this many hours
    #[arg(long, env = "LOOKBACK_HOURS", default_value_t = 72)]
    pub lookback_hours: i64,

    /// Character budget for article summaries
    #[arg(long, env = "SUMMARY_MAX_CHARS", default_value_t = 240)]
    pub summary_max_chars: usize,

    /// Cap on the summed keyword score
    #[arg(long, env = "MAX_KEYWORD_SCORE", default_value_t = 80.0)]
    pub max_keyword_score: f64,

    /// Title similarity above which an article counts as a duplicate
    #[arg(long, env = "DUPLICATE_THRESHOLD", default_value_t = 0.93)]
    pub duplicate_threshold: f64,

    /// Attach "why it matters" signals to articles
    #[arg(long, env = "SHOW_SIGNALS", default_value = "1", value_parser = parse_switch, action = clap::ArgAction::Set)]
    pub show_signals: bool,

    /// Output directory for the PDF and JSON briefing
    #[arg(long, env = "OUT_DIR", default_value = "out")]
    pub out_dir: String,

    /// Maximum wrapped link lines on a story card
    #[arg(long, env = "MAX_URL_LINES", default_value_t = 2)]
    pub max_url_lines: usize,

    /// Send the text digest over WhatsApp
    #[arg(long, env = "SEND_WHATSAPP_TEXT", default_value = "0", value_parser = parse_switch, action = clap::ArgAction::Set)]
    pub send_whatsapp_text: bool,

    /// Send the public PDF link over WhatsApp
    #[arg(long, env = "SEND_WHATSAPP_PDF", default_value = "0", value_parser = parse_switch, action = clap::ArgAction::Set)]
    pub send_whatsapp_pdf: bool,

    /// Character limit per outbound message part
    #[arg(long, env = "WHATSAPP_MAX_LEN", default_value_t = 1500)]
    pub whatsapp_max_len: usize,

    /// Twilio account SID (required only when sending)
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,

    /// Twilio auth token (required only when sending)
    #[arg(long, env = "TWILIO_AUTH_TOKEN")]
    pub twilio_auth_token: Option<String>,

    /// Sender address, e.g. whatsapp:+14155238886
    #[arg(long, env = "FROM_WHATSAPP")]
    pub from_whatsapp: Option<String>,

    /// Recipient address, e.g. whatsapp:+15551234567
    #[arg(long, env = "TO_WHATSAPP")]
    pub to_whatsapp: Option<String>,

    /// Public HTTPS folder the published PDF is reachable under
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Path prefix under the public base URL (defaults to the output dir)
    #[arg(long, env = "PUBLIC_PATH_PREFIX")]
    pub public_path_prefix: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["cyber_newsletter"]);
        assert_eq!(cli.top_n, 10);
        assert_eq!(cli.lookback_hours, 72);
        assert_eq!(cli.summary_max_chars, 240);
        assert_eq!(cli.whatsapp_max_len, 1500);
        assert_eq!(cli.out_dir, "out");
        assert!(cli.show_signals);
        assert!(!cli.send_whatsapp_text);
        assert!(!cli.send_whatsapp_pdf);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "cyber_newsletter",
            "--top-n",
            "5",
            "--lookback-hours",
            "24",
            "--show-signals",
            "0",
            "--send-whatsapp-text",
            "yes",
            "--out-dir",
            "/tmp/briefings",
        ]);
        assert_eq!(cli.top_n, 5);
        assert_eq!(cli.lookback_hours, 24);
        assert!(!cli.show_signals);
        assert!(cli.send_whatsapp_text);
        assert_eq!(cli.out_dir, "/tmp/briefings");
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("1"), Ok(true));
        assert_eq!(parse_switch("TRUE"), Ok(true));
        assert_eq!(parse_switch("yes"), Ok(true));
        assert_eq!(parse_switch("0"), Ok(false));
        assert_eq!(parse_switch("False"), Ok(false));
        assert_eq!(parse_switch(" no "), Ok(false));
        assert!(parse_switch("maybe").is_err());
    }
}
