//! Output generation: the PDF newsletter, the JSON sidecar, and the
//! plain-text digest used for message delivery.
//!
//! # Submodules
//!
//! - [`pdf`]: Serializes the laid-out document and writes the timestamped
//!   newsletter file
//! - [`json`]: Writes ranked articles with categories to `briefing.json`
//! - [`digest`]: Builds the text digest and chunks it for delivery
//!
//! # Output Structure
//!
//! ```text
//! out_dir/
//! ├── cyber_newsletter-20250606-1200.pdf
//! └── briefing.json
//! ```

pub mod digest;
pub mod json;
pub mod pdf;
