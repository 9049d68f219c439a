//! PDF serialization of a laid-out document.
//!
//! A minimal PDF 1.4 writer: one content stream per page, the three standard
//! serif Type1 fonts with WinAnsi encoding, and link annotations for article
//! URLs. Streams are left uncompressed. The writer only serializes the draw
//! commands the layout engine produced; it makes no layout decisions.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use crate::config::Config;
use crate::layout::text::Face;
use crate::layout::{Color, Document, DrawCommand, Page};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
// Font objects: /F1 Times-Roman, /F2 Times-Bold, /F3 Times-Italic.
const FONT_IDS: [usize; 3] = [3, 4, 5];
const FIRST_PAGE_ID: usize = 6;

const FONT_NAMES: [&str; 3] = ["Times-Roman", "Times-Bold", "Times-Italic"];

fn font_tag(face: Face) -> &'static str {
    match face {
        Face::Serif => "F1",
        Face::SerifBold => "F2",
        Face::SerifItalic => "F3",
    }
}

fn num(v: f64) -> String {
    format!("{:.2}", v)
}

/// Map a char to its WinAnsi (CP1252) byte; unmappable glyphs become `?`.
fn winansi_byte(ch: char) -> u8 {
    match ch {
        '\u{20AC}' => 0x80,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        _ => {
            let code = ch as u32;
            if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
                code as u8
            } else {
                b'?'
            }
        }
    }
}

/// Encode a string literal body: WinAnsi bytes with `(`, `)` and `\`
/// escaped and control bytes written as octal escapes.
fn encode_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let b = winansi_byte(ch);
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            0x00..=0x1F => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
            _ => out.push(b),
        }
    }
    out
}

fn push_color(ops: &mut Vec<u8>, color: Color, stroking: bool) {
    let op = if stroking { "RG" } else { "rg" };
    ops.extend_from_slice(format!("{} {} {} {}\n", num(color.r), num(color.g), num(color.b), op).as_bytes());
}

/// Serialize one page's draw commands into a content stream.
fn page_stream(page: &Page) -> Vec<u8> {
    let mut ops: Vec<u8> = Vec::new();
    for cmd in &page.commands {
        match cmd {
            DrawCommand::Rect {
                x,
                y,
                w,
                h,
                fill,
                stroke,
            } => {
                if fill.is_none() && stroke.is_none() {
                    continue;
                }
                ops.extend_from_slice(b"q\n");
                if let Some(color) = fill {
                    push_color(&mut ops, *color, false);
                }
                if let Some((color, width)) = stroke {
                    push_color(&mut ops, *color, true);
                    ops.extend_from_slice(format!("{} w\n", num(*width)).as_bytes());
                }
                ops.extend_from_slice(
                    format!("{} {} {} {} re\n", num(*x), num(*y), num(*w), num(*h)).as_bytes(),
                );
                let paint: &[u8] = match (fill.is_some(), stroke.is_some()) {
                    (true, true) => b"B\n",
                    (true, false) => b"f\n",
                    _ => b"S\n",
                };
                ops.extend_from_slice(paint);
                ops.extend_from_slice(b"Q\n");
            }
            DrawCommand::Text {
                x,
                y,
                content,
                face,
                size,
                color,
            } => {
                ops.extend_from_slice(b"BT\n");
                ops.extend_from_slice(format!("/{} {} Tf\n", font_tag(*face), num(*size)).as_bytes());
                push_color(&mut ops, *color, false);
                ops.extend_from_slice(format!("{} {} Td\n", num(*x), num(*y)).as_bytes());
                ops.extend_from_slice(b"(");
                ops.extend_from_slice(&encode_literal(content));
                ops.extend_from_slice(b") Tj\n");
                ops.extend_from_slice(b"ET\n");
            }
            DrawCommand::Line {
                from,
                to,
                color,
                width,
            } => {
                ops.extend_from_slice(b"q\n");
                push_color(&mut ops, *color, true);
                ops.extend_from_slice(format!("{} w\n", num(*width)).as_bytes());
                ops.extend_from_slice(
                    format!(
                        "{} {} m\n{} {} l\nS\n",
                        num(from.0),
                        num(from.1),
                        num(to.0),
                        num(to.1)
                    )
                    .as_bytes(),
                );
                ops.extend_from_slice(b"Q\n");
            }
            DrawCommand::Link { .. } => {}
        }
    }
    ops
}

struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new(object_count: usize) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        // Binary marker comment so transports treat the file as binary.
        buf.extend_from_slice(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
        Self {
            buf,
            offsets: vec![0; object_count + 1],
        }
    }

    fn object(&mut self, id: usize, body: &str) {
        self.offsets[id] = self.buf.len();
        self.buf
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }

    fn stream_object(&mut self, id: usize, stream: &[u8]) {
        self.offsets[id] = self.buf.len();
        self.buf
            .extend_from_slice(format!("{} 0 obj\n<< /Length {} >>\nstream\n", id, stream.len()).as_bytes());
        self.buf.extend_from_slice(stream);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len();
        self.buf
            .extend_from_slice(format!("xref\n0 {}\n", count).as_bytes());
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets[1..] {
            self.buf
                .extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        self.buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                count, CATALOG_ID, xref_offset
            )
            .as_bytes(),
        );
        self.buf
    }
}

/// Serialize a laid-out document to PDF bytes.
pub fn render_pdf(doc: &Document) -> Vec<u8> {
    struct PagePlan {
        page_id: usize,
        content_id: usize,
        annot_ids: Vec<usize>,
    }

    let mut next_id = FIRST_PAGE_ID;
    let mut plans: Vec<PagePlan> = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let annot_count = page
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Link { .. }))
            .count();
        plans.push(PagePlan {
            page_id: next_id,
            content_id: next_id + 1,
            annot_ids: (next_id + 2..next_id + 2 + annot_count).collect(),
        });
        next_id += 2 + annot_count;
    }
    let object_count = next_id - 1;

    let mut writer = ObjectWriter::new(object_count);
    writer.object(
        CATALOG_ID,
        &format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID),
    );
    let kids = plans
        .iter()
        .map(|p| format!("{} 0 R", p.page_id))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(
        PAGES_ID,
        &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, plans.len()),
    );
    for (id, name) in FONT_IDS.iter().zip(FONT_NAMES.iter()) {
        writer.object(
            *id,
            &format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                name
            ),
        );
    }

    for (page, plan) in doc.pages.iter().zip(plans.iter()) {
        let annots = if plan.annot_ids.is_empty() {
            String::new()
        } else {
            let refs = plan
                .annot_ids
                .iter()
                .map(|id| format!("{} 0 R", id))
                .collect::<Vec<_>>()
                .join(" ");
            format!(" /Annots [{}]", refs)
        };
        writer.object(
            plan.page_id,
            &format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 {} 0 R /F2 {} 0 R /F3 {} 0 R >> >> \
                 /Contents {} 0 R{} >>",
                PAGES_ID,
                num(doc.width),
                num(doc.height),
                FONT_IDS[0],
                FONT_IDS[1],
                FONT_IDS[2],
                plan.content_id,
                annots
            ),
        );
        writer.stream_object(plan.content_id, &page_stream(page));

        let links = page
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Link { rect, url } => Some((rect, url)),
                _ => None,
            });
        for (annot_id, (rect, url)) in plan.annot_ids.iter().zip(links) {
            let mut body = format!(
                "<< /Type /Annot /Subtype /Link /Rect [{} {} {} {}] /Border [0 0 0] \
                 /A << /Type /Action /S /URI /URI (",
                num(rect.0),
                num(rect.1),
                num(rect.2),
                num(rect.3)
            );
            body.push_str(&String::from_utf8_lossy(&encode_literal(url)));
            body.push_str(") >> >>");
            writer.object(*annot_id, &body);
        }
    }

    writer.finish()
}

/// Render and write the newsletter PDF into the output directory.
///
/// The filename carries a UTC timestamp, e.g.
/// `cyber_newsletter-20250606-1200.pdf`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(out_dir = %cfg.out_dir))]
pub async fn write_pdf(
    cfg: &Config,
    doc: &Document,
    now: DateTime<Utc>,
) -> Result<PathBuf, Box<dyn Error>> {
    let filename = now.format("cyber_newsletter-%Y%m%d-%H%M.pdf").to_string();
    let path = Path::new(&cfg.out_dir).join(filename);
    let bytes = render_pdf(doc);
    fs::write(&path, &bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), pages = doc.pages.len(), "Wrote PDF newsletter");
    Ok(path)
}
