//! Document text extraction

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::types::{FileType, Segment};

/// Trait for turning raw document bytes into ordered text segments
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Extract page- or section-granular text
    ///
    /// Fails with [`Error::UnreadableDocument`] when the bytes are not a
    /// parseable document or carry no text.
    async fn parse(&self, filename: &str, data: &[u8]) -> Result<Vec<Segment>>;

    /// Get parser name for logging
    fn name(&self) -> &str;
}

/// Local parser for PDF and plain text uploads
pub struct FileParser {
    timeout: Duration,
}

impl FileParser {
    /// Create a parser with a bound on extraction time
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Parse synchronously; CPU-bound, call from a blocking context
    pub fn parse_blocking(filename: &str, data: &[u8]) -> Result<Vec<Segment>> {
        if data.is_empty() {
            return Err(Error::unreadable(filename, "empty upload"));
        }

        match FileType::detect(filename, data) {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data),
            FileType::Unknown => {
                let extension = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
                Err(Error::unreadable(
                    filename,
                    format!("unsupported file type '{}'; upload a PDF or text file", extension),
                ))
            }
        }
    }

    /// Parse PDF document page by page
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<Vec<Segment>> {
        let pages = match pdf_extract::extract_text_from_mem_by_pages(data) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!("pdf-extract failed on '{}': {}, trying lopdf", filename, e);
                Self::extract_pdf_pages_fallback(filename, data)?
            }
        };

        let segments = pages_to_segments(pages);
        if segments.is_empty() {
            return Err(Error::unreadable(
                filename,
                "no text could be extracted; the PDF may be scanned or image-only",
            ));
        }
        Ok(segments)
    }

    /// Fallback PDF extraction using lopdf directly
    fn extract_pdf_pages_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::unreadable(filename, format!("failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("Could not extract page {}: {}", page_number, e);
                    pages.push(String::new());
                }
            }
        }
        Ok(pages)
    }

    /// Parse a UTF-8 text or markdown file as one segment
    fn parse_text(filename: &str, data: &[u8]) -> Result<Vec<Segment>> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::unreadable(filename, format!("not valid UTF-8: {}", e)))?;

        if text.trim().is_empty() {
            return Err(Error::unreadable(filename, "document contains no text"));
        }
        Ok(vec![Segment::new(1, text)])
    }
}

#[async_trait]
impl DocumentParser for FileParser {
    async fn parse(&self, filename: &str, data: &[u8]) -> Result<Vec<Segment>> {
        let start = Instant::now();
        let owned_name = filename.to_string();
        let owned_data = data.to_vec();

        let task = tokio::task::spawn_blocking(move || {
            FileParser::parse_blocking(&owned_name, &owned_data)
        });

        let segments = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => {
                // pdf-extract panics on some malformed fonts
                return Err(Error::unreadable(filename, format!("parser crashed: {}", e)));
            }
            Err(_) => {
                return Err(Error::unreadable(
                    filename,
                    format!("text extraction timed out after {}s", self.timeout.as_secs()),
                ));
            }
        };

        tracing::info!(
            "{:09.3} seconds taken to parse '{}' ({} segments)",
            start.elapsed().as_secs_f64(),
            filename,
            segments.len()
        );
        Ok(segments)
    }

    fn name(&self) -> &str {
        "local-file"
    }
}

/// Number non-empty pages from 1, keeping original page numbers
fn pages_to_segments(pages: Vec<String>) -> Vec<Segment> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = cleanup_pdf_text(&raw);
            (!text.is_empty()).then(|| Segment::new(i as u32 + 1, text))
        })
        .collect()
}

/// Fold typographic characters to ASCII and drop blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let folded = text
        .replace('\0', "")
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    folded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
