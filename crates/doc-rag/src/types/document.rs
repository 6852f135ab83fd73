//! Document, segment and chunk types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from content, falling back to the filename extension
    pub fn detect(filename: &str, data: &[u8]) -> Self {
        if data.starts_with(b"%PDF-") {
            return Self::Pdf;
        }
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("");
        Self::from_extension(extension)
    }
}

/// One page or section of extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based page (or section) number
    pub number: u32,
    /// Extracted text
    pub text: String,
}

impl Segment {
    /// Create a segment
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An uploaded document with its extracted text
///
/// Only lives for the duration of an upload; the index keeps chunks, not documents.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original filename
    pub filename: String,
    /// Detected file type
    pub file_type: FileType,
    /// SHA-256 of the raw bytes (hex)
    pub content_hash: String,
    /// Size of the raw payload
    pub size_bytes: u64,
    /// Ordered extracted segments
    pub segments: Vec<Segment>,
}

impl Document {
    /// Create a document record from its raw bytes and extracted segments
    pub fn new(filename: impl Into<String>, data: &[u8], segments: Vec<Segment>) -> Self {
        let filename = filename.into();
        Self {
            file_type: FileType::detect(&filename, data),
            filename,
            content_hash: hash_bytes(data),
            size_bytes: data.len() as u64,
            segments,
        }
    }

    /// Total extracted characters across segments
    pub fn char_len(&self) -> usize {
        self.segments.iter().map(Segment::char_len).sum()
    }
}

/// A bounded passage of a segment, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the document-wide chunk sequence
    pub index: u32,
    /// Page/section number of the segment this chunk came from
    pub segment: u32,
    /// Character offset of the chunk within its segment
    pub char_offset: usize,
    /// Chunk text
    pub text: String,
}

/// Hex SHA-256 of arbitrary bytes
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_magic_bytes() {
        assert_eq!(FileType::detect("upload.bin", b"%PDF-1.7\n..."), FileType::Pdf);
        assert_eq!(FileType::detect("notes.md", b"# Title"), FileType::Markdown);
        assert_eq!(FileType::detect("notes.TXT", b"hello"), FileType::Txt);
        assert_eq!(FileType::detect("archive.zip", b"PK"), FileType::Unknown);
        assert_eq!(FileType::detect("noextension", b"hello"), FileType::Unknown);
    }

    #[test]
    fn test_document_hash_is_stable() {
        let a = Document::new("a.txt", b"same bytes", vec![Segment::new(1, "same bytes")]);
        let b = Document::new("b.txt", b"same bytes", vec![Segment::new(1, "same bytes")]);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        let segment = Segment::new(1, "héllo");
        assert_eq!(segment.char_len(), 5);
    }
}
