use std::panic;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, info};

use crate::error::{EsgError, Result};

/// A paginated document: a fixed number of pages, each with extractable text.
/// Page indices are 1-based.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Raw text of page `index`. May be empty or whitespace-only.
    fn page_text(&self, index: u32) -> Result<String>;
}

/// A PDF whose page texts were extracted on open. Dropping it releases the
/// document.
#[derive(Debug)]
pub struct PdfDocument {
    name: String,
    pages: Vec<String>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| EsgError::DocumentAccess {
            path: name.clone(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&name, &bytes)
    }

    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let access = |reason: String| EsgError::DocumentAccess {
            path: name.to_string(),
            reason,
        };

        let doc = Document::load_mem(bytes).map_err(|e| access(e.to_string()))?;
        let decrypted;
        let bytes = if doc.is_encrypted() {
            decrypted = decrypt_with_empty_password(doc).map_err(access)?;
            debug!(document = %name, "Decrypted with empty user password");
            decrypted.as_slice()
        } else {
            bytes
        };

        // pdf-extract panics on some malformed content streams
        let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
            .map_err(|_| access("text extraction aborted on malformed content".into()))?
            .map_err(|e| access(e.to_string()))?;

        info!(document = %name, pages = pages.len(), "Opened document");
        Ok(PdfDocument {
            name: name.to_string(),
            pages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Re-serialize an encrypted PDF in the clear. Only documents readable with
/// an empty user password (owner-password-only protection) succeed.
fn decrypt_with_empty_password(mut doc: Document) -> std::result::Result<Vec<u8>, String> {
    doc.decrypt("")
        .map_err(|e| format!("document is encrypted and needs a password: {}", e))?;
    doc.trailer.remove(b"Encrypt");
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| e.to_string())?;
    Ok(buffer)
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, index: u32) -> Result<String> {
        index
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .cloned()
            .ok_or_else(|| EsgError::DocumentAccess {
                path: self.name.clone(),
                reason: format!("page {} out of range 1..={}", index, self.pages.len()),
            })
    }
}

impl Drop for PdfDocument {
    fn drop(&mut self) {
        debug!(document = %self.name, "Closed document");
    }
}
