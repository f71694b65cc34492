//! PDF text extraction

use std::path::Path;

use lopdf::Document;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Turns a PDF file into its page texts, in page order.
pub trait PdfExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Extractor backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let document = Document::load(path).map_err(|e| Error::Extraction(e.to_string()))?;

        // get_pages is keyed by page number, so iteration is already in order
        let mut pages = Vec::new();
        for &number in document.get_pages().keys() {
            let text = document
                .extract_text(&[number])
                .map_err(|e| Error::Extraction(format!("page {number}: {e}")))?;
            pages.push(clean_page(&text));
        }
        debug!(pages = pages.len(), "extracted pdf text");
        Ok(pages)
    }
}

/// NFC-normalises page text and strips the line breaks lopdf puts around
/// each text block.
fn clean_page(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::fs;
    use tempfile::tempdir;

    /// Writes a PDF with one line of Courier text per page.
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_extracts_pages_in_order_without_edge_whitespace() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sky.pdf");
        write_pdf(&path, &["The sky is blue.", "Grass is green."]);

        let pages = LopdfExtractor.extract_pages(&path)?;
        assert_eq!(pages, vec!["The sky is blue.", "Grass is green."]);
        Ok(())
    }

    #[test]
    fn test_clean_page_normalises_and_trims() {
        // "e" followed by a combining acute accent composes to "é"
        assert_eq!(clean_page("\ncafe\u{301} au lait\n"), "caf\u{e9} au lait");
        assert_eq!(clean_page(" \n\t"), "");
    }

    #[test]
    fn test_garbage_bytes_are_an_extraction_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("upload.pdf");
        fs::write(&path, b"this is definitely not a pdf")?;

        let result = LopdfExtractor.extract_pages(&path);
        assert!(matches!(result, Err(Error::Extraction(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_extraction_error() -> Result<()> {
        let dir = tempdir()?;
        let result = LopdfExtractor.extract_pages(&dir.path().join("gone.pdf"));
        assert!(matches!(result, Err(Error::Extraction(_))));
        Ok(())
    }
}
