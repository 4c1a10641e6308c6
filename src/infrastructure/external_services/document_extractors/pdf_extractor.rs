use async_trait::async_trait;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, ObjectId};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, warn};

use super::layout;
use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, DocumentInfo, ExtractedDocument, ExtractedPage,
    ExtractionOptions,
};

const MAX_PDF_SIZE: usize = 100 * 1024 * 1024;

pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn load(data: &[u8], password: &str) -> Result<Document, DocumentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(password).map_err(|_e| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }

        Ok(doc)
    }

    fn extract_document(
        data: &[u8],
        password: &str,
        options: &ExtractionOptions,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let doc = Self::load(data, password)?;

        let pages: Vec<(u32, ObjectId)> = match options.max_pages {
            Some(max_pages) => doc.get_pages().into_iter().take(max_pages).collect(),
            None => doc.get_pages().into_iter().collect(),
        };

        let mut results: Vec<Result<ExtractedPage, String>> = pages
            .into_par_iter()
            .map(|(page_num, page_id)| Self::extract_page(&doc, page_num, page_id, options))
            .collect();
        results.sort_by_key(|r| match r {
            Ok(page) => page.number,
            Err(_) => u32::MAX,
        });

        let mut document = ExtractedDocument {
            info: Self::document_info(&doc),
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(page) => document.pages.push(page),
                Err(e) => {
                    warn!("{}", e);
                    document.errors.push(e);
                }
            }
        }

        if document.pages.is_empty() && !document.errors.is_empty() {
            return Err(DocumentExtractionError::ExtractionFailed(
                document.errors.join("; "),
            ));
        }

        debug!(
            "Extracted {} pages, {} tables",
            document.page_count(),
            document.table_count()
        );
        Ok(document)
    }

    fn extract_page(
        doc: &Document,
        page_num: u32,
        page_id: ObjectId,
        options: &ExtractionOptions,
    ) -> Result<ExtractedPage, String> {
        let lines = doc
            .get_page_content(page_id)
            .and_then(|bytes| Content::decode(&bytes))
            .map(|content| layout::lines(&layout::text_runs(&content.operations)))
            .map_err(|e| format!("Failed to parse page {}: {}", page_num, e))?;

        let text = match doc.extract_text(&[page_num]) {
            Ok(text) if !text.trim().is_empty() => text
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => layout::plain_text(&lines),
        };

        let tables = if options.detect_tables {
            layout::detect_tables(&lines)
        } else {
            Vec::new()
        };

        Ok(ExtractedPage {
            number: page_num,
            text,
            tables,
        })
    }

    fn document_info(doc: &Document) -> DocumentInfo {
        let Some(info) = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| match o.as_reference() {
                Ok(id) => doc.get_dictionary(id).ok(),
                Err(_) => o.as_dict().ok(),
            })
        else {
            return DocumentInfo::default();
        };

        DocumentInfo {
            title: info_string(info, b"Title"),
            author: info_string(info, b"Author"),
            subject: info_string(info, b"Subject"),
        }
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let value = dict.get(key).ok()?.as_str().ok()?;
    let text = layout::decode_pdf_string(value);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract(
        &self,
        data: &[u8],
        options: ExtractionOptions,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let data = data.to_vec();
        let password = self.password.clone();

        tokio::task::spawn_blocking(move || Self::extract_document(&data, &password, &options))
            .await
            .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?
    }

    fn can_extract(&self, file_name: &str) -> bool {
        std::path::Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    fn max_file_size(&self) -> Option<usize> {
        Some(MAX_PDF_SIZE)
    }
}
