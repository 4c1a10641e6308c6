use async_trait::async_trait;

#[derive(Debug)]
pub enum DocumentExtractionError {
    UnsupportedFormat(String),
    CorruptedFile(String),
    ExtractionFailed(String),
}

impl std::fmt::Display for DocumentExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentExtractionError::UnsupportedFormat(format) => {
                write!(f, "Unsupported format: {}", format)
            }
            DocumentExtractionError::CorruptedFile(msg) => write!(f, "Corrupted file: {}", msg),
            DocumentExtractionError::ExtractionFailed(msg) => {
                write!(f, "Extraction failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for DocumentExtractionError {}

/// Raw cell grid as laid out on the page, header row first.
pub type TableGrid = Vec<Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub number: u32,
    pub text: String,
    pub tables: Vec<TableGrid>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedDocument {
    pub pages: Vec<ExtractedPage>,
    pub info: DocumentInfo,
    /// Per-page failures that did not abort the extraction.
    pub errors: Vec<String>,
}

impl ExtractedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub detect_tables: bool,
    pub max_pages: Option<usize>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            detect_tables: true,
            max_pages: None,
        }
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        data: &[u8],
        options: ExtractionOptions,
    ) -> Result<ExtractedDocument, DocumentExtractionError>;

    fn can_extract(&self, file_name: &str) -> bool;

    fn max_file_size(&self) -> Option<usize>;
}
