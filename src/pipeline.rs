use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::label::EsgCategory;
use crate::classifier::{PageClassifier, TextClassifier};
use crate::document::PageSource;
use crate::error::{EsgError, Result};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// One classified page. Field order is the output key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub page: u32,
    pub content: String,
    pub esg_category: Option<EsgCategory>,
}

/// Drives extraction and classification over a whole document.
pub struct DocumentPipeline<C> {
    classifier: PageClassifier<C>,
}

impl<C: TextClassifier> DocumentPipeline<C> {
    pub fn new(classifier: PageClassifier<C>) -> Self {
        DocumentPipeline { classifier }
    }

    /// Classify every non-blank page of `document`, in page order.
    ///
    /// Blank pages leave a gap in the page numbers. The first page that
    /// fails to extract or classify aborts the run. The document is
    /// released when this returns, on success or failure.
    #[cfg(not(feature = "rayon"))]
    pub fn process<D: PageSource>(&self, document: D) -> Result<Vec<ClassificationRecord>> {
        let page_count = document.page_count();
        let mut records = Vec::new();

        for page in 1..=page_count {
            let text = document.page_text(page)?;
            if text.trim().is_empty() {
                self.classifier.observer().page_skipped(page);
                continue;
            }
            let record = self.classify_page(page, text)?;
            self.classifier.observer().page_classified(&record);
            records.push(record);
        }

        info!(pages = page_count, records = records.len(), "Document processed");
        Ok(records)
    }

    /// Classify every non-blank page of `document`, in page order.
    ///
    /// Text is extracted sequentially; classification runs on the rayon pool
    /// and results are collected back in page order.
    #[cfg(feature = "rayon")]
    pub fn process<D: PageSource>(&self, document: D) -> Result<Vec<ClassificationRecord>> {
        let page_count = document.page_count();
        let mut pages = Vec::new();

        for page in 1..=page_count {
            let text = document.page_text(page)?;
            if text.trim().is_empty() {
                self.classifier.observer().page_skipped(page);
            } else {
                pages.push((page, text));
            }
        }
        drop(document);

        let records = pages
            .into_par_iter()
            .map(|(page, text)| {
                let record = self.classify_page(page, text)?;
                self.classifier.observer().page_classified(&record);
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(pages = page_count, records = records.len(), "Document processed");
        Ok(records)
    }

    fn classify_page(&self, page: u32, text: String) -> Result<ClassificationRecord> {
        let esg_category = self.classifier.classify(&text).map_err(|e| match e {
            EsgError::Classification(reason) => {
                EsgError::Classification(format!("page {}: {}", page, reason))
            }
            other => other,
        })?;
        Ok(ClassificationRecord {
            page,
            content: text,
            esg_category,
        })
    }
}

/// Per-run counts for the closing report.
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub pages: u32,
    pub skipped: u32,
    pub environment: usize,
    pub social: usize,
    pub governance: usize,
    pub unclassified: usize,
}

impl RunSummary {
    pub fn from_records(page_count: u32, records: &[ClassificationRecord]) -> Self {
        let mut summary = RunSummary {
            pages: page_count,
            skipped: page_count.saturating_sub(records.len() as u32),
            ..Default::default()
        };
        for record in records {
            match record.esg_category {
                Some(EsgCategory::Environment) => summary.environment += 1,
                Some(EsgCategory::Social) => summary.social += 1,
                Some(EsgCategory::Governance) => summary.governance += 1,
                None => summary.unclassified += 1,
            }
        }
        summary
    }

    pub fn print(&self) {
        println!(
            "{} pages ({} blank skipped): {} environment, {} social, {} governance, {} unclassified.",
            self.pages,
            self.skipped,
            self.environment,
            self.social,
            self.governance,
            self.unclassified,
        );
    }
}
