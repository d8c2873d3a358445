//! Trace hooks for the classification pipeline.
//!
//! Every method has a no-op default so an observer only implements what it
//! watches. Observers see intermediate results but never change them.

use tracing::debug;

use crate::classifier::label::EsgCategory;
use crate::classifier::LabelScore;
use crate::pipeline::ClassificationRecord;

pub trait PipelineObserver: Send + Sync {
    /// Ranked labels returned by the model for one page, best first.
    fn labels_ranked(&self, _labels: &[LabelScore]) {}

    /// Top label and the category it mapped to.
    fn category_mapped(&self, _label: &str, _category: Option<EsgCategory>) {}

    fn page_skipped(&self, _page: u32) {}

    fn page_classified(&self, _record: &ClassificationRecord) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Emits every hook as a `debug` event.
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn labels_ranked(&self, labels: &[LabelScore]) {
        debug!(?labels, "classification result");
    }

    fn category_mapped(&self, label: &str, category: Option<EsgCategory>) {
        debug!(label, category = ?category, "mapped ESG category");
    }

    fn page_skipped(&self, page: u32) {
        debug!(page, "blank page skipped");
    }

    fn page_classified(&self, record: &ClassificationRecord) {
        debug!(
            page = record.page,
            chars = record.content.chars().count(),
            category = ?record.esg_category,
            "page classified"
        );
    }
}
