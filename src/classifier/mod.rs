pub mod http;
pub mod label;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EsgError, Result};
use crate::observer::{NoopObserver, PipelineObserver};
use label::{map_label, EsgCategory};

/// Inputs longer than the model window are cut by the model, not by us.
const TRUNCATE: bool = true;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

/// A text-classification model: text in, labels ranked by score (best first) out.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str, truncate: bool) -> Result<Vec<LabelScore>>;
}

/// Single-label ESG classification of one page of text.
///
/// The model is injected once and reused for every page and every run.
pub struct PageClassifier<C> {
    model: C,
    observer: Arc<dyn PipelineObserver>,
}

impl<C: TextClassifier> PageClassifier<C> {
    pub fn new(model: C) -> Self {
        PageClassifier {
            model,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn observer(&self) -> &dyn PipelineObserver {
        self.observer.as_ref()
    }

    /// Classify `text` by the model's top-ranked label only. Scores are not
    /// thresholded. Model failures are returned as-is.
    pub fn classify(&self, text: &str) -> Result<Option<EsgCategory>> {
        let ranked = self.model.classify(text, TRUNCATE)?;
        self.observer.labels_ranked(&ranked);

        let top = ranked
            .first()
            .ok_or_else(|| EsgError::Classification("model returned no labels".into()))?;
        let category = map_label(&top.label);
        self.observer.category_mapped(&top.label, category);
        Ok(category)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test model answering from a closure.
    pub(crate) struct Scripted<F>(F);

    pub(crate) fn scripted<F>(f: F) -> Scripted<F>
    where
        F: Fn(&str, bool) -> Result<Vec<LabelScore>> + Send + Sync,
    {
        Scripted(f)
    }

    impl<F> TextClassifier for Scripted<F>
    where
        F: Fn(&str, bool) -> Result<Vec<LabelScore>> + Send + Sync,
    {
        fn classify(&self, text: &str, truncate: bool) -> Result<Vec<LabelScore>> {
            (self.0)(text, truncate)
        }
    }

    pub(crate) fn ranked(pairs: &[(&str, f32)]) -> Vec<LabelScore> {
        pairs
            .iter()
            .map(|(label, score)| LabelScore {
                label: label.to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn only_top_label_counts() {
        let model = scripted(|_, _| {
            Ok(ranked(&[("Environmental_Policy", 0.91), ("Social_Topic", 0.04)]))
        });
        let classifier = PageClassifier::new(model);
        assert_eq!(
            classifier.classify("emissions fell by 12%").unwrap(),
            Some(EsgCategory::Environment)
        );
    }

    #[test]
    fn low_confidence_top_label_still_wins() {
        let model = scripted(|_, _| Ok(ranked(&[("Board_Governance", 0.02)])));
        let classifier = PageClassifier::new(model);
        assert_eq!(
            classifier.classify("board minutes").unwrap(),
            Some(EsgCategory::Governance)
        );
    }

    #[test]
    fn unmapped_label_is_none() {
        let model = scripted(|_, _| Ok(ranked(&[("Business_Ethics", 0.8)])));
        let classifier = PageClassifier::new(model);
        assert_eq!(classifier.classify("code of conduct").unwrap(), None);
    }

    #[test]
    fn requests_truncation() {
        let model = scripted(|_, truncate| {
            assert!(truncate);
            Ok(ranked(&[("Social", 1.0)]))
        });
        PageClassifier::new(model).classify("x").unwrap();
    }

    #[test]
    fn model_error_propagates() {
        let model = scripted(|_, _| Err(EsgError::Classification("model offline".into())));
        let err = PageClassifier::new(model).classify("text").unwrap_err();
        assert!(matches!(err, EsgError::Classification(msg) if msg == "model offline"));
    }

    #[test]
    fn empty_ranking_is_an_error() {
        let model = scripted(|_, _| Ok(Vec::new()));
        let err = PageClassifier::new(model).classify("text").unwrap_err();
        assert!(matches!(err, EsgError::Classification(_)));
    }

    #[derive(Default)]
    struct Recorder {
        mapped: Mutex<Vec<(String, Option<EsgCategory>)>>,
        ranked_lens: Mutex<Vec<usize>>,
    }

    impl PipelineObserver for Recorder {
        fn labels_ranked(&self, labels: &[LabelScore]) {
            self.ranked_lens.lock().unwrap().push(labels.len());
        }

        fn category_mapped(&self, label: &str, category: Option<EsgCategory>) {
            self.mapped.lock().unwrap().push((label.to_string(), category));
        }
    }

    #[test]
    fn observer_sees_intermediate_results() {
        let recorder = Arc::new(Recorder::default());
        let model = scripted(|_, _| Ok(ranked(&[("Social_Capital", 0.7), ("Other", 0.3)])));
        let classifier = PageClassifier::new(model).with_observer(recorder.clone());
        classifier.classify("community programs").unwrap();

        assert_eq!(*recorder.ranked_lens.lock().unwrap(), vec![2]);
        assert_eq!(
            *recorder.mapped.lock().unwrap(),
            vec![("Social_Capital".to_string(), Some(EsgCategory::Social))]
        );
    }
}
