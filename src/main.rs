mod classifier;
mod document;
mod error;
mod observer;
mod pipeline;
mod settings;
mod sink;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use classifier::http::HttpClassifier;
use classifier::label::EsgCategory;
use classifier::{LabelScore, PageClassifier};
use document::{PageSource, PdfDocument};
use observer::{PipelineObserver, TracingObserver};
use pipeline::{ClassificationRecord, DocumentPipeline, RunSummary};
use settings::Settings;

const DEFAULT_LOG_FILTER: &str = "info,lopdf=warn,pdf_extract=warn";

#[derive(Parser)]
#[command(name = "esg_classifier", about = "Classify each page of a PDF by ESG theme")]
struct Cli {
    /// PDF document to classify (`-` reads from stdin)
    input: PathBuf,
    /// Where to write the JSON results
    #[arg(default_value = "classified_esg_results.json")]
    output: PathBuf,
    /// Model id on the inference endpoint (default: nbroad/ESG-BERT)
    #[arg(long)]
    model: Option<String>,
    /// Inference endpoint base URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Settings file (default: ./esg_classifier.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Log ranked labels and the mapped category for every page
    #[arg(long)]
    trace: bool,
}

/// Progress bar over pages, with per-page trace events.
struct ProgressObserver {
    pb: ProgressBar,
    trace: TracingObserver,
}

impl PipelineObserver for ProgressObserver {
    fn labels_ranked(&self, labels: &[LabelScore]) {
        self.pb.suspend(|| self.trace.labels_ranked(labels));
    }

    fn category_mapped(&self, label: &str, category: Option<EsgCategory>) {
        self.pb.suspend(|| self.trace.category_mapped(label, category));
    }

    fn page_skipped(&self, page: u32) {
        self.pb.suspend(|| self.trace.page_skipped(page));
        self.pb.inc(1);
    }

    fn page_classified(&self, record: &ClassificationRecord) {
        self.pb.suspend(|| self.trace.page_classified(record));
        self.pb.inc(1);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            EnvFilter::try_from_default_env().ok(),
            cli.trace,
        )?)
        .init();

    let t0 = Instant::now();

    let settings = Settings::load(cli.config.as_deref())?
        .with_overrides(cli.endpoint, cli.model)?;
    let model = HttpClassifier::new(&settings)?;
    info!(model = %settings.model, url = model.url(), "Using classifier");

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta})",
            )?
            .progress_chars("#>-"),
    );
    let observer = Arc::new(ProgressObserver {
        pb: pb.clone(),
        trace: TracingObserver,
    });
    let pipeline = DocumentPipeline::new(PageClassifier::new(model).with_observer(observer));

    let document = open_document(&cli.input)?;
    let name = document.name().to_string();
    let page_count = document.page_count();
    pb.set_length(page_count as u64);

    let records = pipeline
        .process(document)
        .with_context(|| format!("Failed to classify {}", name))?;
    pb.finish_and_clear();

    sink::persist(&records, &cli.output)?;
    println!("Classified data saved to {}", cli.output.display());
    RunSummary::from_records(page_count, &records).print();

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

/// PDF parser crates log every recovered parse error at info; keep them at
/// warn unless `RUST_LOG` says otherwise. `--trace` always enables this
/// crate's debug events on top.
fn log_filter(from_env: Option<EnvFilter>, trace: bool) -> anyhow::Result<EnvFilter> {
    let filter = from_env.unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    if trace {
        return Ok(filter.add_directive("esg_classifier=debug".parse()?));
    }
    Ok(filter)
}

fn open_document(input: &std::path::Path) -> anyhow::Result<PdfDocument> {
    if input.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read document from stdin")?;
        return Ok(PdfDocument::from_bytes("<stdin>", &bytes)?);
    }
    Ok(PdfDocument::open(input)?)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
