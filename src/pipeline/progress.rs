// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for index builds
// reference: uses indicatif for progress bars and tracks embedding metrics

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub documents_loaded: usize,
    pub documents_enriched: usize,
    pub nodes_created: usize,
    pub leaf_nodes_embedded: usize,
    pub batches_written: usize,
    pub duration_secs: u64,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.leaf_nodes_embedded as f64 / self.duration_secs as f64
    }

    pub fn enrichment_rate(&self) -> f64 {
        if self.documents_loaded == 0 {
            return 0.0;
        }
        (self.documents_enriched as f64 / self.documents_loaded as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    nodes_embedded: Arc<AtomicUsize>,
    batches_written: Arc<AtomicUsize>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_nodes: usize) -> Self {
        Self::with_color(total_nodes, true)
    }

    pub fn with_color(total_nodes: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_nodes as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            nodes_embedded: Arc::new(AtomicUsize::new(0)),
            batches_written: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Hidden tracker for tests and non-interactive runs.
    pub fn hidden() -> Self {
        let tracker = Self::with_color(0, false);
        tracker
            .main_bar
            .set_draw_target(indicatif::ProgressDrawTarget::hidden());
        tracker
            .detail_bar
            .set_draw_target(indicatif::ProgressDrawTarget::hidden());
        tracker
    }

    pub fn inc_batch(&self, nodes: usize) {
        self.nodes_embedded.fetch_add(nodes, Ordering::SeqCst);
        self.batches_written.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(nodes as u64);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Embedding complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn nodes_embedded(&self) -> usize {
        self.nodes_embedded.load(Ordering::SeqCst)
    }

    pub fn batches_written(&self) -> usize {
        self.batches_written.load(Ordering::SeqCst)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Leaf nodes: {} | Batches: {}",
            self.nodes_embedded(),
            self.batches_written()
        );
        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    };

    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
