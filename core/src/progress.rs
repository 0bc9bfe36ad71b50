use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use dataset::RunSummary;

pub struct RunProgress {
    bar: Option<ProgressBar>,
}

impl RunProgress {
    pub fn new(enabled: bool) -> Result<Self, indicatif::style::TemplateError> {
        if !enabled {
            return Ok(Self { bar: None });
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} [{elapsed_precise}] {msg}")?,
        );
        bar.enable_steady_tick(Duration::from_millis(120));

        Ok(Self { bar: Some(bar) })
    }

    pub fn update(&self, summary: &RunSummary) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!(
                "scanned {} | candidates {} | admitted {}",
                summary.scanned, summary.candidates, summary.admitted
            ));
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
