use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the scenarios in a batch.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(scenario_count: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(scenario_count as u64);
        match ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} [{elapsed_precise}] {msg}",
        ) {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Falling back to the default progress style: {e}"),
        }
        Self { bar }
    }

    pub fn start_scenario(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    pub fn finish_scenario(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
