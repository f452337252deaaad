use indicatif::{ProgressBar, ProgressStyle};

use crate::core::models::Credential;
use crate::core::orchestrator::ProgressObserver;

const TEMPLATE: &str = "{spinner:.cyan} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}";

/// Attempt counter shown while a run is in progress.
pub struct ProbeProgress {
    bar: ProgressBar,
}

impl ProbeProgress {
    pub fn new(total_attempts: usize) -> Self {
        let bar = ProgressBar::new(total_attempts as u64);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    /// Counts attempts without drawing anything.
    pub fn hidden(total_attempts: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_attempts as u64);
        Self { bar }
    }

    pub fn handle(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl ProgressObserver for ProbeProgress {
    fn on_attempt(&self, credential: &Credential) {
        self.bar.inc(1);
        self.bar.set_message(format!("trying {}", credential.username));
    }

    fn on_candidate(&self, credential: &Credential) {
        self.bar.println(format!("candidate: {}", credential));
    }
}
