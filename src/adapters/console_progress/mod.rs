// Console progress adapter - Renders stage progress bars with indicatif

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::model::ProgressStage;
use crate::ports::ProgressObserver;

const TEMPLATE: &str = "{prefix:>18} |{bar:50}| {percent:>3}% ({pos}/{len})";

/// Progress observer drawing one bar per pipeline stage on stderr
#[derive(Default)]
pub struct ConsoleProgress {
    current: Mutex<Option<(ProgressStage, ProgressBar)>>,
}

impl ConsoleProgress {
    /// Create new console progress observer
    pub fn new() -> Self {
        Self::default()
    }

    fn new_bar(stage: ProgressStage, total: usize) -> ProgressBar {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█-");
        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix(stage.label());
        bar
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, stage: ProgressStage, completed: usize, total: usize) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };

        let same_stage = matches!(current.as_ref(), Some((active, _)) if *active == stage);
        if !same_stage {
            if let Some((_, previous)) = current.take() {
                previous.finish();
            }
            *current = Some((stage, Self::new_bar(stage, total)));
        }

        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(completed as u64);
            if completed >= total {
                bar.finish();
            }
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some((_, bar)) = current.take() {
                bar.finish();
            }
        }
    }
}
