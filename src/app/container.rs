use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::{ConsoleProgress, FFmpegAdapter, FFprobeAdapter, LocalFsAdapter};
use crate::app::run_interactor::RunInteractor;
use crate::ports::{EnginePort, FsPort, NoProgress, ProbePort, ProgressObserver};

pub trait AppContainer: Send + Sync {
    fn run_interactor(&self) -> Arc<RunInteractor>;
}

/// Locations of the external tools
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

pub struct DefaultAppContainer {
    run_interactor: Arc<RunInteractor>,
}

impl DefaultAppContainer {
    /// Wire the process-backed adapters. `show_progress` selects the
    /// console progress bars over the silent observer.
    pub fn new(tools: &ToolPaths, show_progress: bool) -> Self {
        let probe_port = Arc::new(FFprobeAdapter::new(&tools.ffprobe, &tools.ffmpeg));
        let engine_port = Arc::new(FFmpegAdapter::new(&tools.ffmpeg));
        let fs_port = Arc::new(LocalFsAdapter::new());
        let progress: Arc<dyn ProgressObserver> = if show_progress {
            Arc::new(ConsoleProgress::new())
        } else {
            Arc::new(NoProgress)
        };

        let run_interactor = Arc::new(RunInteractor::new(
            probe_port as Arc<dyn ProbePort>,
            engine_port as Arc<dyn EnginePort>,
            fs_port as Arc<dyn FsPort>,
            progress,
        ));

        Self { run_interactor }
    }
}

impl AppContainer for DefaultAppContainer {
    fn run_interactor(&self) -> Arc<RunInteractor> {
        Arc::clone(&self.run_interactor)
    }
}
