//! PowerHour compilation library
//!
//! Builds a single video out of a folder of clips: a random subset of
//! sources is sampled, a 60 second window is cut from each with fades and
//! loudness normalization, and the windows are joined with a short common
//! clip between consecutive segments. Media work is delegated to external
//! ffmpeg/ffprobe processes behind the ports in [`ports`].

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::RunInteractor;
pub use domain::errors::DomainError;
pub use domain::model::{RunReport, RunSettings};
