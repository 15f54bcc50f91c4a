// Application layer - Use case interactors and pipeline stages

pub mod container;
pub mod coordinator;
pub mod planner;
pub mod run_interactor;
pub mod selector;
pub mod sequencer;
pub mod worker_pool;
pub mod workspace;

// Re-export interactors
pub use run_interactor::RunInteractor;
