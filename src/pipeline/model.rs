use anyhow::{Context, Result};
use ort::execution_providers;
use ort::session::builder::GraphOptimizationLevel;
use std::path::Path;
use tracing::debug;

pub use ort::session::Session;

pub fn init_runtime() -> Result<()> {
    ort::init()
        .with_execution_providers([execution_providers::XNNPACKExecutionProvider::default().build()])
        .commit()?;

    Ok(())
}

pub fn initialize_model(model_dir: &Path, filename: &str, threads: usize) -> Result<Session> {
    let path = model_dir.join(filename);
    debug!("Loading model {path:?} with {threads} threads");

    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_parallel_execution(true)?
        .with_inter_threads(threads.max(1))?
        .commit_from_file(&path)
        .with_context(|| format!("failed to load model {path:?}"))?;

    Ok(model)
}
