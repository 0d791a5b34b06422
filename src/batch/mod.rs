//! Independent runs of one model in parallel.

use rayon::prelude::*;
use tracing::debug;
use crate::error::Result;
use crate::model::{NetworkModel, RunOutput, RunParameters};
use crate::presynaptic::ReleaseTransfer;


/// Runs every parameter set against the same model on rayon's thread pool,
/// outputs are in the same order as `params`
///
/// Each run owns its state and random stream, so the result of a run does not
/// depend on which other runs share the batch.
pub fn run_batch<R: ReleaseTransfer + Clone>(
    model: &NetworkModel<R>,
    params: &[RunParameters],
) -> Vec<Result<RunOutput>> {
    debug!(runs = params.len(), "starting batch");

    params.par_iter()
        .map(|run_params| model.run(run_params))
        .collect()
}

/// Runs the same parameters for every value of the presynaptic inhibition
/// strength `b`, keeping the weight matrices of `model`
pub fn sweep_release_strength<R: ReleaseTransfer + Clone>(
    model: &NetworkModel<R>,
    params: &RunParameters,
    strengths: &[f64],
) -> Vec<Result<RunOutput>> {
    strengths.par_iter()
        .map(|b| model.with_release_strength(*b)?.run(params))
        .collect()
}
