//! Default parameter set of the microcircuit.
//!
//! Every experiment starts from [`get_default_params`] and overrides what it
//! needs, either programmatically or from a TOML file (see [`crate::config`]).

use crate::model::{ModelOptions, NetworkConfig};
use crate::population::{Population, PopulationTable, CANONICAL_PROJECTIONS};
use crate::weights::{ConnectionProbabilities, MeanWeights};


/// Default mean weight magnitude of each entry of [`CANONICAL_PROJECTIONS`]
/// (NS, DS, DN, SE, NN, PS, PN, PP, PE, EP, DE, VS, SV)
pub const DEFAULT_WEIGHTS: [f64; 13] = [0.7, 0.5, 0.4, 0.8, 0.2, 0.8, 0.2, 0.1, 1.0, 0.5, 0., 0.5, 0.5];

/// Default connection probability of each entry of [`CANONICAL_PROJECTIONS`]
pub const DEFAULT_CONNECTION_PROBABILITIES: [f64; 13] = [
    0.5, 0.55, 0.5, 0.35, 0.5, 0.6, 0.3, 0.5, 0.7, 0.6, 0.1, 0.5, 0.5,
];

/// Units per population of the spatially resolved network
pub fn default_cell_count(population: Population) -> usize {
    match population {
        Population::Soma | Population::Dendrite => 70,
        _ => 10,
    }
}

/// Default rate time constant of a population (ms)
pub fn default_time_constant(population: Population) -> f64 {
    match population {
        Population::Soma | Population::Pv | Population::Vip => 10.,
        Population::Dendrite | Population::Som | Population::Ndnf => 20.,
    }
}

/// Background input that holds the default mean-population network close to a
/// rate of `1.` everywhere
pub fn default_background(population: Population) -> f64 {
    match population {
        Population::Soma => 0.5,
        Population::Dendrite => 1.67,
        Population::Som => 0.2,
        Population::Ndnf => 1.9,
        Population::Pv => 1.1,
        Population::Vip => 0.,
    }
}

/// Default mean weights
pub fn default_weights() -> MeanWeights {
    let mut weights = MeanWeights::default();
    for (projection, value) in CANONICAL_PROJECTIONS.into_iter().zip(DEFAULT_WEIGHTS) {
        weights.set(projection, value);
    }

    weights
}

/// Default connection probabilities
pub fn default_connection_probabilities() -> ConnectionProbabilities {
    let mut probabilities = ConnectionProbabilities::default();
    for (projection, value) in CANONICAL_PROJECTIONS.into_iter().zip(DEFAULT_CONNECTION_PROBABILITIES) {
        probabilities.set(projection, value);
    }

    probabilities
}

/// Default target rate of every population used for calibration
pub fn default_targets() -> PopulationTable<f64> {
    PopulationTable::filled(1.)
}

/// Default network configuration
///
/// - `mean_population` : use one unit per population instead of the spatially
/// resolved cell counts
pub fn get_default_params(mean_population: bool) -> NetworkConfig {
    let cell_counts = PopulationTable::from_fn(|population| {
        if mean_population { 1 } else { default_cell_count(population) }
    });

    NetworkConfig {
        cell_counts,
        mean_weights: default_weights(),
        connection_probabilities: default_connection_probabilities(),
        time_constants: PopulationTable::from_fn(default_time_constant),
        background: PopulationTable::from_fn(default_background),
        options: ModelOptions::default(),
    }
}
