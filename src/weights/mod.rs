//! Expansion of scalar mean weights into per-synapse weight matrices.
//!
//! Every projection with a non-zero mean weight gets a dense
//! `(target_units × source_units)` matrix. Homogeneous matrices repeat the
//! mean weight, heterogeneous ones perturb each entry multiplicatively and
//! mask it with Bernoulli connectivity, rescaled so the expected matrix mean
//! stays at the requested weight.

use ndarray::{Array1, Array2};
use rand::{Rng, distributions::{Distribution, Uniform}};
use tracing::{debug, warn};
use crate::error::ConfigurationError;
use crate::population::{
    Population, PopulationTable, Projection, ProjectionTable, CANONICAL_PROJECTIONS,
};


/// Mean weight magnitude per projection, unset projections are `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeanWeights {
    weights: ProjectionTable<Option<f64>>,
}

impl MeanWeights {
    /// Builds mean weights from two letter projection keys such as `("DS", 0.5)`
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Result<Self, ConfigurationError> {
        let mut weights = MeanWeights::default();
        for (key, value) in pairs {
            weights.set(key.parse()?, *value);
        }

        Ok(weights)
    }

    /// Sets the mean weight of a projection
    pub fn set(&mut self, projection: Projection, value: f64) {
        self.weights[projection] = Some(value);
    }

    /// Returns a copy with the given projection changed
    pub fn with(mut self, projection: Projection, value: f64) -> Self {
        self.set(projection, value);
        self
    }

    /// Mean weight of a projection if it was set
    pub fn get(&self, projection: Projection) -> Option<f64> {
        self.weights[projection]
    }

    /// Mean weight of a projection, treating unset projections as absent (`0.`)
    pub fn value(&self, projection: Projection) -> f64 {
        self.weights[projection].unwrap_or(0.)
    }

    /// Iterates over every projection that has a mean weight
    pub fn iter(&self) -> impl Iterator<Item = (Projection, f64)> + '_ {
        self.weights.iter()
            .filter_map(|(projection, value)| value.map(|value| (projection, value)))
    }

    /// Checks that every canonical projection between present populations is set,
    /// that no weight is negative and that the dendrite is never a source
    pub fn validate(&self, present: &PopulationTable<bool>) -> Result<(), ConfigurationError> {
        for projection in CANONICAL_PROJECTIONS {
            if present[projection.target] && present[projection.source] && self.get(projection).is_none() {
                return Err(ConfigurationError::MissingWeight(projection));
            }
        }

        for (projection, value) in self.iter() {
            if value < 0. || value.is_nan() {
                return Err(ConfigurationError::NegativeWeight { projection, value });
            }
            if projection.source == Population::Dendrite && value != 0. {
                return Err(ConfigurationError::DendriteAsSource(projection));
            }
            if value != 0. && !(present[projection.target] && present[projection.source]) {
                warn!(%projection, "ignoring weight of projection involving an absent population");
            }
        }

        Ok(())
    }
}

/// Connection probability per projection, unset projections are fully connected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionProbabilities {
    probabilities: ProjectionTable<Option<f64>>,
}

impl ConnectionProbabilities {
    /// Builds connection probabilities from two letter projection keys
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Result<Self, ConfigurationError> {
        let mut probabilities = ConnectionProbabilities::default();
        for (key, value) in pairs {
            probabilities.set(key.parse()?, *value);
        }

        Ok(probabilities)
    }

    pub fn set(&mut self, projection: Projection, value: f64) {
        self.probabilities[projection] = Some(value);
    }

    /// Connection probability of a projection, `1.` when unset
    pub fn get(&self, projection: Projection) -> f64 {
        self.probabilities[projection].unwrap_or(1.)
    }

    /// Checks every probability lies in `[0, 1]`
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (projection, value) in self.probabilities.iter() {
            if let Some(value) = value {
                if !(0. ..=1.).contains(value) {
                    return Err(
                        ConfigurationError::InvalidConnectionProbability { projection, value: *value }
                    );
                }
            }
        }

        Ok(())
    }
}

/// Multiplicative per-synapse weight noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heterogeneity {
    /// Half width of the uniform perturbation `ε`, each entry is scaled by `1 + ε`
    pub spread: f64,
}

impl Default for Heterogeneity {
    fn default() -> Self {
        Heterogeneity { spread: 0.5 }
    }
}

impl Heterogeneity {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0. ..=1.).contains(&self.spread) {
            return Err(ConfigurationError::InvalidHeterogeneity(self.spread));
        }

        Ok(())
    }
}

/// Generates a single weight matrix of shape `(target_units, source_units)`
///
/// - `mean_weight` : scalar mean of the matrix
///
/// - `connection_probability` : chance that any given synapse exists
///
/// - `heterogeneity` : use `Some` to perturb and sparsify entries, ignored when
/// either population is modelled by a single unit
///
/// - `rng` : random stream the perturbation and mask are drawn from
pub fn build_weight_matrix<R: Rng>(
    mean_weight: f64,
    connection_probability: f64,
    target_units: usize,
    source_units: usize,
    heterogeneity: Option<&Heterogeneity>,
    rng: &mut R,
) -> Array2<f64> {
    let heterogeneity = match heterogeneity {
        Some(value) if target_units > 1 && source_units > 1 => value,
        _ => return Array2::from_elem((target_units, source_units), mean_weight),
    };

    if connection_probability <= 0. {
        return Array2::zeros((target_units, source_units));
    }

    let perturbation = Uniform::new_inclusive(-heterogeneity.spread, heterogeneity.spread);

    Array2::from_shape_fn((target_units, source_units), |_| {
        let epsilon = perturbation.sample(rng);
        if rng.gen_bool(connection_probability) {
            mean_weight * (1. + epsilon) / connection_probability
        } else {
            0.
        }
    })
}

/// Weight matrices of every existing projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMatrices {
    matrices: ProjectionTable<Option<Array2<f64>>>,
}

impl WeightMatrices {
    /// Builds a matrix for every projection between present populations with a
    /// non-zero mean weight, projections with a zero mean weight get no matrix
    pub fn build<R: Rng>(
        mean_weights: &MeanWeights,
        connection_probabilities: &ConnectionProbabilities,
        cell_counts: &PopulationTable<usize>,
        present: &PopulationTable<bool>,
        heterogeneity: Option<&Heterogeneity>,
        rng: &mut R,
    ) -> Self {
        let mut matrices = WeightMatrices::default();

        for (projection, mean_weight) in mean_weights.iter() {
            if mean_weight == 0. || !present[projection.target] || !present[projection.source] {
                continue;
            }

            let matrix = build_weight_matrix(
                mean_weight,
                connection_probabilities.get(projection),
                cell_counts[projection.target],
                cell_counts[projection.source],
                heterogeneity,
                rng,
            );

            debug!(
                %projection, shape = ?matrix.dim(), mean = matrix.mean().unwrap_or(0.),
                "built weight matrix"
            );

            matrices.matrices[projection] = Some(matrix);
        }

        matrices
    }

    /// Weight matrix of a projection if it exists
    pub fn get(&self, projection: Projection) -> Option<&Array2<f64>> {
        self.matrices[projection].as_ref()
    }

    /// Whether the projection has a matrix
    pub fn contains(&self, projection: Projection) -> bool {
        self.matrices[projection].is_some()
    }

    /// Unsigned recurrent drive `(W r) / N_source` that the source rates deliver
    /// to each target unit, `None` if the projection is absent
    pub fn drive(&self, projection: Projection, source_rates: &Array1<f64>) -> Option<Array1<f64>> {
        self.get(projection)
            .map(|matrix| matrix.dot(source_rates) / source_rates.len() as f64)
    }
}
