//! Background input calibration.
//!
//! Finds the constant per-population drive that makes the noiseless,
//! unstimulated steady state of the linear dynamics sit at prescribed target
//! rates. At steady state `r = bg + W_eff r`, so `bg = (I - W_eff) r_target`.
//! The system is factorised as well, so a circuit without a unique fixed point
//! is rejected instead of silently producing inputs it can never settle on.

use nalgebra::{DMatrix, DVector};
use tracing::{error, info};
use crate::error::{ConfigurationError, MicrocircuitError, NumericalError};
use crate::population::{Population, PopulationTable, Projection};
use crate::weights::MeanWeights;


const PIVOT_TOLERANCE: f64 = 1e-12;
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Population-level linear description of the circuit used for calibration
#[derive(Debug, Clone)]
pub struct LinearCircuit<'a> {
    /// Mean weight magnitudes
    pub mean_weights: &'a MeanWeights,
    /// Which populations take part in the circuit
    pub present: PopulationTable<bool>,
    /// Dendrite to soma coupling weight
    pub dendrite_coupling: f64,
    /// Release probability of SOM boutons onto the dendrite at the target
    /// NDNF rate, `1.` when presynaptic inhibition is inactive
    pub release_probability: f64,
    /// Strength of SOM adaptation, `0.` when adaptation is off
    pub som_adaptation: f64,
}

impl LinearCircuit<'_> {
    fn present_populations(&self) -> Vec<Population> {
        Population::ALL.into_iter()
            .filter(|population| self.present[*population])
            .collect()
    }

    /// Effective signed weight map between present populations, rows are
    /// targets and columns are sources in the order of [`Population::ALL`]
    /// restricted to present populations
    pub fn effective_weights(&self) -> DMatrix<f64> {
        let populations = self.present_populations();

        DMatrix::from_fn(populations.len(), populations.len(), |i, j| {
            let (target, source) = (populations[i], populations[j]);
            let projection = Projection::new(target, source);

            let mut weight = match source {
                Population::Dendrite => 0.,
                _ => source.sign() * self.mean_weights.value(projection),
            };

            if target == Population::Dendrite && source == Population::Som {
                weight *= self.release_probability;
            }
            if target == Population::Soma && source == Population::Dendrite {
                weight += self.dendrite_coupling;
            }
            if target == Population::Som && source == Population::Som {
                weight -= self.som_adaptation;
            }

            weight
        })
    }
}

/// Solves `system x = rhs` by LU decomposition, errors if the smallest pivot
/// is numerically zero relative to the largest entry of `system`
pub fn solve_linear_system(
    system: &DMatrix<f64>,
    rhs: &DVector<f64>,
) -> Result<DVector<f64>, NumericalError> {
    let scale = system.amax().max(1.);
    let lu = system.clone().lu();

    let pivot = lu.u().diagonal().amin();
    if !pivot.is_finite() || pivot < PIVOT_TOLERANCE * scale {
        return Err(NumericalError::SingularCalibration { pivot });
    }

    lu.solve(rhs).ok_or(NumericalError::SingularCalibration { pivot })
}

/// Calculates the background input that holds every present population at its
/// target rate when there is no external input and no noise, absent populations
/// get a background input of `0.`
///
/// - `circuit` : population-level description of the circuit
///
/// - `targets` : steady state rate per population, must be non-negative
pub fn calibrate_background(
    circuit: &LinearCircuit,
    targets: &PopulationTable<f64>,
) -> Result<PopulationTable<f64>, MicrocircuitError> {
    for (population, value) in targets.iter() {
        if circuit.present[population] && (*value < 0. || value.is_nan()) {
            return Err(ConfigurationError::NegativeTargetRate { population, value: *value }.into());
        }
    }

    let populations = circuit.present_populations();
    let system = DMatrix::<f64>::identity(populations.len(), populations.len()) - circuit.effective_weights();

    let target_rates = DVector::from_iterator(
        populations.len(),
        populations.iter().map(|population| targets[*population]),
    );
    let background = &system * &target_rates;

    let recovered = solve_linear_system(&system, &background).map_err(|err| {
        error!(%err, "calibration failed");
        err
    })?;

    let residual = (&recovered - &target_rates).amax();
    let scale = target_rates.amax().max(1.);

    if !residual.is_finite() || residual > RESIDUAL_TOLERANCE * scale {
        error!(residual, "calibration system is ill-conditioned");
        return Err(NumericalError::IllConditionedCalibration { residual }.into());
    }

    let mut output = PopulationTable::filled(0.);
    for (population, value) in populations.iter().zip(background.iter()) {
        output[*population] = *value;
    }

    info!(
        background = ?populations.iter().map(|p| (p.code(), output[*p])).collect::<Vec<_>>(),
        release_probability = circuit.release_probability,
        "calibrated background input"
    );

    Ok(output)
}
