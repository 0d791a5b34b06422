//! Inputs and outputs of a single run.

use ndarray::{Array1, Array2, Axis, s};
use tracing::warn;
use crate::error::{ConfigurationError, MicrocircuitError, ShapeError};
use crate::monitor::{MonitorRequest, MonitoredTraces};
use crate::population::{Population, PopulationTable};


/// Exogenous drive per population as time-major `(timesteps × units)` arrays,
/// populations without a series receive no drive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalInput {
    series: PopulationTable<Option<Array2<f64>>>,
}

impl ExternalInput {
    /// No drive to any population
    pub fn none() -> Self {
        ExternalInput::default()
    }

    /// Zero-filled series for every population, ready to be edited
    pub fn zeros(steps: usize, cell_counts: &PopulationTable<usize>) -> Self {
        ExternalInput { series: cell_counts.map(|_, units| Some(Array2::zeros((steps, *units)))) }
    }

    /// Sets the drive of a population
    pub fn set(&mut self, population: Population, series: Array2<f64>) {
        self.series[population] = Some(series);
    }

    /// Returns a copy with the drive of a population replaced
    pub fn with(mut self, population: Population, series: Array2<f64>) -> Self {
        self.set(population, series);
        self
    }

    /// Drive of a population if any
    pub fn get(&self, population: Population) -> Option<&Array2<f64>> {
        self.series[population].as_ref()
    }

    /// Adds `amplitude` to every unit of a population from step `start` up to
    /// (but excluding) step `end`, creating a zero series of the given shape
    /// first if the population has none
    pub fn add_pulse(
        &mut self,
        population: Population,
        steps: usize,
        units: usize,
        start: usize,
        end: usize,
        amplitude: f64,
    ) {
        let series = self.series[population].get_or_insert_with(|| Array2::zeros((steps, units)));
        let end = end.min(series.nrows());
        if start < end {
            series.slice_mut(s![start..end, ..]).mapv_inplace(|value| value + amplitude);
        }
    }

    /// Checks every series has one row per step and one column per unit
    pub fn validate(
        &self,
        steps: usize,
        cell_counts: &PopulationTable<usize>,
    ) -> Result<(), ShapeError> {
        for (population, series) in self.series.iter() {
            if let Some(series) = series {
                if series.nrows() != steps {
                    return Err(ShapeError::TimestepMismatch {
                        population, expected: steps, actual: series.nrows(),
                    });
                }
                if series.ncols() != cell_counts[population] {
                    return Err(ShapeError::UnitMismatch {
                        population, expected: cell_counts[population], actual: series.ncols(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Initial rate of a population
#[derive(Debug, Clone, PartialEq)]
pub enum InitialRate {
    /// Same rate for every unit
    Uniform(f64),
    /// One rate per unit
    PerUnit(Array1<f64>),
}

/// Initial state of a run, unset rates default to `0.` except the dendrite,
/// which starts at `1.`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialConditions {
    /// Rate overrides per population
    pub rates: PopulationTable<Option<InitialRate>>,
    /// Initial release probability, derived from the initial NDNF rate if `None`
    pub release_probability: Option<f64>,
    /// Initial extracellular GABA concentration
    pub gaba: f64,
    /// Standard deviation of Gaussian noise added to every initial rate
    pub init_noise: f64,
}

impl InitialConditions {
    /// Returns a copy with a uniform initial rate for the population
    pub fn with_rate(mut self, population: Population, rate: f64) -> Self {
        self.rates[population] = Some(InitialRate::Uniform(rate));
        self
    }

    /// Returns a copy with the initial release probability set
    pub fn with_release_probability(mut self, release_probability: f64) -> Self {
        self.release_probability = Some(release_probability);
        self
    }

    /// Returns a copy with initial noise
    pub fn with_init_noise(mut self, init_noise: f64) -> Self {
        self.init_noise = init_noise;
        self
    }

    /// Continues from the last state of a previous run
    pub fn from_final_state(output: &RunOutput) -> Self {
        let mut rates = PopulationTable::default();
        for (population, rate) in output.final_rates().iter() {
            rates[population] = Some(InitialRate::PerUnit(rate.clone()));
        }

        InitialConditions {
            rates,
            release_probability: output.release_probability.last().copied(),
            gaba: output.gaba.last().copied().unwrap_or(0.),
            init_noise: 0.,
        }
    }

    /// Default rate of a population when no override is given
    pub fn default_rate(population: Population) -> f64 {
        match population {
            Population::Dendrite => 1.,
            _ => 0.,
        }
    }

    /// Initial rate vector of a population with the given number of units
    pub fn rate_vector(&self, population: Population, units: usize) -> Result<Array1<f64>, ShapeError> {
        match &self.rates[population] {
            None => Ok(Array1::from_elem(units, Self::default_rate(population))),
            Some(InitialRate::Uniform(rate)) => Ok(Array1::from_elem(units, *rate)),
            Some(InitialRate::PerUnit(rates)) => {
                if rates.len() != units {
                    return Err(ShapeError::UnitMismatch { population, expected: units, actual: rates.len() });
                }

                Ok(rates.clone())
            },
        }
    }
}

/// Everything a run needs besides the model
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    /// Simulated time (ms)
    pub duration: f64,
    /// Integration timestep (ms)
    pub dt: f64,
    /// Exogenous drive
    pub external_input: ExternalInput,
    /// Initial state
    pub initial_conditions: InitialConditions,
    /// Standard deviation of white noise added to every rate at every step
    pub noise: f64,
    /// Quantities to record
    pub monitor: MonitorRequest,
    /// Seed of the noise stream, a fresh stream is used when `None`
    pub seed: Option<u64>,
}

impl Default for RunParameters {
    fn default() -> Self {
        RunParameters {
            duration: 1000.,
            dt: 1.,
            external_input: ExternalInput::none(),
            initial_conditions: InitialConditions::default(),
            noise: 0.,
            monitor: MonitorRequest::default(),
            seed: None,
        }
    }
}

impl RunParameters {
    /// Noiseless run without drive for the given duration and timestep
    pub fn new(duration: f64, dt: f64) -> Self {
        RunParameters { duration, dt, ..RunParameters::default() }
    }

    /// Number of integration steps, `floor(duration / dt)`
    pub fn steps(&self) -> usize {
        (self.duration / self.dt + 1e-9).floor() as usize
    }

    /// Validates scalar parameters and input shapes, returns the number of steps
    pub fn validate(&self, cell_counts: &PopulationTable<usize>) -> Result<usize, MicrocircuitError> {
        let checks: [(&'static str, f64, bool); 4] = [
            ("dt", self.dt, self.dt > 0.),
            ("duration", self.duration, self.duration >= 0.),
            ("noise", self.noise, self.noise >= 0.),
            ("init_noise", self.initial_conditions.init_noise, self.initial_conditions.init_noise >= 0.),
        ];

        for (name, value, valid) in checks {
            if !valid || !value.is_finite() {
                return Err(ConfigurationError::InvalidRunParameter { name, value }.into());
            }
        }

        if let Some(p0) = self.initial_conditions.release_probability {
            if !(0. ..=1.).contains(&p0) {
                return Err(ConfigurationError::InvalidRunParameter { name: "release_probability", value: p0 }.into());
            }
        }

        let steps = self.steps();
        self.external_input.validate(steps, cell_counts)?;

        Ok(steps)
    }
}

/// Trajectories of a run, every trajectory has `steps + 1` samples with the
/// initial state first
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Time of every sample (ms)
    pub time: Array1<f64>,
    /// Rates per population, one row per sample and one column per unit
    pub rates: PopulationTable<Array2<f64>>,
    /// Release probability of SOM boutons onto the dendrite
    pub release_probability: Array1<f64>,
    /// Extracellular GABA concentration
    pub gaba: Array1<f64>,
    /// Optional monitored quantities (one row per step)
    pub monitored: MonitoredTraces,
}

impl RunOutput {
    /// Rate trajectory of a population
    pub fn rates(&self, population: Population) -> &Array2<f64> {
        &self.rates[population]
    }

    /// Mean over units of a population's rate at every sample
    pub fn mean_rate(&self, population: Population) -> Array1<f64> {
        let rates = &self.rates[population];
        rates.mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(rates.nrows()))
    }

    /// Rates of every population at the last sample
    pub fn final_rates(&self) -> PopulationTable<Array1<f64>> {
        self.rates.map(|_, rates| {
            match rates.nrows() {
                0 => Array1::zeros(rates.ncols()),
                n => rates.row(n - 1).to_owned(),
            }
        })
    }

    /// Number of integration steps the run performed
    pub fn steps(&self) -> usize {
        self.time.len().saturating_sub(1)
    }
}

pub(crate) fn warn_ignored_input(external_input: &ExternalInput, present: &PopulationTable<bool>) {
    for population in Population::ALL {
        let drives = external_input.get(population)
            .is_some_and(|series| series.iter().any(|value| *value != 0.));
        if !present[population] && drives {
            warn!(%population, "ignoring external input to an absent population");
        }
    }
}
