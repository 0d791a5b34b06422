//! Rate-based microcircuit model with presynaptic inhibition of SOM outputs.
//!
//! A [`NetworkModel`] is built once from an immutable [`NetworkConfig`], which
//! expands the mean weights into weight matrices. Each call to
//! [`NetworkModel::run`] integrates all population rates with forward Euler
//! steps and returns freshly allocated trajectories; nothing carries over
//! between runs except what the caller passes in as initial conditions.
//!
//! Per step every population sums external drive, background input and
//! recurrent input (excitatory sources positive, inhibitory negative, the SOM
//! to dendrite term scaled by the release probability), rectifies it and
//! relaxes towards it with its own time constant. All terms read the state of
//! the previous step only.

use ndarray::{Array1, Array2};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, error, info, warn};
use crate::calibration::{LinearCircuit, calibrate_background};
use crate::error::{ConfigurationError, MicrocircuitError, NumericalError, Result};
use crate::monitor::{MonitoredTraces, StepObservables, build_recorders};
use crate::population::{Population, PopulationTable, Projection};
use crate::presynaptic::{PresynapticParameters, PresynapticState, ReleaseTransfer, TanhRelease};
use crate::weights::{ConnectionProbabilities, Heterogeneity, MeanWeights, WeightMatrices};

mod simulation;
pub use simulation::{ExternalInput, InitialConditions, InitialRate, RunOutput, RunParameters};


const SOM_TO_DENDRITE: Projection = Projection::new(Population::Dendrite, Population::Som);
const NDNF_TO_DENDRITE: Projection = Projection::new(Population::Dendrite, Population::Ndnf);

/// Spike-frequency adaptation of SOM interneurons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adaptation {
    /// How strongly the adaptation variable inhibits SOM
    pub strength: f64,
    /// Time constant of the adaptation variable (ms)
    pub tau: f64,
}

impl Default for Adaptation {
    fn default() -> Self {
        Adaptation { strength: 0.5, tau: 100. }
    }
}

/// Structural options of the circuit
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// Per-synapse weight heterogeneity, homogeneous weights when `None`
    pub heterogeneity: Option<Heterogeneity>,
    /// Presynaptic inhibition of SOM outputs by NDNF activity
    pub presynaptic: PresynapticParameters,
    /// Dendrite to soma coupling weight (`wED`)
    pub dendrite_coupling: f64,
    /// SOM adaptation, none when `None`
    pub som_adaptation: Option<Adaptation>,
    /// Whether NDNF interneurons take part in the circuit
    pub with_ndnf: bool,
    /// Whether VIP interneurons take part in the circuit
    pub with_vip: bool,
    /// Seed of the stream weight matrices are drawn from
    pub seed: Option<u64>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        ModelOptions {
            heterogeneity: None,
            presynaptic: PresynapticParameters::default(),
            dendrite_coupling: 1.,
            som_adaptation: None,
            with_ndnf: true,
            with_vip: false,
            seed: None,
        }
    }
}

/// Immutable description of a circuit
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Units per population
    pub cell_counts: PopulationTable<usize>,
    /// Mean weight magnitude per projection
    pub mean_weights: MeanWeights,
    /// Connection probability per projection
    pub connection_probabilities: ConnectionProbabilities,
    /// Rate time constant per population (ms)
    pub time_constants: PopulationTable<f64>,
    /// Constant additive drive per population
    pub background: PopulationTable<f64>,
    /// Structural options
    pub options: ModelOptions,
}

impl NetworkConfig {
    /// Which populations take part in the circuit
    pub fn present(&self) -> PopulationTable<bool> {
        PopulationTable::from_fn(|population| match population {
            Population::Ndnf => self.options.with_ndnf,
            Population::Vip => self.options.with_vip,
            _ => true,
        })
    }

    /// Whether release probability follows NDNF activity
    pub fn presynaptic_active(&self) -> bool {
        self.options.presynaptic.enabled && self.options.with_ndnf
    }

    /// Checks the configuration before any weight matrix is built
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let present = self.present();

        for (population, units) in self.cell_counts.iter() {
            if present[population] && *units == 0 {
                return Err(ConfigurationError::NonPositiveCellCount(population));
            }
        }

        let (soma, dendrite) = (self.cell_counts[Population::Soma], self.cell_counts[Population::Dendrite]);
        if soma != dendrite {
            return Err(ConfigurationError::UnpairedDendrite { soma, dendrite });
        }

        for (population, tau) in self.time_constants.iter() {
            if present[population] && (*tau <= 0. || !tau.is_finite()) {
                return Err(ConfigurationError::NonPositiveTimeConstant {
                    name: population.to_string(), value: *tau,
                });
            }
        }

        self.mean_weights.validate(&present)?;
        self.connection_probabilities.validate()?;
        self.options.presynaptic.validate()?;

        if let Some(heterogeneity) = &self.options.heterogeneity {
            heterogeneity.validate()?;
        }

        if let Some(adaptation) = &self.options.som_adaptation {
            if adaptation.tau <= 0. || !adaptation.tau.is_finite() {
                return Err(ConfigurationError::NonPositiveTimeConstant {
                    name: String::from("adaptation"), value: adaptation.tau,
                });
            }
            check_finite("adaptation_strength", adaptation.strength)?;
        }

        check_finite("dendrite_coupling", self.options.dendrite_coupling)?;
        check_finite("gamma", self.options.presynaptic.gamma)?;

        for (population, value) in self.background.iter() {
            if present[population] {
                check_finite(&format!("background.{}", population), *value)?;
            }
        }

        Ok(())
    }

    /// Population-level linear view of the circuit used for calibration, with
    /// SOM to dendrite inhibition scaled by `release_probability`
    pub fn linear_circuit(&self, release_probability: f64) -> LinearCircuit<'_> {
        LinearCircuit {
            mean_weights: &self.mean_weights,
            present: self.present(),
            dendrite_coupling: self.options.dendrite_coupling,
            release_probability,
            som_adaptation: self.options.som_adaptation.map_or(0., |adaptation| adaptation.strength),
        }
    }
}

fn check_finite(field: &str, value: f64) -> std::result::Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidValue { field: String::from(field), expected: "finite float" })
    }
}

fn population_mean(rates: &Array1<f64>) -> f64 {
    rates.mean().unwrap_or(0.)
}

/// Input currents of one step together with the dendritic inhibition split by source
struct StepInputs {
    currents: PopulationTable<Array1<f64>>,
    dendritic_inhibition_som: Array1<f64>,
    dendritic_inhibition_ndnf: Array1<f64>,
}

/// Rate-based microcircuit with presynaptic inhibition, see module documentation
///
/// ```rust
/// # use ndnf_microcircuit::{
/// #     defaults::get_default_params,
/// #     model::{ExternalInput, NetworkModel, RunParameters},
/// #     population::Population,
/// #     error::MicrocircuitError,
/// # };
/// #
/// fn main() -> Result<(), MicrocircuitError> {
///     let model = NetworkModel::new(get_default_params(true))?;
///     let targets = ndnf_microcircuit::population::PopulationTable::filled(1.);
///     let model = model.calibrate(&targets)?;
///
///     // stimulate SOM between 400 ms and 600 ms
///     let mut params = RunParameters::new(1000., 1.);
///     params.external_input = ExternalInput::none();
///     params.external_input.add_pulse(Population::Som, params.steps(), 1, 400, 600, 1.);
///
///     let output = model.run(&params)?;
///     assert_eq!(output.steps(), 1000);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct NetworkModel<R: ReleaseTransfer = TanhRelease> {
    config: NetworkConfig,
    weights: WeightMatrices,
    transfer: R,
}

impl NetworkModel<TanhRelease> {
    /// Validates the configuration and builds the weight matrices
    pub fn new(config: NetworkConfig) -> Result<Self> {
        NetworkModel::with_transfer(config, TanhRelease)
    }
}

impl<R: ReleaseTransfer + Clone> NetworkModel<R> {
    /// Builds a model whose release probability follows a custom transfer function
    pub fn with_transfer(config: NetworkConfig, transfer: R) -> Result<Self> {
        config.validate()?;
        let weights = Self::build_weights(&config);

        info!(
            cells = ?config.cell_counts.iter().map(|(p, n)| (p.code(), *n)).collect::<Vec<_>>(),
            heterogeneous = config.options.heterogeneity.is_some(),
            presynaptic = config.presynaptic_active(),
            b = config.options.presynaptic.b,
            with_ndnf = config.options.with_ndnf,
            with_vip = config.options.with_vip,
            "built network model"
        );

        Ok(NetworkModel { config, weights, transfer })
    }

    fn build_weights(config: &NetworkConfig) -> WeightMatrices {
        let mut rng = match config.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        WeightMatrices::build(
            &config.mean_weights,
            &config.connection_probabilities,
            &config.cell_counts,
            &config.present(),
            config.options.heterogeneity.as_ref(),
            &mut rng,
        )
    }

    /// Configuration the model was built from
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Weight matrices of the model
    pub fn weights(&self) -> &WeightMatrices {
        &self.weights
    }

    /// Background input per population
    pub fn background(&self) -> &PopulationTable<f64> {
        &self.config.background
    }

    /// Release probability the model assigns to the given NDNF activity
    pub fn release_transfer(&self, ndnf_activity: f64) -> f64 {
        self.transfer.release_probability(ndnf_activity, self.config.options.presynaptic.b)
    }

    /// Replaces the mean weights and rebuilds every weight matrix
    pub fn rebuild(&mut self, mean_weights: MeanWeights) -> Result<()> {
        let config = NetworkConfig { mean_weights, ..self.config.clone() };
        config.validate()?;

        self.weights = Self::build_weights(&config);
        self.config = config;

        Ok(())
    }

    /// Copy of the model with a different presynaptic inhibition strength,
    /// weight matrices are kept as they are
    pub fn with_release_strength(&self, b: f64) -> Result<Self> {
        let mut config = self.config.clone();
        config.options.presynaptic.b = b;
        config.options.presynaptic.validate()?;

        Ok(NetworkModel { config, weights: self.weights.clone(), transfer: self.transfer.clone() })
    }

    /// Copy of the model with the given background input, used verbatim
    pub fn with_background(&self, background: PopulationTable<f64>) -> Self {
        let mut config = self.config.clone();
        config.background = background;

        NetworkModel { config, weights: self.weights.clone(), transfer: self.transfer.clone() }
    }

    /// Background input that holds every population at its target rate, see
    /// [`calibrate_background`], release probability at steady state comes
    /// from this model's transfer function at the NDNF target
    pub fn calibrate_background(&self, targets: &PopulationTable<f64>) -> Result<PopulationTable<f64>> {
        let release_probability = if self.config.presynaptic_active() {
            self.release_transfer(targets[Population::Ndnf])
        } else {
            1.
        };

        calibrate_background(&self.config.linear_circuit(release_probability), targets)
    }

    /// Copy of the model with a calibrated background input
    pub fn calibrate(&self, targets: &PopulationTable<f64>) -> Result<Self> {
        let background = self.calibrate_background(targets)?;

        Ok(self.with_background(background))
    }

    fn input_currents(
        &self,
        rates: &PopulationTable<Array1<f64>>,
        adaptation: &Array1<f64>,
        release_probability: f64,
        external_input: &ExternalInput,
        step: usize,
    ) -> StepInputs {
        let present = self.config.present();
        let dendrites = self.config.cell_counts[Population::Dendrite];
        let mut dendritic_inhibition_som = Array1::zeros(dendrites);
        let mut dendritic_inhibition_ndnf = Array1::zeros(dendrites);

        let currents = PopulationTable::from_fn(|target| {
            let units = self.config.cell_counts[target];
            if !present[target] {
                return Array1::zeros(units);
            }

            let mut current = Array1::from_elem(units, self.config.background[target]);

            if let Some(series) = external_input.get(target) {
                current += &series.row(step);
            }

            for source in Population::ALL {
                let projection = Projection::new(target, source);
                let mut drive = match self.weights.drive(projection, &rates[source]) {
                    Some(drive) => drive,
                    None => continue,
                };

                if projection == SOM_TO_DENDRITE {
                    drive *= release_probability;
                    dendritic_inhibition_som.assign(&drive);
                } else if projection == NDNF_TO_DENDRITE {
                    dendritic_inhibition_ndnf.assign(&drive);
                }

                current.scaled_add(source.sign(), &drive);
            }

            match target {
                Population::Soma => {
                    current.scaled_add(self.config.options.dendrite_coupling, &rates[Population::Dendrite]);
                },
                Population::Som => {
                    if let Some(adaptation_params) = &self.config.options.som_adaptation {
                        current.scaled_add(-adaptation_params.strength, adaptation);
                    }
                },
                _ => {},
            }

            current
        });

        StepInputs { currents, dendritic_inhibition_som, dendritic_inhibition_ndnf }
    }

    fn initial_rates(
        &self,
        params: &RunParameters,
        rng: &mut StdRng,
    ) -> Result<PopulationTable<Array1<f64>>> {
        let present = self.config.present();
        let init_noise = params.initial_conditions.init_noise;
        let normal = Normal::new(0., init_noise)
            .map_err(|err| NumericalError::InvalidDistribution(err.to_string()))?;

        let mut rates = PopulationTable::default();
        for population in Population::ALL {
            let units = self.config.cell_counts[population];
            rates[population] = if present[population] {
                let mut initial = params.initial_conditions.rate_vector(population, units)?;
                if init_noise > 0. {
                    initial.mapv_inplace(|rate| rate + normal.sample(&mut *rng));
                }

                initial
            } else {
                Array1::zeros(units)
            };
        }

        Ok(rates)
    }

    /// Integrates the circuit for `params.duration` with timestep `params.dt`
    ///
    /// Errors before the first step if the run parameters or input shapes are
    /// invalid, and stops at the first step that produces a non-finite rate.
    pub fn run(&self, params: &RunParameters) -> Result<RunOutput> {
        let counts = &self.config.cell_counts;
        let steps = params.validate(counts)?;
        let present = self.config.present();
        let presynaptic_active = self.config.presynaptic_active();
        let presynaptic_params = &self.config.options.presynaptic;
        let dt = params.dt;

        simulation::warn_ignored_input(&params.external_input, &present);
        if !presynaptic_active && params.initial_conditions.release_probability.is_some() {
            warn!("presynaptic inhibition is inactive, ignoring initial release probability");
        }

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let noise = Normal::new(0., params.noise)
            .map_err(|err| NumericalError::InvalidDistribution(err.to_string()))?;

        let mut rates = self.initial_rates(params, &mut rng)?;
        let mut adaptation: Array1<f64> = Array1::zeros(counts[Population::Som]);

        let initial_release = params.initial_conditions.release_probability
            .unwrap_or_else(|| self.release_transfer(population_mean(&rates[Population::Ndnf])));
        let mut presynaptic = PresynapticState::new(
            params.initial_conditions.gaba, initial_release, presynaptic_active,
        );

        let mut trajectories = counts.map(|_, units| Array2::<f64>::zeros((steps + 1, *units)));
        let mut release_probability = Array1::<f64>::zeros(steps + 1);
        let mut gaba = Array1::<f64>::zeros(steps + 1);

        for population in Population::ALL {
            trajectories[population].row_mut(0).assign(&rates[population]);
        }
        release_probability[0] = presynaptic.release_probability;
        gaba[0] = presynaptic.gaba;

        let mut recorders = build_recorders(&params.monitor, steps, counts);

        debug!(
            steps, dt, noise = params.noise, monitor = ?params.monitor, presynaptic = presynaptic_active,
            "starting run"
        );

        for step in 0..steps {
            let inputs = self.input_currents(
                &rates, &adaptation, presynaptic.release_probability, &params.external_input, step,
            );

            let mut next_rates = PopulationTable::default();
            for population in Population::ALL {
                let rate = &rates[population];
                if !present[population] {
                    next_rates[population] = rate.clone();
                    continue;
                }

                let tau = self.config.time_constants[population];
                let mut next = rate + &((&inputs.currents[population].mapv(|i| i.max(0.)) - rate) * (dt / tau));

                if params.noise > 0. {
                    next.mapv_inplace(|value| value + noise.sample(&mut rng));
                }

                if next.iter().any(|value| !value.is_finite()) {
                    error!(%population, step, "rate became non-finite");
                    return Err(MicrocircuitError::from(NumericalError::NonFiniteRate { population, step }));
                }

                next_rates[population] = next;
            }

            if params.monitor.any() {
                let observables = StepObservables {
                    step,
                    currents: &inputs.currents,
                    release_probability: presynaptic.release_probability,
                    som_rates: &rates[Population::Som],
                    som_to_dendrite: self.weights.get(SOM_TO_DENDRITE),
                    dendritic_inhibition_som: &inputs.dendritic_inhibition_som,
                    dendritic_inhibition_ndnf: &inputs.dendritic_inhibition_ndnf,
                };

                for recorder in recorders.iter_mut() {
                    recorder.update(&observables);
                }
            }

            presynaptic.update(
                &self.transfer,
                presynaptic_params,
                population_mean(&rates[Population::Som]),
                population_mean(&rates[Population::Ndnf]),
                presynaptic_active,
                dt,
            );

            if let Some(adaptation_params) = &self.config.options.som_adaptation {
                let delta = (&rates[Population::Som] - &adaptation) * (dt / adaptation_params.tau);
                adaptation += &delta;
            }

            rates = next_rates;

            for population in Population::ALL {
                trajectories[population].row_mut(step + 1).assign(&rates[population]);
            }
            release_probability[step + 1] = presynaptic.release_probability;
            gaba[step + 1] = presynaptic.gaba;
        }

        let mut monitored = MonitoredTraces::default();
        for recorder in recorders {
            recorder.store(&mut monitored);
        }

        debug!(
            steps,
            final_release = presynaptic.release_probability,
            final_gaba = presynaptic.gaba,
            "finished run"
        );

        Ok(RunOutput {
            time: Array1::from_shape_fn(steps + 1, |i| i as f64 * dt),
            rates: trajectories,
            release_probability,
            gaba,
            monitored,
        })
    }
}
