//! Error set for model construction, calibration and simulation.
//!
//! Failures fall into three classes: bad configuration (caught when a model
//! is built or a run is validated), numerical failure (singular calibration
//! systems or non-finite rates) and shape mismatches between external input
//! series and the simulated time axis. Each class has its own enum and every
//! class converts into [`MicrocircuitError`].

use thiserror::Error;
use crate::population::{Population, Projection};


/// Error set for invalid model or run configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Population was given zero units
    #[error("Population {0} must have at least one unit")]
    NonPositiveCellCount(Population),
    /// Soma and dendrite are paired unit by unit
    #[error("Soma has {soma} units but dendrite has {dendrite}, they must be equal")]
    UnpairedDendrite {
        soma: usize,
        dendrite: usize,
    },
    /// A projection between two present populations has no mean weight
    #[error("Missing mean weight for projection {0}")]
    MissingWeight(Projection),
    /// Mean weights are magnitudes, sign is given by the source population
    #[error("Mean weight for projection {projection} must be non-negative, got {value}")]
    NegativeWeight {
        projection: Projection,
        value: f64,
    },
    /// Connection probability outside of `[0, 1]`
    #[error("Connection probability for projection {projection} must be in [0, 1], got {value}")]
    InvalidConnectionProbability {
        projection: Projection,
        value: f64,
    },
    /// Dendrite cannot be the source of a weight matrix
    #[error("Dendrite cannot be a presynaptic source (projection {0}), use the dendrite to soma coupling")]
    DendriteAsSource(Projection),
    /// Time constant must be strictly positive
    #[error("Time constant for {name} must be positive, got {value}")]
    NonPositiveTimeConstant {
        name: String,
        value: f64,
    },
    /// Presynaptic inhibition strength must be non-negative
    #[error("Release strength b must be non-negative, got {0}")]
    NegativeReleaseStrength(f64),
    /// Heterogeneity spread outside of `[0, 1]`
    #[error("Weight heterogeneity spread must be in [0, 1], got {0}")]
    InvalidHeterogeneity(f64),
    /// Target rates for calibration must lie in the linear regime
    #[error("Target rate for {population} must be non-negative, got {value}")]
    NegativeTargetRate {
        population: Population,
        value: f64,
    },
    /// Timestep, duration or noise levels that cannot be simulated
    #[error("Invalid run parameter {name}: {value}")]
    InvalidRunParameter {
        name: &'static str,
        value: f64,
    },
    /// Single letter code does not name a population
    #[error("Unknown population code {0:?}")]
    UnknownPopulation(String),
    /// Projection key is not two population codes
    #[error("Unknown projection key {0:?}")]
    UnknownProjection(String),
    /// Configuration file could not be read or parsed
    #[error("Could not parse configuration: {0}")]
    Parse(String),
    /// Configuration value has the wrong type
    #[error("Cannot parse {field} as {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },
}

/// Error set for numerical failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalError {
    /// `I - W_eff` has no unique inverse
    #[error("Calibration system is singular (smallest pivot {pivot:e})")]
    SingularCalibration {
        pivot: f64,
    },
    /// `I - W_eff` is invertible but solving it back loses the targets
    #[error("Calibration system is ill-conditioned (residual {residual:e})")]
    IllConditionedCalibration {
        residual: f64,
    },
    /// A rate became `NaN` or infinite during integration
    #[error("Rate of {population} became non-finite at step {step}")]
    NonFiniteRate {
        population: Population,
        step: usize,
    },
    /// Noise distribution could not be created
    #[error("Invalid noise distribution: {0}")]
    InvalidDistribution(String),
}

/// Error set for external input series that do not fit the simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// Series does not have one row per timestep
    #[error("Input for {population} has {actual} timesteps, expected {expected}")]
    TimestepMismatch {
        population: Population,
        expected: usize,
        actual: usize,
    },
    /// Series does not have one column per unit
    #[error("Input for {population} has {actual} units, expected {expected}")]
    UnitMismatch {
        population: Population,
        expected: usize,
        actual: usize,
    },
}

/// A set of errors that may occur when using the library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MicrocircuitError {
    /// Errors related to configuration
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
    /// Errors related to numerical procedures
    #[error("{0}")]
    Numerical(#[from] NumericalError),
    /// Errors related to input shapes
    #[error("{0}")]
    Shape(#[from] ShapeError),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, MicrocircuitError>;
