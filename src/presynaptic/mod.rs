//! Presynaptic inhibition of SOM outputs by NDNF activity.
//!
//! NDNF activity lowers the release probability `p` of SOM boutons onto the
//! dendrite, so the effective SOM to dendrite weight is `p` times its base
//! weight. Alongside `p` an extracellular GABA concentration `g` is integrated
//! from SOM activity. `g` is reported for inspection but does not feed back
//! into `p`.

use crate::error::ConfigurationError;


/// Release probability of SOM boutons given NDNF activity and inhibition strength `b`,
/// computed as `1 - tanh(b * max(x, 0))`
///
/// The result lies in `[0, 1]`, is non-increasing in `ndnf_activity`, and equals
/// `1.` whenever `b` is `0.` or the activity is not positive.
pub fn release_transfer(ndnf_activity: f64, b: f64) -> f64 {
    1. - (b * ndnf_activity.max(0.)).tanh()
}

/// Maps NDNF activity to a release probability
pub trait ReleaseTransfer: Send + Sync {
    /// Release probability in `[0, 1]` for the given activity and strength
    fn release_probability(&self, ndnf_activity: f64, b: f64) -> f64;
}

/// Default transfer function, see [`release_transfer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TanhRelease;

impl ReleaseTransfer for TanhRelease {
    fn release_probability(&self, ndnf_activity: f64, b: f64) -> f64 {
        release_transfer(ndnf_activity, b)
    }
}

/// Parameters of presynaptic inhibition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresynapticParameters {
    /// Whether NDNF activity gates SOM release at all
    pub enabled: bool,
    /// Strength of presynaptic inhibition (`0.` means `p = 1`)
    pub b: f64,
    /// Decay time constant of extracellular GABA (ms)
    pub tau_gaba: f64,
    /// Amount of GABA released per unit of SOM activity
    pub gamma: f64,
}

impl Default for PresynapticParameters {
    fn default() -> Self {
        PresynapticParameters {
            enabled: true,
            b: 0.5,
            tau_gaba: 200.,
            gamma: 1.,
        }
    }
}

impl PresynapticParameters {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.b < 0. || self.b.is_nan() {
            return Err(ConfigurationError::NegativeReleaseStrength(self.b));
        }
        if self.tau_gaba <= 0. || self.tau_gaba.is_nan() {
            return Err(
                ConfigurationError::NonPositiveTimeConstant { name: String::from("gaba"), value: self.tau_gaba }
            );
        }

        Ok(())
    }
}

/// State of presynaptic inhibition during a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresynapticState {
    /// Extracellular GABA concentration
    pub gaba: f64,
    /// Release probability of SOM boutons onto the dendrite
    pub release_probability: f64,
}

impl PresynapticState {
    /// Creates the initial state, `release_probability` is fixed to `1.` when
    /// `active` is false
    pub fn new(gaba: f64, release_probability: f64, active: bool) -> Self {
        PresynapticState {
            gaba,
            release_probability: if active { release_probability } else { 1. },
        }
    }

    /// Advances the state by one timestep using the previous step's population
    /// mean SOM and NDNF rates
    ///
    /// - `som_rate` : mean SOM rate before the step, drives GABA accumulation
    ///
    /// - `ndnf_rate` : mean NDNF rate before the step, sets the release probability
    ///
    /// - `active` : use `false` to hold the release probability at `1.`
    pub fn update<T: ReleaseTransfer + ?Sized>(
        &mut self,
        transfer: &T,
        params: &PresynapticParameters,
        som_rate: f64,
        ndnf_rate: f64,
        active: bool,
        dt: f64,
    ) {
        self.gaba += dt / params.tau_gaba * (-self.gaba + params.gamma * som_rate);

        if active {
            self.release_probability = transfer.release_probability(ndnf_rate, params.b);
        }
    }
}
