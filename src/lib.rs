//! # NDNF Microcircuit
//!
//! `ndnf_microcircuit` simulates a rate-based cortical microcircuit of
//! pyramidal somata (E) with their apical dendrites (D) and four interneuron
//! types: SOM (S), NDNF (N), PV (P) and VIP (V). NDNF activity presynaptically
//! inhibits SOM outputs onto the dendrite by lowering their release
//! probability, which lets the circuit shift dendritic inhibition between a
//! fast SOM-mediated and a slow NDNF-mediated route.
//!
//! Populations can be reduced to one unit each (mean-population model) or
//! spatially resolved with heterogeneous, sparsely connected weights. A
//! constant background drive can be calibrated so the unstimulated network
//! rests at chosen target rates.
//!
//! ## Example Code
//!
//! ### Stimulating SOM and reading out dendritic inhibition
//!
//! ```rust
//! use ndnf_microcircuit::{
//!     defaults::{default_targets, get_default_params},
//!     error::MicrocircuitError,
//!     model::{ExternalInput, NetworkModel, RunParameters},
//!     monitor::MonitorRequest,
//!     population::Population,
//! };
//!
//! fn main() -> Result<(), MicrocircuitError> {
//!     let model = NetworkModel::new(get_default_params(true))?
//!         .calibrate(&default_targets())?;
//!
//!     let mut params = RunParameters::new(800., 1.);
//!     params.monitor = MonitorRequest { dendritic_inhibition: true, ..MonitorRequest::default() };
//!
//!     let mut input = ExternalInput::none();
//!     input.add_pulse(Population::Som, params.steps(), 1, 100, 600, 1.);
//!     params.external_input = input;
//!
//!     let output = model.run(&params)?;
//!
//!     let inhibition = output.monitored.dendritic_inhibition
//!         .expect("dendritic inhibition was requested");
//!     println!("SOM inhibition during stimulus: {}", inhibition.som[[400, 0]]);
//!     println!("final release probability: {}", output.release_probability[params.steps()]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Sweeping the strength of presynaptic inhibition
//!
//! ```rust
//! use ndnf_microcircuit::{
//!     batch::sweep_release_strength,
//!     defaults::get_default_params,
//!     error::MicrocircuitError,
//!     model::{NetworkModel, RunParameters},
//!     population::Population,
//! };
//!
//! fn main() -> Result<(), MicrocircuitError> {
//!     let model = NetworkModel::new(get_default_params(true))?;
//!     let params = RunParameters::new(500., 1.);
//!
//!     for output in sweep_release_strength(&model, &params, &[0., 0.25, 0.5, 1.]) {
//!         let output = output?;
//!         println!("dendrite: {}", output.mean_rate(Population::Dendrite)[output.steps()]);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod population;
pub mod weights;
pub mod presynaptic;
pub mod calibration;
pub mod monitor;
pub mod model;
pub mod defaults;
pub mod config;
pub mod batch;
