//! Opt-in recording of internal quantities during a run.
//!
//! A [`MonitorRequest`] is resolved at the start of a run into a list of
//! [`Recorder`]s. After every step the integration loop hands each recorder
//! the quantities it already computed for that step. Recorders only copy
//! values, so trajectories are identical whether or not anything is monitored.

use ndarray::{Array1, Array2, s};
use crate::population::{Population, PopulationTable};


/// Which internal quantities to record during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorRequest {
    /// Total input current of every population before the nonlinearity
    pub currents: bool,
    /// Transmitted inhibition of each SOM to dendrite bouton
    pub boutons: bool,
    /// SOM and NDNF contributions to dendritic inhibition
    pub dendritic_inhibition: bool,
}

impl MonitorRequest {
    /// Records everything
    pub fn all() -> Self {
        MonitorRequest { currents: true, boutons: true, dendritic_inhibition: true }
    }

    /// Whether any quantity is requested
    pub fn any(&self) -> bool {
        self.currents || self.boutons || self.dendritic_inhibition
    }
}

/// Quantities computed by the integration loop during a single step
#[derive(Debug)]
pub struct StepObservables<'a> {
    /// Index of the step
    pub step: usize,
    /// Total input current of every population
    pub currents: &'a PopulationTable<Array1<f64>>,
    /// Release probability used during the step
    pub release_probability: f64,
    /// SOM rates at the start of the step
    pub som_rates: &'a Array1<f64>,
    /// SOM to dendrite weight matrix if the projection exists
    pub som_to_dendrite: Option<&'a Array2<f64>>,
    /// Inhibition each dendrite receives from SOM boutons (after release gating)
    pub dendritic_inhibition_som: &'a Array1<f64>,
    /// Inhibition each dendrite receives from NDNF interneurons
    pub dendritic_inhibition_ndnf: &'a Array1<f64>,
}

/// Decomposition of dendritic inhibition by source, one row per step and one
/// column per dendrite
#[derive(Debug, Clone, PartialEq)]
pub struct DendriticInhibition {
    /// SOM-sourced inhibition
    pub som: Array2<f64>,
    /// NDNF-sourced inhibition
    pub ndnf: Array2<f64>,
}

impl DendriticInhibition {
    /// Sum of both sources
    pub fn total(&self) -> Array2<f64> {
        &self.som + &self.ndnf
    }
}

/// Everything recorded during a run, unrequested quantities are `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitoredTraces {
    /// Input current per population, one row per step
    pub currents: Option<PopulationTable<Array2<f64>>>,
    /// Per-bouton SOM output, one row per step and one column per synapse
    /// (row-major over dendrite then SOM unit)
    pub boutons: Option<Array2<f64>>,
    /// Dendritic inhibition split by source
    pub dendritic_inhibition: Option<DendriticInhibition>,
}

/// Records a quantity over the course of a run
pub trait Recorder: Send {
    /// Stores the quantities of the given step
    fn update(&mut self, observables: &StepObservables);
    /// Moves the recorded history into the run's traces
    fn store(self: Box<Self>, traces: &mut MonitoredTraces);
}

/// Records total input currents
#[derive(Debug, Clone)]
pub struct CurrentHistory {
    history: PopulationTable<Array2<f64>>,
}

impl CurrentHistory {
    pub fn new(steps: usize, cell_counts: &PopulationTable<usize>) -> Self {
        CurrentHistory { history: cell_counts.map(|_, units| Array2::zeros((steps, *units))) }
    }
}

impl Recorder for CurrentHistory {
    fn update(&mut self, observables: &StepObservables) {
        for population in Population::ALL {
            let current = &observables.currents[population];
            if current.len() == self.history[population].ncols() {
                self.history[population].row_mut(observables.step).assign(current);
            }
        }
    }

    fn store(self: Box<Self>, traces: &mut MonitoredTraces) {
        traces.currents = Some(self.history);
    }
}

/// Records the gated output of every SOM to dendrite bouton
#[derive(Debug, Clone)]
pub struct BoutonHistory {
    history: Array2<f64>,
    dendrites: usize,
    soms: usize,
}

impl BoutonHistory {
    pub fn new(steps: usize, dendrites: usize, soms: usize) -> Self {
        BoutonHistory { history: Array2::zeros((steps, dendrites * soms)), dendrites, soms }
    }
}

impl Recorder for BoutonHistory {
    fn update(&mut self, observables: &StepObservables) {
        let weights = match observables.som_to_dendrite {
            Some(weights) => weights,
            None => return,
        };

        if weights.dim() != (self.dendrites, self.soms) {
            return;
        }

        let scale = observables.release_probability / self.soms as f64;

        let mut row = self.history.row_mut(observables.step);
        for ((i, j), weight) in weights.indexed_iter() {
            row[i * self.soms + j] = scale * weight * observables.som_rates[j];
        }
    }

    fn store(self: Box<Self>, traces: &mut MonitoredTraces) {
        traces.boutons = Some(self.history);
    }
}

/// Records SOM and NDNF inhibition onto every dendrite
#[derive(Debug, Clone)]
pub struct DendriticInhibitionHistory {
    som: Array2<f64>,
    ndnf: Array2<f64>,
}

impl DendriticInhibitionHistory {
    pub fn new(steps: usize, dendrites: usize) -> Self {
        DendriticInhibitionHistory {
            som: Array2::zeros((steps, dendrites)),
            ndnf: Array2::zeros((steps, dendrites)),
        }
    }
}

impl Recorder for DendriticInhibitionHistory {
    fn update(&mut self, observables: &StepObservables) {
        self.som.slice_mut(s![observables.step, ..]).assign(observables.dendritic_inhibition_som);
        self.ndnf.slice_mut(s![observables.step, ..]).assign(observables.dendritic_inhibition_ndnf);
    }

    fn store(self: Box<Self>, traces: &mut MonitoredTraces) {
        traces.dendritic_inhibition = Some(DendriticInhibition { som: self.som, ndnf: self.ndnf });
    }
}

/// Resolves a request into the recorders the integration loop should call
pub fn build_recorders(
    request: &MonitorRequest,
    steps: usize,
    cell_counts: &PopulationTable<usize>,
) -> Vec<Box<dyn Recorder>> {
    let mut recorders: Vec<Box<dyn Recorder>> = Vec::new();

    if request.currents {
        recorders.push(Box::new(CurrentHistory::new(steps, cell_counts)));
    }
    if request.boutons {
        recorders.push(Box::new(BoutonHistory::new(
            steps, cell_counts[Population::Dendrite], cell_counts[Population::Som],
        )));
    }
    if request.dendritic_inhibition {
        recorders.push(Box::new(DendriticInhibitionHistory::new(
            steps, cell_counts[Population::Dendrite],
        )));
    }

    recorders
}
