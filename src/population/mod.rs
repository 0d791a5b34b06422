//! Cell-type roles of the microcircuit and fixed-size tables indexed by them.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use crate::error::ConfigurationError;


/// Number of population roles in the circuit
pub const NUM_POPULATIONS: usize = 6;

/// Cell-type role of a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Population {
    /// Excitatory soma (`E`)
    Soma,
    /// Dendritic compartment of the excitatory cells (`D`)
    Dendrite,
    /// SOM-like dendrite targeting interneurons (`S`)
    Som,
    /// NDNF-like interneurons (`N`)
    Ndnf,
    /// PV-like perisomatic interneurons (`P`)
    Pv,
    /// VIP-like disinhibitory interneurons (`V`)
    Vip,
}

impl Population {
    /// Every population in table order
    pub const ALL: [Population; NUM_POPULATIONS] = [
        Population::Soma,
        Population::Dendrite,
        Population::Som,
        Population::Ndnf,
        Population::Pv,
        Population::Vip,
    ];

    /// Position of the population in a [`PopulationTable`]
    pub fn index(&self) -> usize {
        match self {
            Population::Soma => 0,
            Population::Dendrite => 1,
            Population::Som => 2,
            Population::Ndnf => 3,
            Population::Pv => 4,
            Population::Vip => 5,
        }
    }

    /// Single letter code used in projection keys
    pub fn code(&self) -> char {
        match self {
            Population::Soma => 'E',
            Population::Dendrite => 'D',
            Population::Som => 'S',
            Population::Ndnf => 'N',
            Population::Pv => 'P',
            Population::Vip => 'V',
        }
    }

    /// Converts a single letter code back to a population
    pub fn from_code(code: char) -> Option<Population> {
        match code {
            'E' => Some(Population::Soma),
            'D' => Some(Population::Dendrite),
            'S' => Some(Population::Som),
            'N' => Some(Population::Ndnf),
            'P' => Some(Population::Pv),
            'V' => Some(Population::Vip),
            _ => None,
        }
    }

    /// Sign of this population's output onto its targets, `1` for excitatory
    /// and `-1` for inhibitory populations
    pub fn sign(&self) -> f64 {
        match self {
            Population::Soma | Population::Dendrite => 1.,
            _ => -1.,
        }
    }
}

impl Display for Population {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Population {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(code), None) => Population::from_code(code)
                .ok_or_else(|| ConfigurationError::UnknownPopulation(s.to_string())),
            _ => Err(ConfigurationError::UnknownPopulation(s.to_string())),
        }
    }
}

/// Fixed-size table holding one value per [`Population`]
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationTable<T> {
    values: [T; NUM_POPULATIONS],
}

impl<T: Default> Default for PopulationTable<T> {
    fn default() -> Self {
        PopulationTable { values: Default::default() }
    }
}

impl<T> PopulationTable<T> {
    /// Builds a table by evaluating `f` for every population
    pub fn from_fn(mut f: impl FnMut(Population) -> T) -> Self {
        PopulationTable { values: Population::ALL.map(|population| f(population)) }
    }

    /// Iterates over populations and their values in table order
    pub fn iter(&self) -> impl Iterator<Item = (Population, &T)> {
        Population::ALL.into_iter().zip(self.values.iter())
    }

    /// Iterates mutably over populations and their values in table order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Population, &mut T)> {
        Population::ALL.into_iter().zip(self.values.iter_mut())
    }

    /// Applies `f` to every value, producing a new table
    pub fn map<U>(&self, mut f: impl FnMut(Population, &T) -> U) -> PopulationTable<U> {
        PopulationTable::from_fn(|population| f(population, &self[population]))
    }
}

impl<T: Clone> PopulationTable<T> {
    /// Table with the same value for every population
    pub fn filled(value: T) -> Self {
        PopulationTable::from_fn(|_| value.clone())
    }
}

impl<T> Index<Population> for PopulationTable<T> {
    type Output = T;

    fn index(&self, population: Population) -> &T {
        &self.values[population.index()]
    }
}

impl<T> IndexMut<Population> for PopulationTable<T> {
    fn index_mut(&mut self, population: Population) -> &mut T {
        &mut self.values[population.index()]
    }
}

/// Directed projection from a source population onto a target population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Projection {
    /// Postsynaptic population
    pub target: Population,
    /// Presynaptic population
    pub source: Population,
}

impl Projection {
    pub const fn new(target: Population, source: Population) -> Self {
        Projection { target, source }
    }
}

/// Projections every full circuit specifies, written target first as in `"DS"`
/// (SOM onto dendrite)
pub const CANONICAL_PROJECTIONS: [Projection; 13] = [
    Projection::new(Population::Ndnf, Population::Som),
    Projection::new(Population::Dendrite, Population::Som),
    Projection::new(Population::Dendrite, Population::Ndnf),
    Projection::new(Population::Som, Population::Soma),
    Projection::new(Population::Ndnf, Population::Ndnf),
    Projection::new(Population::Pv, Population::Som),
    Projection::new(Population::Pv, Population::Ndnf),
    Projection::new(Population::Pv, Population::Pv),
    Projection::new(Population::Pv, Population::Soma),
    Projection::new(Population::Soma, Population::Pv),
    Projection::new(Population::Dendrite, Population::Soma),
    Projection::new(Population::Vip, Population::Som),
    Projection::new(Population::Som, Population::Vip),
];

impl Display for Projection {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}{}", self.target.code(), self.source.code())
    }
}

impl FromStr for Projection {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let codes: Vec<char> = s.chars().collect();
        if codes.len() != 2 {
            return Err(ConfigurationError::UnknownProjection(s.to_string()));
        }

        match (Population::from_code(codes[0]), Population::from_code(codes[1])) {
            (Some(target), Some(source)) => Ok(Projection { target, source }),
            _ => Err(ConfigurationError::UnknownProjection(s.to_string())),
        }
    }
}

/// Fixed-size table holding one value per (target, source) pair
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionTable<T> {
    values: [[T; NUM_POPULATIONS]; NUM_POPULATIONS],
}

impl<T: Default> Default for ProjectionTable<T> {
    fn default() -> Self {
        ProjectionTable { values: Default::default() }
    }
}

impl<T> ProjectionTable<T> {
    /// Builds a table by evaluating `f` for every pair
    pub fn from_fn(mut f: impl FnMut(Projection) -> T) -> Self {
        ProjectionTable {
            values: Population::ALL.map(|target| {
                Population::ALL.map(|source| f(Projection { target, source }))
            })
        }
    }

    /// Iterates over every pair and its value, target-major
    pub fn iter(&self) -> impl Iterator<Item = (Projection, &T)> {
        Population::ALL.into_iter()
            .flat_map(|target| {
                Population::ALL.into_iter().map(move |source| Projection { target, source })
            })
            .zip(self.values.iter().flat_map(|row| row.iter()))
    }
}

impl<T> Index<Projection> for ProjectionTable<T> {
    type Output = T;

    fn index(&self, projection: Projection) -> &T {
        &self.values[projection.target.index()][projection.source.index()]
    }
}

impl<T> IndexMut<Projection> for ProjectionTable<T> {
    fn index_mut(&mut self, projection: Projection) -> &mut T {
        &mut self.values[projection.target.index()][projection.source.index()]
    }
}
