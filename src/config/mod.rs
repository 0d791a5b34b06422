//! TOML configuration of experiments.
//!
//! Every key is optional, missing keys fall back to [`get_default_params`]
//! (spatially resolved unless `options.mean_population = true`). A file looks
//! like the following:
//!
//! ```toml
//! [options]
//! mean_population = true
//! calibrate = true
//! b = 0.5
//!
//! [weights]
//! DS = 0.6
//!
//! [targets]
//! E = 1.0
//!
//! [run]
//! duration = 1000
//! dt = 1
//!
//! [[run.stimulus]]
//! population = "S"
//! start = 400
//! end = 600
//! amplitude = 1.0
//!
//! [monitor]
//! dendritic_inhibition = true
//! ```

use std::{fs::read_to_string, path::Path, str::FromStr};
use toml::{from_str, Value};
use crate::defaults::{default_targets, get_default_params};
use crate::error::{ConfigurationError, Result};
use crate::model::{
    Adaptation, ExternalInput, InitialConditions, InitialRate, NetworkConfig, NetworkModel, RunParameters,
};
use crate::monitor::MonitorRequest;
use crate::population::{Population, PopulationTable, Projection};
use crate::weights::Heterogeneity;


/// Everything the binary needs to build a model and run it once
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    /// Network to build
    pub network: NetworkConfig,
    /// Target rates used when calibrating
    pub targets: PopulationTable<f64>,
    /// Whether to replace the background input by a calibrated one
    pub calibrate: bool,
    /// Parameters of the run
    pub run: RunParameters,
}

impl ExperimentConfig {
    /// Builds the model, calibrating the background input if requested
    pub fn build_model(&self) -> Result<NetworkModel> {
        let model = NetworkModel::new(self.network.clone())?;

        if self.calibrate {
            model.calibrate(&self.targets)
        } else {
            Ok(model)
        }
    }
}

fn invalid(field: &str, expected: &'static str) -> ConfigurationError {
    ConfigurationError::InvalidValue { field: field.to_string(), expected }
}

fn parse_bool(value: &Value, field_name: &str) -> std::result::Result<bool, ConfigurationError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(field_name, "boolean"))
}

fn parse_usize(value: &Value, field_name: &str) -> std::result::Result<usize, ConfigurationError> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .ok_or_else(|| invalid(field_name, "unsigned integer"))
        .map(|v| v as usize)
}

fn parse_u64(value: &Value, field_name: &str) -> std::result::Result<u64, ConfigurationError> {
    parse_usize(value, field_name).map(|v| v as u64)
}

// integers are accepted wherever a float is expected
fn parse_f64(value: &Value, field_name: &str) -> std::result::Result<f64, ConfigurationError> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        _ => Err(invalid(field_name, "float")),
    }
}

fn parse_string(value: &Value, field_name: &str) -> std::result::Result<String, ConfigurationError> {
    value
        .as_str()
        .ok_or_else(|| invalid(field_name, "string"))
        .map(String::from)
}

fn parse_value_with_default<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> std::result::Result<T, ConfigurationError>,
    default: T,
) -> std::result::Result<T, ConfigurationError> {
    table
        .get(key)
        .map_or(Ok(default), |value| parser(value, key))
}

fn parse_optional<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> std::result::Result<T, ConfigurationError>,
) -> std::result::Result<Option<T>, ConfigurationError> {
    table
        .get(key)
        .map(|value| parser(value, key))
        .transpose()
}

fn section<'a>(config: &'a Value, name: &str) -> std::result::Result<Option<&'a toml::Table>, ConfigurationError> {
    match config.get(name) {
        None => Ok(None),
        Some(value) => value.as_table()
            .map(Some)
            .ok_or_else(|| invalid(name, "table")),
    }
}

/// Reads a table keyed by single letter population codes into `values`
fn parse_population_section<T>(
    config: &Value,
    name: &str,
    values: &mut PopulationTable<T>,
    parser: impl Fn(&Value, &str) -> std::result::Result<T, ConfigurationError>,
) -> std::result::Result<(), ConfigurationError> {
    if let Some(table) = section(config, name)? {
        for (key, value) in table {
            let population = Population::from_str(key)?;
            values[population] = parser(value, &format!("{}.{}", name, key))?;
        }
    }

    Ok(())
}

/// Reads a table keyed by two letter projection codes
fn parse_projection_section(
    config: &Value,
    name: &str,
) -> std::result::Result<Vec<(Projection, f64)>, ConfigurationError> {
    let mut output = Vec::new();
    if let Some(table) = section(config, name)? {
        for (key, value) in table {
            let projection = Projection::from_str(key)?;
            output.push((projection, parse_f64(value, &format!("{}.{}", name, key))?));
        }
    }

    Ok(output)
}

fn get_network_config(config: &Value) -> std::result::Result<(NetworkConfig, bool), ConfigurationError> {
    let empty = Value::Table(toml::Table::new());
    let options = config.get("options").unwrap_or(&empty);

    let mean_population = parse_value_with_default(options, "mean_population", parse_bool, false)?;
    let calibrate = parse_value_with_default(options, "calibrate", parse_bool, false)?;

    let mut network = get_default_params(mean_population);

    parse_population_section(config, "cells", &mut network.cell_counts, parse_usize)?;
    parse_population_section(config, "time_constants", &mut network.time_constants, parse_f64)?;
    parse_population_section(config, "background", &mut network.background, parse_f64)?;

    for (projection, value) in parse_projection_section(config, "weights")? {
        network.mean_weights.set(projection, value);
    }
    for (projection, value) in parse_projection_section(config, "connection_probabilities")? {
        network.connection_probabilities.set(projection, value);
    }

    let model_options = &mut network.options;
    model_options.with_ndnf = parse_value_with_default(options, "with_ndnf", parse_bool, model_options.with_ndnf)?;
    model_options.with_vip = parse_value_with_default(options, "with_vip", parse_bool, model_options.with_vip)?;
    model_options.dendrite_coupling = parse_value_with_default(
        options, "dendrite_coupling", parse_f64, model_options.dendrite_coupling,
    )?;
    model_options.seed = parse_optional(options, "seed", parse_u64)?;

    let presynaptic = &mut model_options.presynaptic;
    presynaptic.enabled = parse_value_with_default(options, "presynaptic", parse_bool, presynaptic.enabled)?;
    presynaptic.b = parse_value_with_default(options, "b", parse_f64, presynaptic.b)?;
    presynaptic.tau_gaba = parse_value_with_default(options, "tau_gaba", parse_f64, presynaptic.tau_gaba)?;
    presynaptic.gamma = parse_value_with_default(options, "gamma", parse_f64, presynaptic.gamma)?;

    if parse_value_with_default(options, "heterogeneity", parse_bool, false)? {
        let spread = parse_value_with_default(
            options, "heterogeneity_spread", parse_f64, Heterogeneity::default().spread,
        )?;
        model_options.heterogeneity = Some(Heterogeneity { spread });
    }

    if parse_value_with_default(options, "som_adaptation", parse_bool, false)? {
        let defaults = Adaptation::default();
        model_options.som_adaptation = Some(Adaptation {
            strength: parse_value_with_default(options, "adaptation_strength", parse_f64, defaults.strength)?,
            tau: parse_value_with_default(options, "adaptation_tau", parse_f64, defaults.tau)?,
        });
    }

    Ok((network, calibrate))
}

fn get_monitor_request(config: &Value) -> std::result::Result<MonitorRequest, ConfigurationError> {
    let monitor = match config.get("monitor") {
        Some(monitor) => monitor,
        None => return Ok(MonitorRequest::default()),
    };

    Ok(MonitorRequest {
        currents: parse_value_with_default(monitor, "currents", parse_bool, false)?,
        boutons: parse_value_with_default(monitor, "boutons", parse_bool, false)?,
        dendritic_inhibition: parse_value_with_default(monitor, "dendritic_inhibition", parse_bool, false)?,
    })
}

fn get_run_parameters(
    config: &Value,
    cell_counts: &PopulationTable<usize>,
) -> std::result::Result<RunParameters, ConfigurationError> {
    let defaults = RunParameters::default();
    let empty = Value::Table(toml::Table::new());
    let run = config.get("run").unwrap_or(&empty);

    let mut params = RunParameters {
        duration: parse_value_with_default(run, "duration", parse_f64, defaults.duration)?,
        dt: parse_value_with_default(run, "dt", parse_f64, defaults.dt)?,
        noise: parse_value_with_default(run, "noise", parse_f64, defaults.noise)?,
        seed: parse_optional(run, "seed", parse_u64)?,
        monitor: get_monitor_request(config)?,
        ..defaults
    };

    let mut initial_conditions = InitialConditions {
        release_probability: parse_optional(run, "release_probability", parse_f64)?,
        gaba: parse_value_with_default(run, "gaba", parse_f64, 0.)?,
        init_noise: parse_value_with_default(run, "init_noise", parse_f64, 0.)?,
        ..InitialConditions::default()
    };
    let mut initial_rates: PopulationTable<Option<f64>> = PopulationTable::default();
    parse_population_section(run, "initial_rates", &mut initial_rates, |value, field| {
        parse_f64(value, field).map(Some)
    })?;
    for (population, rate) in initial_rates.iter() {
        initial_conditions.rates[population] = rate.map(InitialRate::Uniform);
    }
    params.initial_conditions = initial_conditions;

    if params.dt <= 0. || !params.dt.is_finite() {
        return Err(ConfigurationError::InvalidRunParameter { name: "dt", value: params.dt });
    }

    let steps = params.steps();
    let mut external_input = ExternalInput::none();
    if let Some(stimuli) = run.get("stimulus") {
        let stimuli = stimuli.as_array().ok_or_else(|| invalid("run.stimulus", "array of tables"))?;
        for stimulus in stimuli {
            let population = Population::from_str(
                &parse_value_with_default(stimulus, "population", parse_string, String::new())?
            )?;
            let start = parse_value_with_default(stimulus, "start", parse_f64, 0.)?;
            let end = parse_value_with_default(stimulus, "end", parse_f64, params.duration)?;
            let amplitude = parse_value_with_default(stimulus, "amplitude", parse_f64, 0.)?;

            external_input.add_pulse(
                population,
                steps,
                cell_counts[population],
                (start.max(0.) / params.dt).round() as usize,
                (end.max(0.) / params.dt).round() as usize,
                amplitude,
            );
        }
    }
    params.external_input = external_input;

    Ok(params)
}

/// Parses an experiment from the contents of a TOML file
pub fn parse_config(content: &str) -> std::result::Result<ExperimentConfig, ConfigurationError> {
    let config: Value = from_str(content).map_err(|err| ConfigurationError::Parse(err.to_string()))?;

    let (network, calibrate) = get_network_config(&config)?;

    let mut targets = default_targets();
    parse_population_section(&config, "targets", &mut targets, parse_f64)?;

    let run = get_run_parameters(&config, &network.cell_counts)?;

    Ok(ExperimentConfig { network, targets, calibrate, run })
}

/// Reads and parses an experiment from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> std::result::Result<ExperimentConfig, ConfigurationError> {
    let path = path.as_ref();
    let content = read_to_string(path)
        .map_err(|err| ConfigurationError::Parse(format!("cannot read {}: {}", path.display(), err)))?;

    parse_config(&content)
}
