#[cfg(test)]
mod tests {
    use ndnf_microcircuit::{
        defaults::get_default_params,
        error::{ConfigurationError, MicrocircuitError},
        model::{Adaptation, NetworkConfig, NetworkModel},
        population::{Population, Projection},
        weights::{Heterogeneity, MeanWeights},
    };

    fn construction_error(config: NetworkConfig) -> ConfigurationError {
        match NetworkModel::new(config) {
            Err(MicrocircuitError::Configuration(err)) => err,
            Err(err) => panic!("unexpected error: {}", err),
            Ok(_) => panic!("construction should have failed"),
        }
    }

    #[test]
    pub fn test_zero_unit_count() {
        let mut config = get_default_params(false);
        config.cell_counts[Population::Pv] = 0;

        assert_eq!(construction_error(config), ConfigurationError::NonPositiveCellCount(Population::Pv));
    }

    #[test]
    pub fn test_zero_units_of_absent_population_are_allowed() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(false);
        config.cell_counts[Population::Vip] = 0;

        NetworkModel::new(config)?;

        Ok(())
    }

    #[test]
    pub fn test_unpaired_dendrites() {
        let mut config = get_default_params(false);
        config.cell_counts[Population::Dendrite] = 60;

        assert_eq!(
            construction_error(config),
            ConfigurationError::UnpairedDendrite { soma: 70, dendrite: 60 },
        );
    }

    #[test]
    pub fn test_missing_weight() {
        let mut config = get_default_params(true);
        let mut weights = MeanWeights::default();
        for (projection, value) in config.mean_weights.iter() {
            if projection.to_string() != "DS" {
                weights.set(projection, value);
            }
        }
        config.mean_weights = weights;

        assert_eq!(
            construction_error(config),
            ConfigurationError::MissingWeight(Projection::new(Population::Dendrite, Population::Som)),
        );
    }

    #[test]
    pub fn test_missing_weight_of_absent_population_is_allowed() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.options.with_ndnf = false;

        let mut weights = MeanWeights::default();
        for (projection, value) in config.mean_weights.iter() {
            if projection.source != Population::Ndnf && projection.target != Population::Ndnf {
                weights.set(projection, value);
            }
        }
        config.mean_weights = weights;

        NetworkModel::new(config)?;

        Ok(())
    }

    #[test]
    pub fn test_negative_weight() {
        let mut config = get_default_params(true);
        let pe = Projection::new(Population::Pv, Population::Soma);
        config.mean_weights.set(pe, -1.);

        assert_eq!(
            construction_error(config),
            ConfigurationError::NegativeWeight { projection: pe, value: -1. },
        );
    }

    #[test]
    pub fn test_dendrite_cannot_be_a_source() {
        let mut config = get_default_params(true);
        let sd = Projection::new(Population::Som, Population::Dendrite);
        config.mean_weights.set(sd, 0.3);

        assert_eq!(construction_error(config), ConfigurationError::DendriteAsSource(sd));
    }

    #[test]
    pub fn test_invalid_connection_probability() {
        let mut config = get_default_params(false);
        let ns = Projection::new(Population::Ndnf, Population::Som);
        config.connection_probabilities.set(ns, 1.5);

        assert_eq!(
            construction_error(config),
            ConfigurationError::InvalidConnectionProbability { projection: ns, value: 1.5 },
        );
    }

    #[test]
    pub fn test_non_positive_time_constant() {
        let mut config = get_default_params(true);
        config.time_constants[Population::Som] = 0.;

        assert_eq!(
            construction_error(config),
            ConfigurationError::NonPositiveTimeConstant { name: String::from("S"), value: 0. },
        );

        let mut config = get_default_params(true);
        config.options.som_adaptation = Some(Adaptation { strength: 0.5, tau: -1. });

        assert!(matches!(
            construction_error(config),
            ConfigurationError::NonPositiveTimeConstant { .. }
        ));
    }

    #[test]
    pub fn test_negative_release_strength() {
        let mut config = get_default_params(true);
        config.options.presynaptic.b = -0.1;

        assert_eq!(construction_error(config), ConfigurationError::NegativeReleaseStrength(-0.1));
    }

    #[test]
    pub fn test_invalid_heterogeneity() {
        let mut config = get_default_params(false);
        config.options.heterogeneity = Some(Heterogeneity { spread: 1.5 });

        assert_eq!(construction_error(config), ConfigurationError::InvalidHeterogeneity(1.5));
    }

    #[test]
    pub fn test_non_finite_options() {
        let finite_float = |field: &str| ConfigurationError::InvalidValue {
            field: String::from(field), expected: "finite float",
        };

        let mut config = get_default_params(true);
        config.options.dendrite_coupling = f64::NAN;
        assert_eq!(construction_error(config), finite_float("dendrite_coupling"));

        let mut config = get_default_params(true);
        config.options.presynaptic.gamma = f64::INFINITY;
        assert_eq!(construction_error(config), finite_float("gamma"));

        let mut config = get_default_params(true);
        config.options.som_adaptation = Some(Adaptation { strength: f64::NEG_INFINITY, tau: 100. });
        assert_eq!(construction_error(config), finite_float("adaptation_strength"));

        let mut config = get_default_params(true);
        config.background[Population::Som] = f64::NAN;
        assert_eq!(construction_error(config), finite_float("background.S"));
    }

    #[test]
    pub fn test_background_of_absent_population_is_ignored() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.options.with_vip = false;
        config.background[Population::Vip] = f64::NAN;

        NetworkModel::new(config)?;

        Ok(())
    }

    #[test]
    pub fn test_unknown_projection_key() {
        assert_eq!(
            MeanWeights::from_pairs(&[("DS", 0.5), ("XY", 1.)]),
            Err(ConfigurationError::UnknownProjection(String::from("XY"))),
        );
        assert!("DSS".parse::<Projection>().is_err());
        assert!("Q".parse::<Population>().is_err());
    }
}
