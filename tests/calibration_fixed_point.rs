#[cfg(test)]
mod tests {
    use ndnf_microcircuit::{
        defaults::{default_targets, get_default_params},
        error::{ConfigurationError, MicrocircuitError, NumericalError},
        model::{Adaptation, NetworkConfig, NetworkModel, RunParameters},
        population::{Population, PopulationTable, Projection},
        presynaptic::ReleaseTransfer,
        weights::{ConnectionProbabilities, Heterogeneity},
    };

    #[derive(Debug, Clone, Copy)]
    struct HyperbolicRelease;

    impl ReleaseTransfer for HyperbolicRelease {
        fn release_probability(&self, ndnf_activity: f64, b: f64) -> f64 {
            1. / (1. + b * ndnf_activity.max(0.))
        }
    }

    fn assert_settles_at(
        config: NetworkConfig,
        targets: &PopulationTable<f64>,
        duration: f64,
        tolerance: f64,
    ) -> Result<(), MicrocircuitError> {
        let present = config.present();
        let model = NetworkModel::new(config)?.calibrate(targets)?;
        let output = model.run(&RunParameters::new(duration, 1.))?;

        for population in Population::ALL {
            let mean = output.mean_rate(population)[output.steps()];
            if present[population] {
                assert!(
                    (mean - targets[population]).abs() < tolerance,
                    "{} settled at {}, expected {}", population, mean, targets[population],
                );
            } else {
                assert_eq!(mean, 0.);
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_calibrated_background_values() -> Result<(), MicrocircuitError> {
        let model = NetworkModel::new(get_default_params(true))?;
        let background = model.calibrate_background(&default_targets())?;

        let expected = [
            (Population::Soma, 0.5),
            (Population::Dendrite, 1.4 + 0.5 * (1. - 0.5_f64.tanh())),
            (Population::Som, 0.2),
            (Population::Ndnf, 1.9),
            (Population::Pv, 1.1),
            (Population::Vip, 0.),
        ];
        for (population, value) in expected {
            assert!((background[population] - value).abs() < 1e-9, "{}: {}", population, background[population]);
        }

        Ok(())
    }

    #[test]
    pub fn test_mean_population_settles_at_targets() -> Result<(), MicrocircuitError> {
        assert_settles_at(get_default_params(true), &default_targets(), 1000., 1e-3)
    }

    #[test]
    pub fn test_custom_transfer_settles_at_targets() -> Result<(), MicrocircuitError> {
        let targets = default_targets();
        let model = NetworkModel::with_transfer(get_default_params(true), HyperbolicRelease)?
            .calibrate(&targets)?;

        // SOM inhibition of the dendrite is gated by 1 / (1 + 0.5) at the NDNF target
        let expected_dendrite = 1.4 + 0.5 / 1.5;
        assert!((model.background()[Population::Dendrite] - expected_dendrite).abs() < 1e-9);

        let output = model.run(&RunParameters::new(2000., 1.))?;
        for population in Population::ALL {
            let mean = output.mean_rate(population)[output.steps()];
            let expected = if model.config().present()[population] { targets[population] } else { 0. };
            assert!((mean - expected).abs() < 1e-3, "{} settled at {}, expected {}", population, mean, expected);
        }
        assert!((output.release_probability[output.steps()] - 1. / 1.5).abs() < 1e-3);

        Ok(())
    }

    #[test]
    pub fn test_settles_at_non_uniform_targets() -> Result<(), MicrocircuitError> {
        let mut targets = default_targets();
        targets[Population::Soma] = 2.;
        targets[Population::Ndnf] = 0.5;
        targets[Population::Pv] = 1.5;

        assert_settles_at(get_default_params(true), &targets, 2000., 1e-3)
    }

    #[test]
    pub fn test_settles_with_vip() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.options.with_vip = true;

        assert_settles_at(config, &default_targets(), 2000., 1e-3)
    }

    #[test]
    pub fn test_settles_without_ndnf() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.options.with_ndnf = false;

        assert_settles_at(config, &default_targets(), 2000., 1e-3)
    }

    #[test]
    pub fn test_settles_with_som_adaptation() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.options.som_adaptation = Some(Adaptation::default());

        assert_settles_at(config, &default_targets(), 3000., 1e-2)
    }

    #[test]
    pub fn test_heterogeneous_population_means_settle() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(false);
        config.connection_probabilities = ConnectionProbabilities::default();
        config.options.heterogeneity = Some(Heterogeneity { spread: 0.1 });
        config.options.seed = Some(11);

        assert_settles_at(config, &default_targets(), 2000., 0.05)
    }

    #[test]
    pub fn test_singular_system_is_rejected() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.mean_weights.set(Projection::new(Population::Soma, Population::Soma), 1.);
        config.mean_weights.set(Projection::new(Population::Soma, Population::Pv), 0.);
        config.options.dendrite_coupling = 0.;

        let model = NetworkModel::new(config)?;
        let result = model.calibrate(&default_targets());

        assert!(matches!(
            result,
            Err(MicrocircuitError::Numerical(NumericalError::SingularCalibration { .. }))
        ));

        Ok(())
    }

    #[test]
    pub fn test_negative_target_is_rejected() -> Result<(), MicrocircuitError> {
        let model = NetworkModel::new(get_default_params(true))?;
        let mut targets = default_targets();
        targets[Population::Som] = -0.5;

        assert_eq!(
            model.calibrate_background(&targets),
            Err(MicrocircuitError::Configuration(
                ConfigurationError::NegativeTargetRate { population: Population::Som, value: -0.5 }
            )),
        );

        Ok(())
    }

    #[test]
    pub fn test_absent_populations_get_no_background() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(true);
        config.options.with_ndnf = false;

        let model = NetworkModel::new(config)?;
        let background = model.calibrate_background(&default_targets())?;

        assert_eq!(background[Population::Ndnf], 0.);
        assert_eq!(background[Population::Vip], 0.);
        // without NDNF the SOM synapse onto the dendrite is never depressed
        assert!((background[Population::Dendrite] - 1.5).abs() < 1e-9);

        Ok(())
    }

    #[test]
    pub fn test_supplied_background_is_used_verbatim() -> Result<(), MicrocircuitError> {
        let model = NetworkModel::new(get_default_params(true))?;
        let background = PopulationTable::filled(0.25);

        assert_eq!(model.with_background(background.clone()).background(), &background);

        Ok(())
    }
}
