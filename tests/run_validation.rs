#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use ndnf_microcircuit::{
        defaults::get_default_params,
        error::{ConfigurationError, MicrocircuitError, ShapeError},
        model::{ExternalInput, InitialConditions, InitialRate, NetworkModel, RunParameters},
        population::Population,
    };

    fn spatial_model() -> Result<NetworkModel, MicrocircuitError> {
        NetworkModel::new(get_default_params(false))
    }

    #[test]
    pub fn test_output_shapes() -> Result<(), MicrocircuitError> {
        let model = spatial_model()?;
        let output = model.run(&RunParameters::new(100., 0.1))?;

        assert_eq!(output.steps(), 1000);
        assert_eq!(output.time.len(), 1001);
        assert!((output.time[1000] - 100.).abs() < 1e-9);
        assert_eq!(output.rates(Population::Soma).dim(), (1001, 70));
        assert_eq!(output.rates(Population::Som).dim(), (1001, 10));
        assert_eq!(output.release_probability.len(), 1001);

        // default initial state
        assert!(output.rates(Population::Dendrite).row(0).iter().all(|rate| *rate == 1.));
        assert!(output.rates(Population::Soma).row(0).iter().all(|rate| *rate == 0.));

        Ok(())
    }

    #[test]
    pub fn test_zero_duration() -> Result<(), MicrocircuitError> {
        let output = spatial_model()?.run(&RunParameters::new(0., 1.))?;

        assert_eq!(output.steps(), 0);
        assert_eq!(output.rates(Population::Soma).dim(), (1, 70));

        Ok(())
    }

    #[test]
    pub fn test_wrong_timestep_count() -> Result<(), MicrocircuitError> {
        let model = spatial_model()?;
        let mut params = RunParameters::new(100., 1.);
        params.external_input = ExternalInput::none().with(Population::Som, Array2::zeros((99, 10)));

        assert_eq!(
            model.run(&params),
            Err(MicrocircuitError::Shape(
                ShapeError::TimestepMismatch { population: Population::Som, expected: 100, actual: 99 }
            )),
        );

        Ok(())
    }

    #[test]
    pub fn test_wrong_unit_count() -> Result<(), MicrocircuitError> {
        let model = spatial_model()?;
        let mut params = RunParameters::new(100., 1.);
        params.external_input = ExternalInput::zeros(100, &model.config().cell_counts);
        params.external_input.set(Population::Soma, Array2::zeros((100, 7)));

        assert_eq!(
            model.run(&params),
            Err(MicrocircuitError::Shape(
                ShapeError::UnitMismatch { population: Population::Soma, expected: 70, actual: 7 }
            )),
        );

        let mut params = RunParameters::new(100., 1.);
        params.initial_conditions.rates[Population::Pv] = Some(InitialRate::PerUnit(ndarray::Array1::zeros(3)));
        assert!(matches!(model.run(&params), Err(MicrocircuitError::Shape(ShapeError::UnitMismatch { .. }))));

        Ok(())
    }

    #[test]
    pub fn test_invalid_run_parameters() -> Result<(), MicrocircuitError> {
        let model = spatial_model()?;

        for (params, name) in [
            (RunParameters::new(100., 0.), "dt"),
            (RunParameters::new(100., -1.), "dt"),
            (RunParameters::new(-5., 1.), "duration"),
            (RunParameters { noise: -0.1, ..RunParameters::new(10., 1.) }, "noise"),
            (
                RunParameters {
                    initial_conditions: InitialConditions::default().with_init_noise(-1.),
                    ..RunParameters::new(10., 1.)
                },
                "init_noise",
            ),
            (
                RunParameters {
                    initial_conditions: InitialConditions::default().with_release_probability(1.5),
                    ..RunParameters::new(10., 1.)
                },
                "release_probability",
            ),
        ] {
            match model.run(&params) {
                Err(MicrocircuitError::Configuration(ConfigurationError::InvalidRunParameter { name: found, .. })) => {
                    assert_eq!(found, name);
                },
                other => panic!("expected invalid {}, got {:?}", name, other.map(|output| output.steps())),
            }
        }

        Ok(())
    }

    #[test]
    pub fn test_per_unit_initial_rates() -> Result<(), MicrocircuitError> {
        let model = spatial_model()?;
        let initial = ndarray::Array1::from_shape_fn(10, |i| i as f64 * 0.1);

        let mut params = RunParameters::new(5., 1.);
        params.initial_conditions.rates[Population::Som] = Some(InitialRate::PerUnit(initial.clone()));

        let output = model.run(&params)?;
        assert_eq!(output.rates(Population::Som).row(0), initial);

        Ok(())
    }

    #[test]
    pub fn test_rates_stay_non_negative_without_noise() -> Result<(), MicrocircuitError> {
        let model = spatial_model()?;
        let mut params = RunParameters::new(300., 1.);
        params.external_input.add_pulse(Population::Pv, 300, 10, 50, 250, 10.);

        let output = model.run(&params)?;
        for population in Population::ALL {
            assert!(output.rates(population).iter().all(|rate| *rate >= 0.));
        }

        Ok(())
    }
}
