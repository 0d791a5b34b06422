#[cfg(test)]
mod tests {
    use ndnf_microcircuit::{
        batch::{run_batch, sweep_release_strength},
        defaults::get_default_params,
        error::MicrocircuitError,
        model::{InitialConditions, NetworkModel, RunParameters},
        population::Population,
        weights::Heterogeneity,
    };

    #[test]
    pub fn test_batch_matches_sequential_runs() -> Result<(), MicrocircuitError> {
        let mut config = get_default_params(false);
        config.options.heterogeneity = Some(Heterogeneity::default());
        config.options.seed = Some(21);
        let model = NetworkModel::new(config)?;

        let params: Vec<RunParameters> = (0..6).map(|i| {
            let mut params = RunParameters::new(200., 1.);
            params.noise = 0.05;
            params.seed = Some(i);
            params.external_input.add_pulse(Population::Som, 200, 10, 50, 150, i as f64 * 0.2);

            params
        })
        .collect();

        let batch = run_batch(&model, &params);
        assert_eq!(batch.len(), params.len());

        for (output, run_params) in batch.into_iter().zip(params.iter()) {
            assert_eq!(output?, model.run(run_params)?);
        }

        Ok(())
    }

    #[test]
    pub fn test_batch_keeps_errors_in_place() -> Result<(), MicrocircuitError> {
        let model = NetworkModel::new(get_default_params(true))?;
        let params = vec![RunParameters::new(10., 1.), RunParameters::new(10., 0.), RunParameters::new(10., 1.)];

        let outputs = run_batch(&model, &params);

        assert!(outputs[0].is_ok());
        assert!(outputs[1].is_err());
        assert!(outputs[2].is_ok());

        Ok(())
    }

    #[test]
    pub fn test_stronger_presynaptic_inhibition_lowers_release() -> Result<(), MicrocircuitError> {
        let model = NetworkModel::new(get_default_params(true))?;
        let mut params = RunParameters::new(500., 1.);
        params.initial_conditions = InitialConditions::default().with_rate(Population::Ndnf, 1.);
        let strengths = [0., 0.25, 0.5, 1.];

        let outputs = sweep_release_strength(&model, &params, &strengths)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        assert!(outputs[0].release_probability.iter().all(|p| *p == 1.));
        for pair in outputs.windows(2) {
            let (weaker, stronger) = (&pair[0], &pair[1]);
            assert!(stronger.release_probability[0] < weaker.release_probability[0]);
        }

        assert!(sweep_release_strength(&model, &params, &[-1.])[0].is_err());

        Ok(())
    }
}
