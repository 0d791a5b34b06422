#![feature(test)]
extern crate test;


mod tests {
    use test::Bencher;
    extern crate ndnf_microcircuit;
    use ndnf_microcircuit::{
        batch::run_batch,
        defaults::get_default_params,
        model::{NetworkModel, RunParameters},
        population::Population,
        weights::Heterogeneity,
    };

    fn spatial_model() -> NetworkModel {
        let mut config = get_default_params(false);
        config.options.heterogeneity = Some(Heterogeneity::default());
        config.options.seed = Some(0);

        NetworkModel::new(config).expect("Could not build model")
    }

    fn noisy_runs(n: usize) -> Vec<RunParameters> {
        (0..n).map(|i| {
            let mut params = RunParameters::new(500., 1.);
            params.noise = 0.1;
            params.seed = Some(i as u64);
            params.external_input.add_pulse(Population::Som, params.steps(), 10, 100, 300, 1.);

            params
        })
        .collect()
    }

    #[bench]
    fn bench_reg_8_runs(b: &mut Bencher) {
        let model = spatial_model();
        let params = noisy_runs(8);

        b.iter(|| {
            for run_params in params.iter() {
                model.run(run_params).expect("Could not run model");
            }
        })
    }

    #[bench]
    fn bench_par_8_runs(b: &mut Bencher) {
        let model = spatial_model();
        let params = noisy_runs(8);

        b.iter(|| {
            for output in run_batch(&model, &params) {
                output.expect("Could not run model");
            }
        })
    }

    #[bench]
    fn bench_mean_population_run(b: &mut Bencher) {
        let model = NetworkModel::new(get_default_params(true)).expect("Could not build model");
        let params = RunParameters::new(1000., 1.);

        b.iter(|| model.run(&params).expect("Could not run model"))
    }
}
