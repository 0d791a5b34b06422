use std::{
    env,
    error::Error,
    fs::File,
    io::{self, BufWriter, ErrorKind, Write},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ndnf_microcircuit::{
    config::load_config,
    model::RunOutput,
    population::Population,
};


fn write_mean_traces(output: &RunOutput, writer: &mut impl Write) -> io::Result<()> {
    let means: Vec<_> = Population::ALL.iter()
        .map(|population| output.mean_rate(*population))
        .collect();

    write!(writer, "t")?;
    for population in Population::ALL {
        write!(writer, ",{}", population)?;
    }
    writeln!(writer, ",p,g")?;

    for (i, t) in output.time.iter().enumerate() {
        write!(writer, "{}", t)?;
        for mean in means.iter() {
            write!(writer, ",{}", mean[i])?;
        }
        writeln!(writer, ",{},{}", output.release_probability[i], output.gaba[i])?;
    }

    writer.flush()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        error!("usage: {} <config.toml> [output.csv]", args[0]);
        return Err(Box::new(io::Error::new(ErrorKind::InvalidInput, "Requires .toml argument file")));
    }

    let experiment = load_config(&args[1])?;
    info!(config = %args[1], calibrate = experiment.calibrate, "loaded configuration");

    let model = experiment.build_model()?;
    let output = model.run(&experiment.run).map_err(|err| {
        error!(%err, "run failed");
        err
    })?;

    let last = output.steps();
    info!(
        steps = last,
        soma = output.mean_rate(Population::Soma)[last],
        dendrite = output.mean_rate(Population::Dendrite)[last],
        release_probability = output.release_probability[last],
        "finished simulation"
    );

    match args.get(2) {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            write_mean_traces(&output, &mut file)?;
            info!(output = %path, "wrote mean traces");
        },
        None => {
            let mut stdout = BufWriter::new(io::stdout().lock());
            write_mean_traces(&output, &mut stdout)?;
        },
    }

    Ok(())
}
