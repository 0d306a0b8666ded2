use anyhow::{Context, Result};
use clap::Parser;
use dimcal::{
    cli::Cli,
    clock::ThreadClock,
    config::CalibrationConfig,
    dimmer::HttpDimmerAdmin,
    loadgen::{K6Generator, LoadGeneratorDriver},
    orchestrator::{CalibrationRun, Experiment},
    report::CalibrationReport,
    reseed::HttpReseeder,
    sampler::build_sampler,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber: INFO by default, TRACE with --debug
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Load the configuration and apply command-line overrides
fn load_config(args: &Cli) -> Result<CalibrationConfig> {
    let mut config = CalibrationConfig::from_file(&args.config)
        .with_context(|| format!("Cannot use configuration {}", args.config.display()))?;

    if let Some(strategy) = args.sampler {
        config.sampler.strategy = strategy;
    }
    if let Some(seed) = args.seed {
        config.sampler.seed = Some(seed);
    }

    Ok(config)
}

/// Wire the HTTP collaborators and run every trial
fn run_calibration(config: &CalibrationConfig) -> Result<CalibrationRun> {
    let paths = config.dimmable_component_paths.clone();
    let profile = config.load_profile;

    let sampler = build_sampler(
        config.sampler.strategy,
        profile.num_iterations,
        paths.len(),
        config.sampler.scramble(),
        config.sampler.seed,
    );

    let dimmer = HttpDimmerAdmin::new(
        config.admin_base_url(),
        config.endpoints.training_resource.clone(),
        config.timeouts.admin(),
    )
    .context("Failed to create dimmer admin client")?;

    let load_generator = match config.load_generator.driver {
        LoadGeneratorDriver::K6 => K6Generator::new(config.k6_base_url(), config.timeouts.admin())
            .context("Failed to create k6 client")?,
    };

    let experiment = Experiment::new(paths, profile, sampler, dimmer, load_generator, ThreadClock);

    let run = match config.reseed_target() {
        Some(target) => {
            let reseeder = HttpReseeder::new(target.base_url, target.rows, config.timeouts.reseed())
                .context("Failed to create reseeding client")?;
            experiment.with_reseeder(reseeder).run()?
        }
        None => experiment.run()?,
    };

    Ok(run)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(&args)?;

    if args.check {
        println!(
            "Configuration OK: {} components, {} trials, {} sampler",
            config.dimmable_component_paths.len(),
            config.load_profile.num_iterations,
            config.sampler.strategy
        );
        return Ok(());
    }

    let run = run_calibration(&config)?;

    let report = CalibrationReport::new(&run, config.sampler.strategy);
    let rendered = report
        .render(args.format)
        .context("Failed to render calibration report")?;
    println!("{}", rendered);

    Ok(())
}
