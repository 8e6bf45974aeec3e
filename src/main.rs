//! ts-mapper entry point: CLI wiring, logging setup and config-driven runs.

mod cli;

use std::process;

use tracing_subscriber::EnvFilter;
use ts_mapper::config::StudyConfig;
use ts_mapper::io::{CsvObserver, write_summary_json};
use ts_mapper::mapping::MappingObserver;
use ts_mapper::runner::Study;

use crate::cli::{CliOptions, Command};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn load_config(opts: &CliOptions) -> StudyConfig {
    let loaded = match (&opts.config, &opts.preset) {
        (Some(path), _) => StudyConfig::from_toml_file(path),
        (None, Some(name)) => StudyConfig::from_preset(name),
        (None, None) => StudyConfig::from_preset("demo"),
    };
    let config = loaded.unwrap_or_else(|e| fail(e));

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn main() {
    init_tracing();

    let opts = match cli::parse_args() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            cli::print_usage();
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };

    let config = load_config(&opts);
    let study = Study::prepare(&config).unwrap_or_else(|e| fail(e));

    let mut csv = opts
        .assignments_out
        .as_deref()
        .map(CsvObserver::create)
        .transpose()
        .unwrap_or_else(|e| fail(format!("failed to create assignments CSV: {e}")));

    let mut extra: Vec<&mut dyn MappingObserver> = Vec::new();
    if let Some(obs) = csv.as_mut() {
        extra.push(obs);
    }
    let summary = study.run(&mut extra).unwrap_or_else(|e| fail(e));
    drop(extra);

    if let (Some(obs), Some(path)) = (csv, &opts.assignments_out) {
        let rows = obs.rows();
        if let Err(e) = obs.finish() {
            fail(format!("failed to write assignments CSV: {e}"));
        }
        eprintln!("{rows} assignments written to {}", path.display());
    }

    println!("{summary}");

    if let Some(path) = &opts.summary_out {
        if let Err(e) = write_summary_json(&summary, path) {
            fail(format!("failed to write summary JSON: {e}"));
        }
        eprintln!("Summary written to {}", path.display());
    }
}
