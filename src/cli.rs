use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub assignments_out: Option<PathBuf>,
    pub summary_out: Option<PathBuf>,
}

pub enum Command {
    Run(CliOptions),
    Help,
}

pub fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<Command, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut assignments_out = None;
    let mut summary_out = None;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--assignments-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --assignments-out (expected a CSV file path)",
                )?;
                if assignments_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--assignments-out provided more than once".to_string());
                }
            }
            "--summary-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --summary-out (expected a JSON file path)",
                )?;
                if summary_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--summary-out provided more than once".to_string());
                }
            }
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if config.is_none() && preset.is_none() {
        preset = Some("demo".to_string());
    }

    Ok(Command::Run(CliOptions {
        config,
        preset,
        assignments_out,
        summary_out,
    }))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("ts-mapper: map time series onto power network equipment");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  ts-mapper [--config <path> | --preset <name>] [--assignments-out <csv>] [--summary-out <json>]"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>            Load a study from a TOML file");
    eprintln!("  --preset <name>            Use a built-in study (demo, synthetic)");
    eprintln!("  --assignments-out <path>   Write every assignment to CSV");
    eprintln!("  --summary-out <path>       Write the run summary as JSON");
    eprintln!("  --help                     Show this help message");
    eprintln!();
    eprintln!("If neither --config nor --preset is given, the demo preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}
