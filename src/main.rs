use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use memsim::{
    config::Config,
    experiment,
    replace::Algorithm,
    sim::Simulation,
    trace::DEFAULT_PAGE_OFFSET,
};

fn main() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();
    let debug = args.contains("--debug");

    let log_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_str: Option<String> = if let Some(config_str) = args.opt_value_from_str("--config")? {
        Some(config_str)
    } else if let Some(config_path) = args.opt_value_from_str::<_, PathBuf>("-p")? {
        Some(
            fs::read_to_string(&config_path)
                .with_context(|| format!("Could not read config {}", config_path.display()))?,
        )
    } else {
        None
    };

    match config_str {
        Some(config_str) => {
            let jobs: usize = args
                .opt_value_from_str("--jobs")
                .context("--jobs should be an integer")?
                .unwrap_or(1);
            finish(args)?;

            let config = Config::parse(&config_str).context("Invalid experiment config")?;
            let results = experiment::run(&config, jobs)?;
            experiment::write_results(&config.output.results_file, &results)?;
            println!("Results saved to {}", config.output.results_file.display());
            println!("{}", experiment::summary(&results));
        }
        None => {
            let trace: PathBuf = args
                .opt_value_from_str("-t")?
                .context("Must provide a trace with -t, or experiments with --config/-p")?;
            let frames: usize = args
                .opt_value_from_str("-f")
                .context("-f should be an integer")?
                .context("Must provide a frame count with -f")?;
            let algorithm: Algorithm = args
                .opt_value_from_str("-a")?
                .context("Must provide an algorithm with -a (clock, lru, rand)")?;
            let page_offset: u32 = args
                .opt_value_from_str("--page-offset")
                .context("--page-offset should be an integer")?
                .unwrap_or(DEFAULT_PAGE_OFFSET);
            let seed: Option<u64> = args
                .opt_value_from_str("--seed")
                .context("--seed should be an integer")?;
            let json: Option<PathBuf> = args.opt_value_from_str("--json")?;
            finish(args)?;

            let sim = Simulation {
                algorithm,
                frames,
                page_offset,
                seed,
                debug,
            };
            let result = sim
                .run(&trace)
                .with_context(|| format!("Simulation of {} failed", trace.display()))?;

            println!("events:      {}", result.events);
            println!("disk reads:  {}", result.disk_reads);
            println!("disk writes: {}", result.disk_writes);
            println!("page faults: {}", result.page_faults);
            println!("fault rate:  {:.4}", result.fault_rate);

            if let Some(json) = json {
                experiment::write_results(&json, std::slice::from_ref(&result))?;
            }
        }
    }

    Ok(())
}

fn finish(args: pico_args::Arguments) -> Result<()> {
    let rest = args.finish();
    if !rest.is_empty() {
        bail!("Unrecognized arguments: {rest:?}");
    }
    Ok(())
}
