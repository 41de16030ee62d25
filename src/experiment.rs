use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use crate::{
    config::{Config, Job},
    error::Result,
    replace::Algorithm,
    sim::SimulationResult,
};

const SUMMARY_FRAMES: [usize; 3] = [50, 100, 200];

/// Runs every job of `config`, using up to `jobs` worker threads.
///
/// Jobs whose trace file does not exist are skipped. Results come back in job
/// order regardless of which worker finished first.
pub fn run(config: &Config, jobs: usize) -> Result<Vec<SimulationResult>> {
    let planned = config.jobs()?;
    let (runnable, missing): (Vec<_>, Vec<_>) =
        planned.into_iter().partition(|job| job.trace.exists());

    let mut warned = BTreeSet::new();
    for job in &missing {
        if warned.insert(job.trace.clone()) {
            log::warn!("{} not found, skipping", job.trace.display());
        }
    }

    let total = runnable.len();
    log::info!("running {total} simulations on {} workers", jobs.max(1));

    let (job_tx, job_rx) = crossbeam::channel::unbounded::<(usize, Job)>();
    let (res_tx, res_rx) = crossbeam::channel::unbounded();
    for job in runnable.into_iter().enumerate() {
        // Receiver is alive until the scope below ends.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    crossbeam::thread::scope(|s| {
        for _ in 0..jobs.max(1) {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            s.spawn(move |_| {
                for (idx, job) in job_rx.iter() {
                    let result = run_job(&job);
                    if res_tx.send((idx, result)).is_err() {
                        return;
                    }
                }
            });
        }
    })
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "simulation worker panicked"))?;
    drop(res_tx);

    let mut results: Vec<_> = res_rx.iter().collect();
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, result)| result).collect()
}

fn run_job(job: &Job) -> Result<SimulationResult> {
    log::info!(
        "{}: {} {} frames on {}",
        job.experiment_name,
        job.sim.algorithm,
        job.sim.frames,
        job.trace.display()
    );
    let mut result = job.sim.run(&job.trace)?;
    result.experiment_name = Some(job.experiment_name.clone());
    result.experiment_description = Some(job.experiment_description.clone());
    Ok(result)
}

pub fn write_results(path: &Path, results: &[SimulationResult]) -> Result<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Fault rate, hit rate and run time per algorithm at a few fixed frame
/// counts, grouped by trace.
pub fn summary(results: &[SimulationResult]) -> String {
    let mut by_trace: BTreeMap<&str, Vec<&SimulationResult>> = BTreeMap::new();
    for result in results {
        by_trace.entry(result.trace_file.as_str()).or_default().push(result);
    }

    let mut out = String::from("=== EXPERIMENT SUMMARY ===\n");
    for (trace, trace_results) in by_trace {
        let name = Path::new(trace)
            .file_stem()
            .map_or_else(|| trace.to_string(), |s| s.to_string_lossy().into_owned());
        out.push_str(&format!("\n{name}:\n"));

        for frames in SUMMARY_FRAMES {
            let at_level: Vec<_> = trace_results
                .iter()
                .filter(|r| r.frames == frames)
                .collect();
            if at_level.is_empty() {
                continue;
            }
            out.push_str(&format!("  At {frames} frames:\n"));
            for algorithm in Algorithm::ALL {
                if let Some(r) = at_level.iter().find(|r| r.algorithm == algorithm) {
                    out.push_str(&format!(
                        "    {}: fault rate = {:.4}, hit rate = {:.4}, time = {:.3}s\n",
                        algorithm.as_str().to_uppercase(),
                        r.fault_rate,
                        r.hit_rate,
                        r.execution_time
                    ));
                }
            }
        }
    }
    out
}
