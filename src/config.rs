use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    replace::Algorithm,
    sim::Simulation,
    trace::DEFAULT_PAGE_OFFSET,
};

/// Frame counts to sweep: an explicit list, an inclusive linear range, or the
/// powers of two `2^min..=2^max`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FrameSizes {
    List(Vec<usize>),
    Linear { min: usize, max: usize, step: usize },
    Exponential { min: u32, max: u32 },
}

impl FrameSizes {
    pub fn expand(&self) -> Result<Vec<usize>> {
        let sizes: Vec<usize> = match self {
            FrameSizes::List(sizes) => sizes.clone(),
            FrameSizes::Linear { min, max, step } => {
                if *step == 0 {
                    return Err(Error::ZeroCapacity);
                }
                (*min..=*max).step_by(*step).collect()
            }
            FrameSizes::Exponential { min, max } => (*min..=*max)
                .map(|exp| 1usize.checked_shl(exp).ok_or(Error::ZeroCapacity))
                .collect::<Result<_>>()?,
        };
        if sizes.contains(&0) {
            return Err(Error::ZeroCapacity);
        }
        Ok(sizes)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExperimentConfig {
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub traces: Vec<PathBuf>,
    pub algorithms: Vec<String>,
    pub frame_sizes: FrameSizes,
    /// Only read from the single-experiment layout.
    pub output: Option<OutputConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OutputConfig {
    pub results_file: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum Experiments {
    Many(Vec<ExperimentConfig>),
    One(Box<ExperimentConfig>),
}

#[derive(Deserialize, Debug)]
struct RawConfig {
    experiments: Experiments,
    output: Option<OutputConfig>,
    page_offset: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug)]
pub struct Config {
    pub experiments: Vec<ExperimentConfig>,
    pub output: OutputConfig,
    pub page_offset: u32,
    pub seed: Option<u64>,
}

/// One simulation to run as part of an experiment.
#[derive(Debug, Clone)]
pub struct Job {
    pub experiment_name: String,
    pub experiment_description: String,
    pub trace: PathBuf,
    pub sim: Simulation,
}

impl Config {
    pub fn parse(config_str: &str) -> Result<Config> {
        let raw: RawConfig = serde_json::from_str(config_str)?;
        let (experiments, output) = match raw.experiments {
            Experiments::Many(experiments) => (experiments, raw.output),
            Experiments::One(experiment) => {
                let output = raw.output.or_else(|| experiment.output.clone());
                (vec![*experiment], output)
            }
        };
        let output = output.ok_or_else(|| {
            Error::Json(serde::de::Error::missing_field("output"))
        })?;

        let config = Config {
            experiments,
            output,
            page_offset: raw.page_offset.unwrap_or(DEFAULT_PAGE_OFFSET),
            seed: raw.seed,
        };
        config.jobs()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config> {
        Config::parse(&fs::read_to_string(path)?)
    }

    /// Expands every experiment into (trace, algorithm, frames) jobs, in
    /// trace-major order.
    pub fn jobs(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for (exp_idx, experiment) in self.experiments.iter().enumerate() {
            let name = experiment
                .name
                .clone()
                .unwrap_or_else(|| format!("experiment_{}", exp_idx + 1));
            let algorithms = experiment
                .algorithms
                .iter()
                .map(|a| a.parse())
                .collect::<Result<Vec<Algorithm>>>()?;
            let frame_sizes = experiment.frame_sizes.expand()?;

            for trace in &experiment.traces {
                for &algorithm in &algorithms {
                    for &frames in &frame_sizes {
                        let seed = self.seed.map(|s| s.wrapping_add(jobs.len() as u64));
                        jobs.push(Job {
                            experiment_name: name.clone(),
                            experiment_description: experiment.description.clone(),
                            trace: trace.clone(),
                            sim: Simulation {
                                algorithm,
                                frames,
                                page_offset: self.page_offset,
                                seed,
                                debug: false,
                            },
                        });
                    }
                }
            }
        }
        Ok(jobs)
    }
}
