use std::{path::Path, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    mmu::{IsMmu, Mmu},
    replace::Algorithm,
    trace::{Op, Reference, Trace},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trace_file: String,
    pub frames: usize,
    pub algorithm: Algorithm,
    pub events: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
    pub page_faults: u64,
    pub fault_rate: f64,
    pub hit_rate: f64,
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_description: Option<String>,
}

/// Settings for a single run.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub algorithm: Algorithm,
    pub frames: usize,
    pub page_offset: u32,
    pub seed: Option<u64>,
    pub debug: bool,
}

impl Simulation {
    pub fn build(&self) -> Result<Box<dyn IsMmu + Send>> {
        let repl = self.algorithm.build(self.frames, self.seed)?;
        let mut mmu = Mmu::new(repl);
        if self.debug {
            mmu.enable_debug_logging();
        }
        Ok(Box::new(mmu))
    }

    /// Replays the trace at `path` through a fresh MMU.
    pub fn run(&self, path: &Path) -> Result<SimulationResult> {
        let mut mmu = self.build()?;
        let trace = Trace::open(path.to_path_buf(), self.page_offset)?;

        let start = Instant::now();
        let mut events = 0;
        for block in trace.rec.iter() {
            events += operate(mmu.as_mut(), &block?);
        }
        let elapsed = start.elapsed().as_secs_f64();

        Ok(self.result(path, mmu.as_ref(), events, elapsed))
    }

    /// Replays an in-memory reference string through a fresh MMU.
    pub fn run_refs(&self, name: &str, refs: &[Reference]) -> Result<SimulationResult> {
        let mut mmu = self.build()?;
        let start = Instant::now();
        let events = operate(mmu.as_mut(), refs);
        let elapsed = start.elapsed().as_secs_f64();
        Ok(self.result(Path::new(name), mmu.as_ref(), events, elapsed))
    }

    fn result(
        &self,
        path: &Path,
        mmu: &(dyn IsMmu + Send),
        events: u64,
        execution_time: f64,
    ) -> SimulationResult {
        let counters = mmu.counters();
        let fault_rate = if events > 0 {
            counters.page_faults as f64 / events as f64
        } else {
            0.0
        };

        SimulationResult {
            trace_file: path.display().to_string(),
            frames: self.frames,
            algorithm: self.algorithm,
            events,
            disk_reads: counters.disk_reads,
            disk_writes: counters.disk_writes,
            page_faults: counters.page_faults,
            fault_rate,
            hit_rate: 1.0 - fault_rate,
            execution_time,
            experiment_name: None,
            experiment_description: None,
        }
    }
}

fn operate(mmu: &mut (dyn IsMmu + Send), refs: &[Reference]) -> u64 {
    for r in refs {
        match r.op {
            Op::Read => mmu.read_page(r.page),
            Op::Write => mmu.write_page(r.page),
        };
    }
    refs.len() as u64
}
