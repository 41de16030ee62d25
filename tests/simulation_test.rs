use std::{fs, io::Write, path::Path};

use memsim::{
    config::Config,
    experiment,
    mmu::{IsMmu, Mmu},
    replace::{clock::Clock, lru::Lru, AccessResult, Algorithm},
    sim::{Simulation, SimulationResult},
    trace::{Op, Trace},
    Error,
};
use tempfile::TempDir;

fn write_trace(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn sim(algorithm: Algorithm, frames: usize) -> Simulation {
    Simulation {
        algorithm,
        frames,
        page_offset: 12,
        seed: Some(5),
        debug: false,
    }
}

#[test]
fn test_lru_scenario() {
    let mut mmu = Mmu::new(Lru::new(2).unwrap());
    let results = [mmu.read_page(1), mmu.read_page(2), mmu.read_page(3)];
    assert_eq!(results, [AccessResult::MissNoEvict; 3]);
    assert_eq!(mmu.total_page_faults(), 3);
    assert_eq!(mmu.total_disk_writes(), 0);
}

#[test]
fn test_clock_scenario() {
    let mut mmu = Mmu::new(Clock::new(2).unwrap());
    let results = [mmu.read_page(1), mmu.read_page(2), mmu.read_page(3)];
    assert_eq!(results, [AccessResult::MissNoEvict; 3]);
    assert_eq!(mmu.policy().circle().map(|(p, _)| p).collect::<Vec<_>>(), vec![3, 2]);
}

#[test]
fn test_dirty_eviction_scenario() {
    let mut mmu = Mmu::new(Lru::new(2).unwrap());
    mmu.write_page(1);
    mmu.read_page(2);
    assert_eq!(mmu.write_page(3), AccessResult::MissEvictDirty);
    assert_eq!(mmu.total_disk_reads(), 3);
    assert_eq!(mmu.total_disk_writes(), 1);
    assert_eq!(mmu.total_page_faults(), 3);
}

#[test]
fn test_repeat_read_is_hit() {
    for algorithm in Algorithm::ALL {
        let mut mmu = Mmu::new(algorithm.build(2, Some(1)).unwrap());
        mmu.read_page(1);
        let before = mmu.counters();
        assert_eq!(mmu.read_page(1), AccessResult::Hit);
        assert_eq!(mmu.counters(), before);
    }
}

#[test]
fn test_trace_file_run() {
    let dir = TempDir::new().unwrap();
    let path = write_trace(
        dir.path(),
        "small.trace",
        &[
            "00001000 W",
            "00002000 R",
            "",
            "00001fff R",
            "00003000 W",
            "00004000 R",
        ],
    );

    let result = sim(Algorithm::Lru, 2).run(&path).unwrap();
    assert_eq!(result.events, 5);
    // 1 and 2 load, 1 hits, 3 evicts 2 (clean), 4 evicts 1 (dirty).
    assert_eq!(result.page_faults, 4);
    assert_eq!(result.disk_reads, 4);
    assert_eq!(result.disk_writes, 1);
    assert!((result.fault_rate - 0.8).abs() < 1e-9);
}

#[test]
fn test_trace_blocks_preserve_order() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (0..1000).map(|i| format!("{:08x} R", i << 12)).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let path = write_trace(dir.path(), "long.trace", &refs);

    let trace = Trace::read(path, 12, 64, 2).unwrap().collect().unwrap();
    assert_eq!(trace.len(), 1000);
    assert!(trace.iter().enumerate().all(|(i, r)| r.page == i as u64 && r.op == Op::Read));
}

#[test]
fn test_xz_trace() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("small.trace.xz");
    let mut encoder = xz2::write::XzEncoder::new(fs::File::create(&path).unwrap(), 6);
    encoder.write_all(b"0000a000 R\n0000b000 W\n").unwrap();
    encoder.finish().unwrap();

    let refs = Trace::open(path, 12).unwrap().collect().unwrap();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].page, 0xa);
    assert_eq!(refs[1].op, Op::Write);
}

#[test]
fn test_malformed_trace_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_trace(dir.path(), "bad.trace", &["00001000 R", "00002000 Q"]);
    match sim(Algorithm::Clock, 4).run(&path) {
        Err(Error::MalformedTrace { line: 2, .. }) => {}
        other => panic!("expected malformed trace, got {other:?}"),
    }
}

#[test]
fn test_experiment_run_writes_results() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(
        dir.path(),
        "loop.trace",
        &["00001000 R", "00002000 W", "00003000 R", "00001000 R", "00002000 R"],
    );
    let results_file = dir.path().join("results.json");
    let config = Config::parse(
        &serde_json::json!({
            "seed": 3,
            "experiments": [{
                "name": "sweep",
                "description": "tiny sweep",
                "traces": [&trace, dir.path().join("missing.trace")],
                "algorithms": ["clock", "lru", "rand"],
                "frame_sizes": {"min": 1, "max": 3, "step": 1}
            }],
            "output": {"results_file": &results_file}
        })
        .to_string(),
    )
    .unwrap();

    let results = experiment::run(&config, 3).unwrap();
    assert_eq!(results.len(), 9);
    assert!(results.iter().all(|r| r.events == 5));
    assert!(results
        .iter()
        .all(|r| r.experiment_name.as_deref() == Some("sweep")));
    // Three frames hold the whole working set: only cold misses.
    assert!(results
        .iter()
        .filter(|r| r.frames == 3)
        .all(|r| r.page_faults == 3 && r.disk_writes == 0));
    assert_eq!(results[0].algorithm, Algorithm::Clock);
    assert_eq!(results[0].frames, 1);

    experiment::write_results(&config.output.results_file, &results).unwrap();
    let saved: Vec<SimulationResult> =
        serde_json::from_str(&fs::read_to_string(&results_file).unwrap()).unwrap();
    assert_eq!(saved.len(), results.len());
    for (saved, result) in saved.iter().zip(&results) {
        assert_eq!(saved.algorithm, result.algorithm);
        assert_eq!(saved.frames, result.frames);
        assert_eq!(saved.page_faults, result.page_faults);
        assert_eq!(saved.experiment_description.as_deref(), Some("tiny sweep"));
    }
}

#[test]
fn test_same_seed_reproduces_random_run() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (0..500u64)
        .map(|i| format!("{:x} {}", ((i * 37) % 19) << 12, if i % 4 == 0 { "W" } else { "R" }))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let path = write_trace(dir.path(), "rand.trace", &refs);

    let a = sim(Algorithm::Rand, 6).run(&path).unwrap();
    let b = sim(Algorithm::Rand, 6).run(&path).unwrap();
    assert_eq!(
        (a.page_faults, a.disk_reads, a.disk_writes),
        (b.page_faults, b.disk_reads, b.disk_writes)
    );
}
