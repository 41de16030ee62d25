use std::{
    fs,
    io::{self, BufRead, BufReader, Read},
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{Receiver, Sender};
use xz2::read::XzDecoder;

use crate::{
    error::{Error, Result},
    resident::PageNumber,
};

/// Default page size is 4 KiB.
pub const DEFAULT_PAGE_OFFSET: u32 = 12;

const DEFAULT_BLOCK_SIZE: usize = 4096;
const DEFAULT_QUEUE_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub page: PageNumber,
    pub op: Op,
}

/// Parses one `<hex-address> <R|W>` trace line. `line_no` is only used for
/// error reporting.
pub fn parse_line(line: &str, page_offset: u32, line_no: usize) -> Result<Reference> {
    let malformed = |reason: String| Error::MalformedTrace {
        line: line_no,
        reason,
    };

    let mut fields = line.split_whitespace();
    let (addr, op) = match (fields.next(), fields.next(), fields.next()) {
        (Some(addr), Some(op), None) => (addr, op),
        _ => return Err(malformed(format!("expected `<address> <R|W>`, got {line:?}"))),
    };

    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    let addr = u64::from_str_radix(digits, 16)
        .map_err(|e| malformed(format!("bad address {addr:?}: {e}")))?;
    let page = addr.checked_shr(page_offset).unwrap_or(0);

    let op = match op {
        "R" | "r" => Op::Read,
        "W" | "w" => Op::Write,
        other => return Err(malformed(format!("unknown operation {other:?}"))),
    };

    Ok(Reference { page, op })
}

fn open(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    let file = fs::File::open(path)?;
    if path.extension().map_or(false, |ext| ext == "xz") {
        Ok(Box::new(XzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Streams a trace file as blocks of page references, parsed on a background
/// thread. A parse or I/O error ends the stream after being delivered.
pub struct Trace {
    pub rec: Receiver<Result<Vec<Reference>>>,
    _thread: JoinHandle<()>,
}

impl Trace {
    pub fn open(path: PathBuf, page_offset: u32) -> Result<Trace> {
        Trace::read(path, page_offset, DEFAULT_BLOCK_SIZE, DEFAULT_QUEUE_SIZE)
    }

    pub fn read(
        path: PathBuf,
        page_offset: u32,
        refs_per_block: usize,
        blocks_per_queue: usize,
    ) -> Result<Trace> {
        let stream = open(&path)?;
        let (sender, receiver) = crossbeam::channel::bounded(blocks_per_queue);

        let t = thread::spawn(move || {
            Trace::run_thread(stream, page_offset, refs_per_block.max(1), sender)
        });

        Ok(Trace {
            rec: receiver,
            _thread: t,
        })
    }

    fn run_thread(
        stream: Box<dyn Read + Send>,
        page_offset: u32,
        refs_per_block: usize,
        queue: Sender<Result<Vec<Reference>>>,
    ) {
        let mut block = Vec::with_capacity(refs_per_block);
        for (idx, line) in BufReader::new(stream).lines().enumerate() {
            let parsed = line
                .map_err(Error::from)
                .and_then(|line| match line.trim() {
                    "" => Ok(None),
                    line => parse_line(line, page_offset, idx + 1).map(Some),
                });
            match parsed {
                Ok(Some(reference)) => block.push(reference),
                Ok(None) => {}
                Err(err) => {
                    let _ = queue.send(Err(err));
                    return;
                }
            }

            if block.len() == refs_per_block {
                let full = std::mem::replace(&mut block, Vec::with_capacity(refs_per_block));
                if queue.send(Ok(full)).is_err() {
                    return;
                }
            }
        }

        if !block.is_empty() {
            let _ = queue.send(Ok(block));
        }
    }

    /// Drains the whole trace into memory.
    pub fn collect(self) -> Result<Vec<Reference>> {
        let mut refs = Vec::new();
        for block in self.rec.iter() {
            refs.extend(block?);
        }
        Ok(refs)
    }
}
