//! List Codec CLI
//!
//! Small tool around the codec for producing and examining buffers.
//!
//! ## Commands
//!
//! - `sample <count> <path>`: write a list of `count` nodes with random pointers
//! - `inspect <path>`: print every record of a buffer
//! - `roundtrip <path>`: decode a buffer, re-encode it and compare topology
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: pretty)
//! - `LIST_CODEC_*`: serializer settings, see `SerializerConfig`
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin listcodec --features cli -- sample 10 list.bin
//! ```

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use linked_graph_codec::{build_chain, records, ListSerializer, ListSnapshot, NodeRef};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "listcodec=info,linked_graph_codec=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn usage() -> String {
    "usage: listcodec <sample COUNT PATH | inspect PATH | roundtrip PATH>".to_string()
}

/// Build a list whose random pointers follow a fixed stride, with a
/// self-reference and a missing pointer mixed in.
fn sample_list(count: usize) -> Vec<NodeRef> {
    let nodes = build_chain((0..count).map(|i| format!("node-{i}")));
    for (i, node) in nodes.iter().enumerate() {
        match i % 5 {
            0 => node.set_random(Some(node)),
            4 => {}
            _ => node.set_random(Some(&nodes[(i * 7 + 3) % count])),
        }
    }
    nodes
}

fn sample(serializer: &ListSerializer, count: &str, path: &str) -> CliResult {
    let count: usize = count.parse()?;
    if count == 0 {
        return Err("COUNT must be at least 1".into());
    }
    let nodes = sample_list(count);
    let mut file = File::create(path)?;
    serializer.serialize(&nodes[0], &mut file)?;
    info!(nodes = count, path, "Wrote sample list");
    Ok(())
}

fn inspect(path: &str) -> CliResult {
    let buffer = std::fs::read(path)?;
    let mut total = 0usize;
    for item in records(&buffer) {
        let (offset, record) = item?;
        println!(
            "{offset:>10}  id={:<8} next={:<8} random={:<8} len={:<6} {:?}",
            record.current.get(),
            record.next.map_or(0, |id| id.get()),
            record.random.map_or(0, |id| id.get()),
            record.data.len(),
            record.data,
        );
        total += 1;
    }
    info!(records = total, bytes = buffer.len(), "Inspected buffer");
    Ok(())
}

fn roundtrip(serializer: &ListSerializer, path: &str) -> CliResult {
    let mut reader = BufReader::new(File::open(path)?);
    let head = serializer.deserialize(&mut reader)?;
    let before = ListSnapshot::capture(&head);

    let reencoded = serializer.encode(&head)?;
    let after = ListSnapshot::capture(&serializer.decode(&reencoded)?);

    let matches = before == after;
    info!(
        nodes = before.len(),
        fingerprint = %format!("{:016x}", before.fingerprint()?),
        matches,
        "Round-trip complete"
    );
    if !matches {
        return Err("Topology changed across round-trip".into());
    }
    Ok(())
}

fn run(args: &[String]) -> CliResult {
    let serializer = ListSerializer::from_env()?;
    match args {
        [cmd, count, path] if cmd == "sample" => sample(&serializer, count, path),
        [cmd, path] if cmd == "inspect" => inspect(path),
        [cmd, path] if cmd == "roundtrip" => roundtrip(&serializer, path),
        _ => Err(usage().into()),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "listcodec failed");
            ExitCode::FAILURE
        }
    }
}
