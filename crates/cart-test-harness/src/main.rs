//! Trace-driven cartridge verification harness.
//!
//! Plays scripted bus traces against the engine on a simulated port
//! and reports, per trace: expected-byte mismatches and any drive
//! recorded outside the mapped window (bus contention, which must be
//! impossible by construction). With no trace files it runs a
//! built-in suite over synthetic images of every supported scheme.
//!
//! Trace files are JSON:
//!
//! ```json
//! {
//!   "name": "f8-switch",
//!   "scheme": "F8",
//!   "cycles": [
//!     { "addr": 8185 },
//!     { "addr": 4096, "expect": 16 }
//!   ]
//! }
//! ```

use std::path::PathBuf;
use std::process;

use cart_2600::{Cartridge, CycleOutcome};
use cart_core::{BusCycle, DriveRecord, SimPort};
use format_a26::{BANK_SIZE, BankScheme, RomImage};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

// ---------------------------------------------------------------------------
// Trace file format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TraceFile {
    name: String,
    /// Scheme tag: "none", "F8", "F6", "F4", "FE".
    scheme: String,
    #[serde(default)]
    superchip: bool,
    cycles: Vec<TraceCycle>,
}

#[derive(Debug, Deserialize)]
struct TraceCycle {
    addr: u16,
    #[serde(default)]
    write: bool,
    #[serde(default)]
    halt: bool,
    /// Byte the console holds on the data lines (write cycles).
    #[serde(default)]
    data: Option<u8>,
    /// Byte the engine must drive on this cycle, if checked.
    #[serde(default)]
    expect: Option<u8>,
}

fn parse_scheme(name: &str) -> Option<BankScheme> {
    match name.to_ascii_uppercase().as_str() {
        "NONE" => Some(BankScheme::None),
        "F8" => Some(BankScheme::F8),
        "F6" => Some(BankScheme::F6),
        "F4" => Some(BankScheme::F4),
        "FE" => Some(BankScheme::Fe),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Report format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Report {
    traces: Vec<TraceResult>,
    passed: usize,
    failed: usize,
}

#[derive(Debug, Serialize)]
struct TraceResult {
    name: String,
    scheme: String,
    image_sha1: String,
    cycles: usize,
    mismatches: Vec<Mismatch>,
    /// Drives recorded outside the mapped window. Always zero unless
    /// the engine itself is defective.
    contention: usize,
    passed: bool,
}

#[derive(Debug, Serialize)]
struct Mismatch {
    cycle: usize,
    addr: u16,
    expected: u8,
    got: Option<u8>,
}

// ---------------------------------------------------------------------------
// Trace execution
// ---------------------------------------------------------------------------

/// Synthetic image: high nibble = bank, low nibble = offset low bits.
fn patterned_image(scheme: BankScheme, superchip: bool) -> RomImage {
    let len = scheme.valid_sizes()[0];
    let data: Vec<u8> = (0..len)
        .map(|i| (((i / BANK_SIZE) << 4) | (i & 0x0F)) as u8)
        .collect();
    RomImage::load_with_options(data, Some(scheme), superchip).expect("synthetic image is valid")
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn run_trace(trace: &TraceFile, image: RomImage) -> TraceResult {
    let scheme = image.scheme();
    let image_sha1 = sha1_hex(image.data());
    let mut cart = Cartridge::new(image, SimPort::new());
    let mut mismatches = Vec::new();

    for (i, cycle) in trace.cycles.iter().enumerate() {
        if let Some(data) = cycle.data {
            cart.port_mut().set_console_data(data);
        }
        cart.port_mut().push(BusCycle {
            address: cycle.addr,
            is_write: cycle.write,
            halted: cycle.halt,
        });
        let outcome = match cart.run_cycle() {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("{}: fault at cycle {i}: {err}", trace.name);
                mismatches.push(Mismatch {
                    cycle: i,
                    addr: cycle.addr,
                    expected: cycle.expect.unwrap_or(0),
                    got: None,
                });
                break;
            }
        };
        if let Some(expected) = cycle.expect {
            let got = match outcome {
                CycleOutcome::Rom(b) | CycleOutcome::Ram(b) => Some(b),
                _ => None,
            };
            if got != Some(expected) {
                mismatches.push(Mismatch {
                    cycle: i,
                    addr: cycle.addr,
                    expected,
                    got,
                });
            }
        }
    }

    let contention = cart
        .port()
        .records()
        .iter()
        .filter(|(cycle, record)| {
            matches!(record, DriveRecord::Driven(_)) && cycle.address & 0x1000 == 0
        })
        .count();

    let passed = mismatches.is_empty() && contention == 0;
    TraceResult {
        name: trace.name.clone(),
        scheme: scheme.to_string(),
        image_sha1,
        cycles: trace.cycles.len(),
        mismatches,
        contention,
        passed,
    }
}

// ---------------------------------------------------------------------------
// Built-in suite
// ---------------------------------------------------------------------------

fn cycle(addr: u16) -> TraceCycle {
    TraceCycle {
        addr,
        write: false,
        halt: false,
        data: None,
        expect: None,
    }
}

fn expect(addr: u16, byte: u8) -> TraceCycle {
    TraceCycle {
        expect: Some(byte),
        ..cycle(addr)
    }
}

fn builtin_suite() -> Vec<TraceFile> {
    vec![
        TraceFile {
            name: "flat-2k".into(),
            scheme: "none".into(),
            superchip: false,
            cycles: vec![expect(0x1000, 0x00), expect(0x100F, 0x0F), cycle(0x0280)],
        },
        TraceFile {
            name: "f8-switch".into(),
            scheme: "F8".into(),
            superchip: false,
            // Powers up in bank 1, hotspots walk both banks
            cycles: vec![
                expect(0x1000, 0x10),
                cycle(0x1FF8),
                expect(0x1000, 0x00),
                expect(0x1FFF, 0x0F),
                cycle(0x1FF9),
                expect(0x1000, 0x10),
            ],
        },
        TraceFile {
            name: "f6-walk".into(),
            scheme: "F6".into(),
            superchip: false,
            cycles: vec![
                cycle(0x1FF6),
                expect(0x1002, 0x02),
                cycle(0x1FF7),
                expect(0x1002, 0x12),
                cycle(0x1FF8),
                expect(0x1002, 0x22),
                cycle(0x1FF9),
                expect(0x1002, 0x32),
            ],
        },
        TraceFile {
            name: "f4-walk".into(),
            scheme: "F4".into(),
            superchip: false,
            cycles: vec![
                cycle(0x1FF4),
                expect(0x1000, 0x00),
                cycle(0x1FFB),
                expect(0x1000, 0x70),
            ],
        },
        TraceFile {
            name: "fe-jsr".into(),
            scheme: "FE".into(),
            superchip: false,
            cycles: vec![
                expect(0x1000, 0x00),
                cycle(0x01FE),
                expect(0xD004, 0x14),
                cycle(0x01FE),
                expect(0xF004, 0x04),
            ],
        },
        TraceFile {
            name: "f8sc-ram".into(),
            scheme: "F8".into(),
            superchip: true,
            cycles: vec![
                TraceCycle {
                    data: Some(0x5A),
                    ..cycle(0x1010)
                },
                expect(0x1090, 0x5A),
            ],
        },
        TraceFile {
            name: "halt-gate".into(),
            scheme: "none".into(),
            superchip: false,
            cycles: vec![
                TraceCycle {
                    halt: true,
                    ..cycle(0x1000)
                },
                TraceCycle {
                    halt: true,
                    ..cycle(0x1FFF)
                },
                expect(0x1003, 0x03),
            ],
        },
    ]
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

struct CliArgs {
    trace_paths: Vec<PathBuf>,
    out_path: Option<PathBuf>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        trace_paths: Vec::new(),
        out_path: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                i += 1;
                cli.out_path = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                eprintln!("Usage: cart-test-harness [OPTIONS] [TRACE.json ...]");
                eprintln!();
                eprintln!("With no trace files, runs the built-in suite.");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --out <file>  Write the JSON report to a file instead of stdout");
                process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
            path => {
                cli.trace_paths.push(PathBuf::from(path));
            }
        }
        i += 1;
    }

    cli
}

fn load_traces(cli: &CliArgs) -> Vec<TraceFile> {
    if cli.trace_paths.is_empty() {
        return builtin_suite();
    }
    let mut traces = Vec::new();
    for path in &cli.trace_paths {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                process::exit(1);
            }
        };
        match serde_json::from_str::<TraceFile>(&text) {
            Ok(trace) => traces.push(trace),
            Err(err) => {
                eprintln!("{}: bad trace file: {err}", path.display());
                process::exit(1);
            }
        }
    }
    traces
}

fn main() {
    let cli = parse_args();
    let traces = load_traces(&cli);

    let mut results = Vec::new();
    for trace in &traces {
        let Some(scheme) = parse_scheme(&trace.scheme) else {
            eprintln!("{}: unknown scheme {:?}", trace.name, trace.scheme);
            process::exit(1);
        };
        let image = patterned_image(scheme, trace.superchip);
        let result = run_trace(trace, image);
        let status = if result.passed { "ok" } else { "FAILED" };
        eprintln!(
            "{:<12} {:<5} {:>4} cycles  {status}",
            result.name, result.scheme, result.cycles
        );
        results.push(result);
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    let report = Report {
        traces: results,
        passed,
        failed,
    };

    let json = serde_json::to_string_pretty(&report).expect("report serializes");
    match &cli.out_path {
        Some(path) => {
            if let Err(err) = std::fs::write(path, json) {
                eprintln!("{}: {err}", path.display());
                process::exit(1);
            }
        }
        None => println!("{json}"),
    }

    if failed > 0 {
        process::exit(1);
    }
}
