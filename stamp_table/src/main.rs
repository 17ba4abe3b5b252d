//! stamp_table: interactive entry point.
//!
//! ```text
//! stamp_table [--quick] [--output json|midi|silent] [--record out.mid] [script]
//! ```
//!
//! Without a script, touch commands are read from stdin.  Everything but
//! JSON output goes to stderr so stdout can be piped into the audio bridge.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use stamp_table::{load_script, run, AppConfig, AppError, LineTouchSource, OutputKind, RunSummary};
use tracing_subscriber::EnvFilter;

struct Args {
    quick:  bool,
    output: Option<OutputKind>,
    record: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║            Stamp Table · Touch Stamp Controller              ║");
    eprintln!("╚══════════════════════════════════════════════════════════════╝");
    eprintln!();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("Error: {msg}");
            eprintln!(
                "usage: stamp_table [--quick] [--output json|midi|silent] [--record FILE] [SCRIPT]"
            );
            std::process::exit(2);
        }
    };

    let mut cfg = if args.quick {
        eprintln!("  Quick-start: standard stamps, 60 fps, JSON on stdout\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };
    if let Some(output) = args.output {
        cfg.output = output;
    }
    if args.record.is_some() {
        cfg.record_midi = args.record;
    }

    let result = match args.script {
        Some(path) => load_script(&path).and_then(|source| run(cfg, source)),
        None => {
            eprintln!("  Reading touch commands from stdin (frame / add / remove / wait / quit)\n");
            run(cfg, LineTouchSource::new(io::BufReader::new(io::stdin())))
        }
    };

    match result {
        Ok(summary) => print_summary(&summary),
        Err(e) => exit_with(e),
    }
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args { quick: false, output: None, record: None, script: None };
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--quick" => args.quick = true,
            "--output" => {
                let v = it.next().ok_or("--output needs a value")?;
                args.output = Some(v.parse().map_err(|e| format!("{e}"))?);
            }
            "--record" => {
                let v = it.next().ok_or("--record needs a file name")?;
                args.record = Some(PathBuf::from(v));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            path => {
                if args.script.replace(PathBuf::from(path)).is_some() {
                    return Err("only one script may be given".into());
                }
            }
        }
    }
    Ok(args)
}

fn configure_interactively() -> AppConfig {
    let mut cfg = AppConfig::default();

    cfg.output = loop {
        match read_line("  Output: 1=JSON  2=MIDI  3=Silent (default 1): ").trim() {
            "" | "1" => break OutputKind::Json,
            "2"      => break OutputKind::Midi,
            "3"      => break OutputKind::Silent,
            _        => eprintln!("    ⚠  1–3 only."),
        }
    };

    cfg.frame_rate_hz = read_line("  Frame rate Hz (default 60): ")
        .trim().parse::<u32>().unwrap_or(60).clamp(1, 240);
    cfg.capture_ms = read_line("  Capture window ms (default 5000): ")
        .trim().parse::<u64>().unwrap_or(5000).clamp(100, 60_000);
    cfg.stamp_size = read_line("  Stud spacing (default 64): ")
        .trim().parse::<f64>().ok().filter(|s| s.is_finite() && *s > 0.0).unwrap_or(64.0);
    cfg.matcher.tolerance = read_line("  Match tolerance (default 30): ")
        .trim().parse::<f64>().ok().filter(|t| t.is_finite() && *t >= 0.0).unwrap_or(30.0);
    eprintln!();
    cfg
}

fn print_summary(s: &RunSummary) {
    eprintln!();
    eprintln!("  Frames:   {}", s.frames);
    eprintln!("  Added:    {}   Removed: {}   Refused: {}", s.added, s.removed, s.refused);
    eprintln!("  Commands: {}", s.commands);
    eprintln!("  Objects left on the table: {}", s.objects);
    eprintln!();
}

fn exit_with(e: AppError) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}

fn read_line(prompt: &str) -> String {
    eprint!("{}", prompt);
    io::stderr().flush().ok();
    let mut buf = String::new();
    io::stdin().lock().read_line(&mut buf).ok();
    buf
}
