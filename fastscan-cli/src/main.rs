use anyhow::{bail, Context, Result};
use clap::Parser;
use fastscan::{scan_file_with_config, ScanConfig};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Locate a literal byte pattern in a file", long_about = None)]
struct Cli {
    /// File to scan
    path: PathBuf,

    /// Literal byte pattern to locate
    pattern: String,

    /// Maximum number of offsets to report
    #[arg(default_value_t = 100)]
    cap: i32,

    /// Number of worker threads
    #[arg(short = 'j', long = "threads")]
    threads: Option<NonZeroUsize>,

    /// Show only the match count
    #[arg(short = 's', long = "stats")]
    stats: bool,

    /// Bytes of context to print around each match
    #[arg(short = 'c', long = "context", default_value_t = 0)]
    context: usize,

    /// Configuration file (YAML)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(short = 'N', long = "no-color")]
    no_color: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fastscan: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ScanConfig::load_from(path)?,
        None => ScanConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.thread_count = threads;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.cap <= 0 {
        bail!("cap must be positive, got {}", cli.cap);
    }

    let offsets = scan_file_with_config(
        &cli.path,
        cli.pattern.as_bytes(),
        cli.cap as usize,
        config,
    )?;

    if cli.stats {
        println!("{} matches", offsets.len());
        return Ok(());
    }

    if cli.context > 0 {
        let mut file = File::open(&cli.path)
            .with_context(|| format!("failed to reopen {}", cli.path.display()))?;
        for &offset in &offsets {
            let (snippet, match_start) =
                read_context(&mut file, offset, cli.pattern.len(), cli.context)?;
            println!(
                "{}: {}",
                offset,
                render_snippet(&snippet, match_start, cli.pattern.len(), cli.no_color)
            );
        }
    } else {
        for &offset in &offsets {
            println!("{offset}");
        }
    }

    println!("\n{} matches", offsets.len());
    Ok(())
}

/// Reads the bytes surrounding one match for display, returning the
/// snippet and the match's position within it.
fn read_context(
    file: &mut File,
    offset: u64,
    pattern_len: usize,
    context: usize,
) -> Result<(Vec<u8>, usize)> {
    let start = offset.saturating_sub(context as u64);
    let want = (offset - start) as usize + pattern_len + context;

    file.seek(SeekFrom::Start(start))?;
    let mut snippet = vec![0u8; want];
    let mut filled = 0;
    loop {
        let n = file.read(&mut snippet[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    snippet.truncate(filled);
    Ok((snippet, (offset - start) as usize))
}

/// Escapes a snippet for display, highlighting the matched bytes.
fn render_snippet(snippet: &[u8], match_start: usize, pattern_len: usize, no_color: bool) -> String {
    let match_start = match_start.min(snippet.len());
    let match_end = (match_start + pattern_len).min(snippet.len());

    let before = String::from_utf8_lossy(&snippet[..match_start]);
    let matched = String::from_utf8_lossy(&snippet[match_start..match_end]);
    let after = String::from_utf8_lossy(&snippet[match_end..]);

    if no_color {
        format!(
            "{}{}{}",
            before.escape_default(),
            matched.escape_default(),
            after.escape_default()
        )
    } else {
        format!(
            "{}\x1b[1;31m{}\x1b[0m{}",
            before.escape_default(),
            matched.escape_default(),
            after.escape_default()
        )
    }
}
