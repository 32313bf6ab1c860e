//! Command-line demonstration harness: tails a directory of append-only files with
//! `tasklet_tail::FileTailSource` and drives the lines through a trivial pass-through
//! `tasklet_watermark::WatermarkingTasklet`, printing each one as it is discovered.

mod bridge;
mod processor;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use tasklet_config::logging::{init_logging, LogLevel};
use tasklet_config::{log_cli_info, Config};
use tasklet_core::{InboundStream, OutboundStream, ProcessorContext, ProgressState};
use tasklet_tail::{FileTailSource, FileTailSourceConfig};
use tasklet_watermark::WatermarkingTasklet;

use bridge::QueueBridge;
use processor::PrintingProcessor;

/// Tail a directory of append-only files and print each new line as it is discovered.
#[derive(Parser, Debug)]
#[command(name = "tasklet", version, about, long_about = None)]
struct Cli {
    /// Directory to watch.
    #[arg(value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Project root whose `.tasklet/config.toml` should be layered over the global one.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    /// Glob pattern matched against file names within the directory.
    #[arg(short, long)]
    glob: Option<String>,

    /// Total number of sibling instances sharing this directory's files.
    #[arg(long)]
    parallelism: Option<u32>,

    /// This instance's index among `parallelism` siblings.
    #[arg(long)]
    id: Option<u32>,

    /// Named charset used to decode file contents.
    #[arg(long)]
    charset: Option<String>,

    /// Milliseconds a silent inbound stream is still included in the watermark
    /// minimum; negative means wait for every stream indefinitely.
    #[arg(long)]
    max_watermark_retain_millis: Option<i64>,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { LogLevel::Debug } else { LogLevel::Info });

    let mut config =
        Config::load_for_project(&cli.project).context("loading tasklet configuration")?;
    if let Some(directory) = cli.directory {
        config.source.directory = directory;
    }
    if let Some(glob) = cli.glob {
        config.source.glob = glob;
    }
    if let Some(parallelism) = cli.parallelism {
        config.source.parallelism = parallelism;
    }
    if let Some(id) = cli.id {
        config.source.id = id;
    }
    if let Some(charset) = cli.charset {
        config.source.charset = charset;
    }
    if let Some(retain) = cli.max_watermark_retain_millis {
        config.tasklet.max_watermark_retain_millis = retain;
    }

    let encoding = config.source.encoding().context("resolving source charset")?;

    log_cli_info!(
        "starting directory tail",
        directory = %config.source.directory.display()
    );

    let bridge = QueueBridge::new(4096);

    let source_config = FileTailSourceConfig {
        directory: config.source.directory.clone(),
        encoding,
        glob: config.source.glob.clone(),
        parallelism: config.source.parallelism,
        id: config.source.id,
        lines_per_batch: config.source.lines_per_batch,
        watch_poll_seconds: config.source.watch_poll_seconds,
    };

    let mut source = FileTailSource::new(source_config, bridge.outbox())
        .context("constructing tail source")?;
    source.init().context("initializing tail source")?;

    let inbound: Vec<Box<dyn InboundStream<String>>> = vec![Box::new(bridge.inbound(0))];
    let outbound: Vec<Box<dyn OutboundStream<String>>> = Vec::new();

    let context = ProcessorContext {
        vertex_name: "tasklet-cli".to_string(),
        global_processor_index: config.source.id as usize,
    };

    let mut tasklet = WatermarkingTasklet::new(
        PrintingProcessor::default(),
        inbound,
        outbound,
        context,
        config.tasklet.max_watermark_retain_millis,
    );

    let start = Instant::now();
    loop {
        let source_state = source.complete().context("polling tail source")?;
        if source_state.is_done() {
            bridge.close();
        }

        let now_nanos = start.elapsed().as_nanos() as u64;
        let tasklet_state = tasklet
            .call(now_nanos)
            .context("running watermarking tasklet")?;

        if source_state.is_done() && tasklet_state.is_done() {
            break;
        }

        if matches!(source_state, ProgressState::NoProgress)
            && matches!(
                tasklet_state,
                ProgressState::NoProgress | ProgressState::WasAlreadyDone
            )
        {
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    log_cli_info!("tail source exhausted, exiting");
    Ok(())
}
