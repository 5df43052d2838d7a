//! VCS Batch CLI Tool
//!
//! Command-line interface for compiling track descriptors and cut lists into
//! VCS batch event files.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use vcs_core::{
    compile, compile_cuts, read_tracks, CompileOptions, CutEvent, OutputSize, Params,
    RenderedClip, Timeline,
};

#[derive(Parser)]
#[command(name = "vcs-batch")]
#[command(about = "Compile media tracks into frame-indexed VCS batch events")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON array of track descriptors
    Tracks {
        /// Input track descriptor file
        input: PathBuf,

        #[command(flatten)]
        timeline: TimelineArgs,
    },

    /// Compile a cut list referencing pre-rendered clips
    Cuts {
        /// Input cut list file with `renderedClips` and `cuts`
        input: PathBuf,

        #[command(flatten)]
        timeline: TimelineArgs,
    },

    /// Show the contents of a compiled events file
    Inspect {
        /// Input events file
        input: PathBuf,

        /// Show the state in effect at this frame
        #[arg(long)]
        frame: Option<u64>,
    },
}

#[derive(Args)]
struct TimelineArgs {
    /// Output file prefix; `.vcsevents.json` is appended
    #[arg(short, long)]
    output: PathBuf,

    /// Frames per second
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Timeline length in frames
    #[arg(long, default_value = "0")]
    duration_frames: u64,

    /// Output width in pixels
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value = "720")]
    height: u32,

    /// JSON object file with the initial composition params
    #[arg(long)]
    params: Option<PathBuf>,
}

impl TimelineArgs {
    fn compile_options(&self) -> Result<CompileOptions> {
        let initial_params = match &self.params {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read params file {}", path.display()))?;
                parse_params(&text)
                    .with_context(|| format!("Invalid params file {}", path.display()))?
            }
            None => Params::new(),
        };

        let options = CompileOptions {
            duration_in_frames: self.duration_frames,
            fps: self.fps,
            output_size: OutputSize::new(self.width, self.height),
            initial_params,
        };
        options.validate().context("Invalid timeline options")?;
        Ok(options)
    }
}

/// Cut list input file
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CutListFile {
    #[serde(default)]
    rendered_clips: Vec<RenderedClip>,
    cuts: Vec<CutEvent>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Tracks { input, timeline } => compile_tracks(&input, &timeline)?,
        Commands::Cuts { input, timeline } => compile_cut_list(&input, &timeline)?,
        Commands::Inspect { input, frame } => inspect_timeline(&input, frame)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Parses a JSON document that must be an object
fn parse_params(text: &str) -> Result<Params> {
    match serde_json::from_str(text)? {
        serde_json::Value::Object(params) => Ok(params),
        other => bail!("Expected a JSON object, found {}", json_kind(&other)),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Appends `suffix` to the output prefix
fn output_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn compile_tracks(input: &Path, args: &TimelineArgs) -> Result<()> {
    info!("Compiling tracks: {}", input.display());

    let options = args.compile_options()?;
    let file = File::open(input).context("Failed to open track file")?;
    let tracks = read_tracks(BufReader::new(file)).context("Failed to read track descriptors")?;
    debug!("Read {} track descriptors", tracks.len());

    let timeline = compile(&tracks, &options);
    info!(
        "Created {} events from {} tracks",
        timeline.events_by_frame.len(),
        tracks.len()
    );

    let batch_out = output_path(&args.output, ".vcsevents.json");
    write_timeline(&timeline, &batch_out)?;

    println!("JSON written to:\n{}", absolute(&batch_out).display());
    Ok(())
}

fn compile_cut_list(input: &Path, args: &TimelineArgs) -> Result<()> {
    info!("Compiling cut list: {}", input.display());

    let options = args.compile_options()?;
    let file = File::open(input).context("Failed to open cut list file")?;
    let cut_list: CutListFile =
        serde_json::from_reader(BufReader::new(file)).context("Failed to read cut list")?;
    debug!(
        "Read {} rendered clips and {} cuts",
        cut_list.rendered_clips.len(),
        cut_list.cuts.len()
    );

    let output = compile_cuts(&cut_list.rendered_clips, &cut_list.cuts, &options)
        .context("Failed to compile cut list")?;
    info!(
        "Created {} events and {} playback events",
        output.timeline.events_by_frame.len(),
        output.input_timings.playback_events.len()
    );

    let batch_out = output_path(&args.output, ".vcsevents.json");
    let timings_out = output_path(&args.output, ".vcsinputtimings.json");
    write_timeline(&output.timeline, &batch_out)?;

    let file = File::create(&timings_out).context("Failed to create input timings file")?;
    output
        .input_timings
        .write_json(BufWriter::new(file))
        .context("Failed to write input timings")?;

    println!(
        "JSON written to two files:\n{}\n{}",
        absolute(&batch_out).display(),
        absolute(&timings_out).display()
    );
    Ok(())
}

fn write_timeline(timeline: &Timeline, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    timeline
        .write_json(BufWriter::new(file))
        .context("Failed to write events")?;
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn inspect_timeline(input: &Path, frame: Option<u64>) -> Result<()> {
    let file = File::open(input).context("Failed to open events file")?;
    let timeline =
        Timeline::read_json(BufReader::new(file)).context("Failed to read events file")?;

    match frame {
        Some(frame) => print_frame(&timeline, frame),
        None => print_info(&timeline),
    }
    Ok(())
}

fn print_info(timeline: &Timeline) {
    println!("\n=== VCS Batch Information ===");
    println!("Composition: {}", timeline.composition_id);
    println!(
        "Resolution: {}x{}",
        timeline.output_size.w, timeline.output_size.h
    );
    println!("Frame rate: {} fps", timeline.frames_per_second);
    println!(
        "Duration: {} frames ({:.2} seconds)",
        timeline.duration_in_frames,
        timeline.duration_secs()
    );
    println!("Events: {}", timeline.events_by_frame.len());

    println!("\n=== Events ===");
    for (frame, snapshot) in &timeline.events_by_frame {
        let params = if snapshot.params.is_some() {
            " +params"
        } else {
            ""
        };
        println!(
            "  Frame {}: {} active of {} slots{}",
            frame,
            snapshot.active_count(),
            snapshot.active_video_input_slots.len(),
            params
        );
    }
}

fn print_frame(timeline: &Timeline, frame: u64) {
    let Some((recorded_at, snapshot)) = timeline.snapshot_at(frame) else {
        println!("No events at or before frame {}", frame);
        return;
    };

    println!("\n=== Frame {} (recorded at frame {}) ===", frame, recorded_at);
    for (slot, activation) in snapshot.active_video_input_slots.iter().enumerate() {
        match activation {
            Some(activation) => println!(
                "  [{}] {} ({})",
                slot,
                activation.id,
                activation.display_name.as_deref().unwrap_or("-")
            ),
            None => println!("  [{}] -", slot),
        }
    }

    if let Some(params) = timeline.params_at(frame) {
        println!("Params: {}", serde_json::Value::Object(params.clone()));
    }
}
