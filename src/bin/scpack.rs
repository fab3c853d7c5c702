use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "scpack", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a scene JSON into a package.
    Build(BuildArgs),
    /// Print a JSON summary of an existing package.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Input scene JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Compile configuration JSON; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output package path (overrides the configuration).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Directory bitmap names resolve against (defaults to the scene's directory).
    #[arg(long)]
    bitmaps: Option<PathBuf>,

    /// Existing package to merge the result into.
    #[arg(long)]
    merge_with: Option<PathBuf>,

    #[arg(long, value_enum)]
    quality: Option<scpack::TextureQuality>,

    #[arg(long, value_enum)]
    encoding: Option<scpack::TextureEncoding>,

    #[arg(long, value_enum)]
    compression: Option<scpack::Compression>,

    /// Build shape groups on a rayon pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Hide the atlas progress bar.
    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Package to read.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::builder().parse_lossy(
        std::env::var("RUST_LOG")
            .as_deref()
            .unwrap_or("warn,scpack=info"),
    );
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let scene = scpack::Scene::from_json_path(&args.scene)?;
    let mut config = match &args.config {
        Some(path) => scpack::CompileConfig::from_json_path(path)?,
        None => scpack::CompileConfig::default(),
    };
    if let Some(out) = args.out {
        config.output = out;
    }
    if let Some(merge) = args.merge_with {
        config.merge_with = Some(merge);
    }
    if let Some(q) = args.quality {
        config.texture_quality = q;
    }
    if let Some(e) = args.encoding {
        config.texture_encoding = e;
    }
    if let Some(c) = args.compression {
        config.compression = c;
    }
    if args.parallel {
        config.parallel = true;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    let bitmap_root = args.bitmaps.unwrap_or_else(|| {
        args.scene
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    });
    if let Some(parent) = config.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let pb = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} [{eta_precise}] {pos:>7}/{len:7} {msg}",
            )?
            .progress_chars("#>-"),
        );
        pb.set_message("atlas");
        pb
    };

    let exporter = Arc::new(scpack::DirectoryExporter::new(bitmap_root));
    let report = scpack::compile_scene(&scene, config, exporter, &mut |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    eprintln!(
        "wrote {} ({} shapes, {} reused, {} textures)",
        report.output.display(),
        report.shapes,
        report.reused_shapes,
        report.textures
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let pkg = scpack::load_package(&args.in_path)?;
    let textures: Vec<_> = pkg
        .textures
        .iter()
        .map(|t| {
            serde_json::json!({
                "width": t.width,
                "height": t.height,
                "pixel_format": t.pixel_format,
                "encoding": t.encoding,
            })
        })
        .collect();
    let summary = serde_json::json!({
        "path": args.in_path.display().to_string(),
        "max_id": pkg.max_id(),
        "shapes": pkg.shapes.len(),
        "draw_commands": pkg.shapes.iter().map(|s| s.commands.len()).sum::<usize>(),
        "movieclips": pkg.movieclips.len(),
        "textfields": pkg.textfields.len(),
        "modifiers": pkg.modifiers.len(),
        "matrix_banks": pkg.matrix_banks.len(),
        "textures": textures,
        "exports": pkg.exports,
        "flags": pkg.flags,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("format package summary")?
    );
    Ok(())
}
