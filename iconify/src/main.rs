use clap::Parser;
use iconify::export::{timestamped_name, Exporter};
use iconify::profile::{parse_size_list, ConversionProfile, ResampleFilter};
use iconify::raster::SourceImage;
use iconify::{Converter, IconifyError};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Converts an image into a multi-resolution Windows icon
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// The PNG, JPEG, WEBP or SVG image to convert
    input: PathBuf,

    /// Write the icon to this file
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Write a timestamped icon into this directory
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// A JSON conversion profile
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Comma separated icon sizes, largest first (e.g. 256,48,32,16)
    #[arg(short, long)]
    sizes: Option<String>,

    /// The resampling filter for bitmap sources
    #[arg(long, value_enum)]
    filter: Option<ResampleFilter>,

    /// Also write PNG previews next to the icon
    #[arg(long)]
    previews: bool,

    /// Skip checking the rendered frames before encoding
    #[arg(long)]
    no_verify: bool,

    /// Additionally log into daily rotated files in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Set up logging using tracing
    let (file_layer, _log_guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "iconify.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(
        "{} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Conversion failed: {}", err);
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), IconifyError> {
    let mut profile = match &cli.profile {
        Some(path) => {
            tracing::debug!("Loading profile from {}", path.display());
            ConversionProfile::from_file(path)?
        }
        None => ConversionProfile::default(),
    };

    // Command line flags take precedence over the profile
    if let Some(sizes) = &cli.sizes {
        profile.sizes = parse_size_list(sizes)?;
    }
    if let Some(filter) = cli.filter {
        profile.filter = filter;
    }
    if cli.no_verify {
        profile.verify_frames = false;
    }

    let converter = Converter::new(profile)?;

    tracing::info!("Converting {}...", cli.input.display());
    let source = SourceImage::load(&cli.input).await?;
    let conversion = converter.convert(&source).await?;

    let (mut exporter, file_name) = match &cli.output {
        Some(output) => {
            let dir = output
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default();
            let file_name = output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            (Exporter::new(dir), file_name)
        }
        None => (
            Exporter::new(&cli.out_dir),
            timestamped_name(&converter.profile().file_stem, SystemTime::now()),
        ),
    };

    exporter.write_icon(&file_name, &conversion.icon).await?;

    if cli.previews {
        let previews = converter.previews(&source, &conversion).await?;
        exporter.write_previews(&previews).await?;
    }

    let outputs = exporter.finalize();
    tracing::info!("Done, {} file(s) written", outputs.len());

    Ok(())
}
