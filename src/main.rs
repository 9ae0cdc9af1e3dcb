use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;

use handseg::config::ToolConfig;
use handseg::format::ExportOptions;
use handseg::model::CanvasSize;
use handseg::script::{parse_script, run_script};
use handseg::session::Session;

#[derive(Parser)]
#[command(name = "handseg")]
#[command(about = "Replay a hand segmentation script and export COCO annotations")]
struct Cli {
    /// JSON script of annotation steps
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Image being annotated; sets the canvas size and the exported file name
    #[arg(long, value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// Canvas width when no image is given
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Canvas height when no image is given
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Output COCO JSON file
    #[arg(short, long, value_name = "FILE", default_value = "annotations.json")]
    output: PathBuf,

    /// Tool configuration file; `handseg.json` in the working directory is
    /// used when present
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write a PNG preview with colored masks and hand boxes
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// Fail if any script step is rejected
    #[arg(long)]
    strict: bool,
}

/// Replay a script onto a fresh canvas and export the result.
fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = load_config(args.config.as_deref())?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let (canvas, file_name) = resolve_canvas(&args)?;

    let json = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {:?}", args.script))?;
    let steps = parse_script(&json).context("Failed to parse script")?;

    let mut session = Session::new(&config);
    session.load_canvas(canvas);
    let report = run_script(&mut session, &steps);
    for (index, error) in &report.rejected {
        eprintln!("step {}: {}", index, error);
    }
    if args.strict && !report.is_clean() {
        bail!("{} of {} steps rejected", report.rejected.len(), steps.len());
    }

    let result = session
        .write_coco(&args.output, &file_name, &ExportOptions::default())
        .with_context(|| format!("Failed to write {:?}", args.output))?;
    if result.has_warnings() {
        for warning in &result.warnings {
            log::warn!("{}", warning.message);
        }
    }
    println!(
        "Wrote {} regions and {} boxes to {}",
        result.regions_exported,
        result.boxes_exported,
        args.output.display()
    );

    if let Some(preview) = &args.preview {
        write_preview(&session, args.image.as_deref(), preview)?;
        println!(
            "Wrote preview to {} ({:.1}% of the image annotated)",
            preview.display(),
            handseg::overlay::coverage_ratio(session.layers()) * 100.0
        );
    }

    Ok(())
}

/// The explicit config file, else the default one if it exists, else
/// built-in defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<ToolConfig> {
    let fallback = Path::new(ToolConfig::default_filename());
    let path = match explicit {
        Some(path) => path,
        None if fallback.is_file() => fallback,
        None => return Ok(ToolConfig::default()),
    };
    ToolConfig::load(path).with_context(|| format!("Failed to load config {:?}", path))
}

/// Canvas size and exported file name, from the image header or the
/// explicit dimensions.
fn resolve_canvas(args: &Cli) -> anyhow::Result<(CanvasSize, String)> {
    if let Some(image) = &args.image {
        let (width, height) = image::image_dimensions(image)
            .with_context(|| format!("Failed to read image header {:?}", image))?;
        let file_name = image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok((CanvasSize::new(width, height), file_name));
    }

    match (args.width, args.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Ok((CanvasSize::new(width, height), String::new()))
        }
        _ => bail!("Either --image or a non-zero --width and --height is required"),
    }
}

/// Render the overlay over the image, or over black without one.
fn write_preview(session: &Session, image: Option<&Path>, out: &Path) -> anyhow::Result<()> {
    let rendered = match image {
        Some(path) => {
            let base = image::open(path)
                .with_context(|| format!("Failed to decode image {:?}", path))?
                .to_rgb8();
            handseg::overlay::render_overlay(&base, session.layers(), session.boxes())?
        }
        None => handseg::overlay::render_on_blank(session.layers(), session.boxes())?,
    };
    rendered
        .save(out)
        .with_context(|| format!("Failed to write preview {:?}", out))?;
    Ok(())
}
