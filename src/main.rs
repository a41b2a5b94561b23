use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use variant_forge::batch::{BatchSummary, Parallelism};
use variant_forge::convert::{ConversionEngine, ConversionResult};
use variant_forge::naming::{NamingScheme, custom_variants};
use variant_forge::session::{Session, SourceImage};
use variant_forge::size_spec::RawSizeSpec;
use variant_forge::types::ImageFormat;
use variant_forge::{config, output, presets, scan};

/// How each source image's variant list is built.
#[derive(clap::Args, Clone)]
struct VariantArgs {
    /// Source images or directories (walked for png, jpg, jpeg, webp, bmp, tiff)
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Apply a built-in preset (see `presets`)
    #[arg(long, conflicts_with = "sizes")]
    preset: Option<String>,

    /// Size spec, repeatable: square:16,32,64 | dimension:1920x1080 | aspect:16:9@1920
    #[arg(long = "size", value_name = "KIND:TEXT")]
    sizes: Vec<RawSizeSpec>,

    /// Base name for generated sizes: <NAME>_<w>x<h> [default: custom]
    #[arg(long, requires = "sizes", conflicts_with = "name_parts")]
    name: Option<String>,

    /// Literal name parts; the <w>x<h> token is inserted at --insert-at
    #[arg(long, value_delimiter = ',', value_name = "PARTS", requires = "sizes")]
    name_parts: Vec<String>,

    /// 1-based position of the resolution token among --name-parts [default: 1]
    #[arg(long, requires = "name_parts")]
    insert_at: Option<usize>,

    /// Output format for generated sizes [default: png]
    #[arg(long, requires = "sizes")]
    format: Option<ImageFormat>,

    /// Minimum output size in KB for generated sizes
    #[arg(long, requires = "sizes")]
    min_kb: Option<u32>,

    /// Maximum output size in KB for generated sizes
    #[arg(long, requires = "sizes")]
    max_kb: Option<u32>,
}

#[derive(clap::Args, Clone)]
struct ConvertArgs {
    #[command(flatten)]
    variants: VariantArgs,

    /// Destination directory (created if missing)
    #[arg(long)]
    out: PathBuf,

    /// Subdirectory under --out; with several sources each image gets
    /// <NAME>/<file stem>
    #[arg(long)]
    subdir: Option<String>,

    /// Images converted concurrently (overrides processing.workers)
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Parser)]
#[command(name = "variant-forge")]
#[command(about = "Turn source images into named size/format variants with ffmpeg")]
#[command(long_about = "\
Turn source images into named size/format variants with ffmpeg

Every source image gets a list of variants, each with a name, a format, a
pixel size and optional KB bounds. Variants come from a preset, from size
specs, or default to a single 512x512 png named 'output'.

Size specs:

  square:16,32,64        one square per edge; bad tokens are skipped
  dimension:1920x1080    exactly one size
  aspect:16:9@1920       width 1920, height from the ratio

Naming:

  --name icon            icon_16x16, icon_32x32, ... (aspect adds _16-9)
  --name-parts Square_,Logo --insert-at 2
                         Square_16x16Logo

Conversions run ffmpeg as: -i <in> -vf scale=<w>:<h> <flags> -y <out>

Run 'variant-forge gen-config' to generate a documented variant-forge.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: variant-forge.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in presets
    Presets,
    /// Show the variants and file names a conversion would produce
    Plan(VariantArgs),
    /// Convert every variant of every source image
    Convert(ConvertArgs),
    /// Print a stock variant-forge.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Presets => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(presets::catalog())?);
            } else {
                output::print_presets(presets::catalog());
            }
        }
        Command::Plan(args) => {
            let session = build_session(&args, None)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(session.images())?);
            } else {
                output::print_plan(session.images());
            }
        }
        Command::Convert(args) => {
            let cwd = std::env::current_dir()?;
            let config = config::load_config(cli.config.as_deref(), &cwd)?;
            let mut session = build_session(&args.variants, args.subdir.as_deref())?;

            let workers = args.workers.unwrap_or(config.processing.workers);
            let parallelism = Parallelism::from_workers(workers);
            let engine = ConversionEngine::from_config(&config);
            let snapshot: Vec<SourceImage> = session.images().to_vec();
            let json = cli.json;

            let on_unit = |image_id: &str, variant_id: &str, result: &ConversionResult| {
                if json {
                    return;
                }
                if let Some(image) = snapshot.iter().find(|img| img.id == image_id)
                    && let Some(variant) = image.variant(variant_id)
                {
                    output::print_unit(&image.display_name, variant, result);
                }
            };
            let results = session.run_all(&engine, Some(&args.out), parallelism, on_unit)?;

            let summary = BatchSummary::from_results(&results);
            if cli.json {
                let report = serde_json::json!({
                    "images": session.images(),
                    "summary": summary,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_summary(&summary);
            }
            if !summary.all_succeeded() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("variant_forge=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Scan the sources and give every image its variant list.
///
/// With more than one source each image writes into its own subdirectory
/// so identically named variants cannot overwrite each other.
fn build_session(
    args: &VariantArgs,
    subdir: Option<&str>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let sources = scan::collect_sources(&args.sources)?;
    let mut session = Session::new();

    let templates = if args.sizes.is_empty() {
        None
    } else {
        let scheme = if args.name_parts.is_empty() {
            NamingScheme::Suffixed {
                base: args.name.clone().unwrap_or_else(|| "custom".to_string()),
            }
        } else {
            NamingScheme::Composed {
                parts: args.name_parts.clone(),
                position: args.insert_at.unwrap_or(1),
            }
        };
        let format = args.format.unwrap_or(ImageFormat::Png);
        let templates: Vec<_> = custom_variants(&scheme, format, &args.sizes)
            .into_iter()
            .map(|t| t.with_bounds(args.min_kb, args.max_kb))
            .collect();
        Some(templates)
    };

    for source in sources {
        let id = session.add_image(source);
        if let Some(preset) = &args.preset {
            session.apply_preset(&id, preset)?;
        } else if let Some(templates) = &templates {
            session.apply_custom(&id, templates.clone())?;
        }
    }

    if session.images().len() > 1 {
        session.use_stem_subdirectories(subdir)?;
    } else if let Some(subdir) = subdir {
        let ids: Vec<String> = session.images().iter().map(|img| img.id.clone()).collect();
        for id in ids {
            session.set_output_subdirectory(&id, Some(subdir.to_string()))?;
        }
    }

    Ok(session)
}
