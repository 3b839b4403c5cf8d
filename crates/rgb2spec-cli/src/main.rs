//! rgb2spec - RGB-to-spectrum coefficient table fitter
//!
//! Produces, per gamut, a binary lookup table mapping RGB grid coordinates
//! to sigmoid-polynomial spectral coefficients.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rgb2spec_fit::{FitConfig, SpectralBasis, fit_gamut, verify};
use rgb2spec_primaries::{ALL_GAMUTS, ColorSpace, Gamut};
use rgb2spec_table::SpectrumTable;

#[derive(Parser)]
#[command(name = "rgb2spec")]
#[command(author, version, about = "RGB-to-spectrum coefficient table fitter")]
#[command(long_about = "
Fits sigmoid-polynomial spectral coefficient tables for RGB gamuts and
verifies written tables by spectral round trip.

Examples:
  rgb2spec fit                              # all six gamuts into ./tables
  rgb2spec fit --space srgb --space acescg  # a subset
  rgb2spec fit -o out --stage-a-iters 2000 --seed 3
  rgb2spec verify tables/srgb_table.bin --space srgb
  rgb2spec verify tables/rec2020_table.bin --space rec2020 --steps 33
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit coefficient tables for one or more gamuts
    #[command(visible_alias = "f")]
    Fit(FitArgs),

    /// Verify a written table by sweeping an RGB lattice through it
    #[command(visible_alias = "v")]
    Verify(VerifyArgs),
}

#[derive(Args)]
struct FitArgs {
    /// Gamut(s) to fit (srgb, p3-d65, adobergb, rec2020, acescg,
    /// aces2065-1). All six when omitted.
    #[arg(short, long = "space")]
    spaces: Vec<String>,

    /// Output directory for the table files
    #[arg(short, long, default_value = "tables")]
    out_dir: PathBuf,

    /// Grid resolution per axis
    #[arg(long, default_value_t = 64)]
    size: usize,

    /// Stage A iteration budget
    #[arg(long, default_value_t = 15000)]
    stage_a_iters: usize,

    /// Stage B epoch budget
    #[arg(long, default_value_t = 15000)]
    stage_b_iters: usize,

    /// Base learning rate (cosine-annealed over each stage)
    #[arg(long, default_value_t = 1e-3)]
    lr: f32,

    /// Mini-batch size per Stage A update
    #[arg(long, default_value_t = 4096)]
    batch_size: usize,

    /// Size of the pre-generated RGB sampling pool
    #[arg(long, default_value_t = 1 << 20)]
    pool_size: usize,

    /// Loss weight of the pure-green adversarial batch
    #[arg(long, default_value_t = 5.0)]
    green_weight: f32,

    /// Loss weight of the dark/zero-channel adversarial batch
    #[arg(long, default_value_t = 5.0)]
    dark_weight: f32,

    /// Stage B epochs between checkpoints
    #[arg(long, default_value_t = 2500)]
    checkpoint_interval: usize,

    /// RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args)]
struct VerifyArgs {
    /// Table file to verify
    table: PathBuf,

    /// Gamut the table was fitted for
    #[arg(short, long)]
    space: String,

    /// Grid resolution the table was written with
    #[arg(long, default_value_t = 64)]
    size: usize,

    /// Lattice steps per RGB axis
    #[arg(long, default_value_t = 17)]
    steps: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Fit(args) => run_fit(args),
        Commands::Verify(args) => run_verify(args),
    }
}

fn parse_gamuts(names: &[String]) -> Result<Vec<Gamut>> {
    if names.is_empty() {
        return Ok(ALL_GAMUTS.to_vec());
    }
    names
        .iter()
        .map(|name| {
            name.parse::<Gamut>()
                .with_context(|| format!("invalid --space {name:?}"))
        })
        .collect()
}

fn run_fit(args: FitArgs) -> Result<()> {
    let gamuts = parse_gamuts(&args.spaces)?;

    let config = FitConfig {
        table_size: args.size,
        stage_a_iters: args.stage_a_iters,
        stage_b_iters: args.stage_b_iters,
        learning_rate: args.lr,
        batch_size: args.batch_size,
        pool_size: args.pool_size,
        green_weight: args.green_weight,
        dark_weight: args.dark_weight,
        checkpoint_interval: args.checkpoint_interval,
        seed: args.seed,
        ..FitConfig::default()
    };

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let run_start = Instant::now();
    for gamut in &gamuts {
        let path = args.out_dir.join(gamut.table_file_name());
        println!("[{gamut}] fitting -> {}", path.display());

        let start = Instant::now();
        fit_gamut(*gamut, &config, Some(&path))
            .with_context(|| format!("fitting {gamut}"))?;

        let elapsed = start.elapsed().as_secs();
        println!(
            "[{gamut}] processed in {}h {}m {}s",
            elapsed / 3600,
            (elapsed % 3600) / 60,
            elapsed % 60
        );
    }

    let elapsed = run_start.elapsed().as_secs();
    println!(
        "All spaces processed in {}h {}m {}s",
        elapsed / 3600,
        (elapsed % 3600) / 60,
        elapsed % 60
    );
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<()> {
    let gamut: Gamut = args.space.parse()?;
    let table = SpectrumTable::read(&args.table, args.size)
        .with_context(|| format!("reading {}", args.table.display()))?;

    let basis = SpectralBasis::new();
    let cs = ColorSpace::from_gamut(gamut);
    let stats = verify::sweep(&table, &basis, &cs, args.steps);

    println!(
        "[{gamut}] {} lattice points: dE mean {:.4}, max {:.4}",
        stats.count, stats.mean_delta_e, stats.max_delta_e
    );
    Ok(())
}
