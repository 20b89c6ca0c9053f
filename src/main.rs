use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use terrain_datapack::config::{PackLayout, TerrainConfig};
use terrain_datapack::logging::init_logging;
use terrain_datapack::pipeline;

#[derive(Parser, Debug)]
#[command(name = "terrain_datapack")]
#[command(about = "Generate noise terrain as chunked, scheduled function files")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Side length of the square grid
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u32>,

    /// Coordinate divisor for the fine noise band
    #[arg(long)]
    scale_fine: Option<f64>,

    /// Coordinate divisor for the broad noise band
    #[arg(long)]
    scale_broad: Option<f64>,

    /// Elevation that low terrain is flooded up to
    #[arg(short, long)]
    water_level: Option<i64>,

    /// Percent of dry flat cells that get short grass (0-100)
    #[arg(short, long)]
    grass_density: Option<f64>,

    /// Worker threads for the heightmap (default: one per core)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Function namespace used in the schedule file
    #[arg(long)]
    namespace: Option<String>,

    /// Write a full datapack (pack.mcmeta + data/<namespace>/function/)
    #[arg(long)]
    datapack: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> terrain_datapack::Result<TerrainConfig> {
        let mut config = match &self.config {
            Some(path) => TerrainConfig::load(path)?,
            None => TerrainConfig::default(),
        };

        if let Some(size) = self.size {
            config.size = size;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if let Some(scale) = self.scale_fine {
            config.noise.scale_fine = scale;
        }
        if let Some(scale) = self.scale_broad {
            config.noise.scale_broad = scale;
        }
        if let Some(level) = self.water_level {
            config.emit.water_level = level;
        }
        if let Some(density) = self.grass_density {
            config.emit.grass_density = density;
        }
        if let Some(dir) = self.output {
            config.output.directory = dir;
        }
        if let Some(namespace) = self.namespace {
            config.output.namespace = namespace;
        }
        if self.datapack {
            config.output.layout = PackLayout::Datapack;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = args.into_config().and_then(|config| pipeline::run(&config));
    match result {
        Ok(report) => {
            info!("Seed: {}", report.seed);
            info!(
                "Wrote {} chunks ({} instructions, {} water fills, {} grass) to {}",
                report.chunk_count,
                report.instruction_count,
                report.water_fills,
                report.decorations,
                report.function_dir.display()
            );
            info!("Master schedule: {}", report.master_file.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
