use std::{error::Error, fs::File, io::BufReader, path::Path};

use boids_core::options::{Domain, RuleWeights, SimulationParams};
use clap_serde_derive::{
    clap::{self, Parser},
    serde::Serialize,
    ClapSerde,
};
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Toroidal boids flocking: three local rules over a uniform grid.
pub struct Args {
    /// Config file, TOML or YAML by extension. Skipped when missing
    #[arg(short, long = "config", default_value = "config.toml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Serialize)]
/// Programatic configuration
///
/// Uses defaults, overwritten by the file given with `-c` or `--config`,
/// overwritten again by command line flags
pub struct Config {
    #[default(1000)]
    #[arg(short = 'n', long)]
    /// number of boids
    pub population: usize,

    #[default(50.)]
    #[arg(short = 'r', long)]
    /// neighbourhood radius, also the grid cell size
    pub radius: f32,

    #[default(300.)]
    #[arg(long)]
    pub max_speed: f32,

    #[default(100.)]
    #[arg(long)]
    pub max_acceleration: f32,

    #[default(0.75)]
    #[arg(long)]
    /// share of the previous acceleration kept each tick
    pub decay: f32,

    #[default(0.34)]
    #[arg(long = "coh_weight")]
    pub cohesion_weight: f32,
    #[default(0.33)]
    #[arg(long = "ali_weight")]
    pub alignment_weight: f32,
    #[default(0.33)]
    #[arg(long = "sep_weight")]
    pub separation_weight: f32,

    #[default(600.)]
    #[arg(short = 'x', long)]
    pub width: f32,

    #[default(600.)]
    #[arg(short = 'y', long)]
    pub height: f32,

    #[default(60.)]
    #[arg(long)]
    /// ticks per second
    pub refresh_rate: f32,

    #[default(0)]
    #[arg(short = 's', long)]
    /// rng seed, 0 picks a random one
    pub seed: u64,

    #[default(0)]
    #[arg(long)]
    /// run this many ticks without a window and print the samples as JSON
    pub headless_ticks: u64,

    #[default(60)]
    #[arg(long)]
    /// headless only, sample every n-th tick
    pub sample_rate: u64,
}

impl Config {
    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            population: self.population,
            neighbourhood_radius: self.radius,
            max_speed: self.max_speed,
            max_acceleration: self.max_acceleration,
            acceleration_decay: self.decay,
            weights: RuleWeights::new(
                self.cohesion_weight,
                self.alignment_weight,
                self.separation_weight,
            ),
            domain: Domain::new(self.width, self.height),
            refresh_rate: self.refresh_rate,
        }
    }

    pub fn seed(&self) -> u64 {
        match self.seed {
            0 => rand::random(),
            seed => seed,
        }
    }
}

/// Parses the config file, if there is one, and merges the flags on top.
pub fn load(args: &mut Args) -> Result<Config, Box<dyn Error>> {
    let path = args.config_path.clone();

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(_) => {
            debug!(path = %path.display(), "no config file, using defaults and flags");
            return Ok(Config::from(&mut args.config));
        }
    };

    let from_file = parse_file(&path, file)?;
    info!(path = %path.display(), "loaded config file");

    Ok(Config::from(from_file).merge(&mut args.config))
}

fn parse_file(path: &Path, file: File) -> Result<<Config as ClapSerde>::Opt, Box<dyn Error>> {
    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    let opt: <Config as ClapSerde>::Opt = if is_toml {
        let text = std::io::read_to_string(BufReader::new(file))?;
        toml::from_str(&text)
            .map_err(|err| format!("error in configuration file {}:\n{err}", path.display()))?
    } else {
        serde_yaml::from_reader(BufReader::new(file))
            .map_err(|err| format!("error in configuration file {}:\n{err}", path.display()))?
    };

    Ok(opt)
}
