use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "floralens")]
#[command(author, version, about = "Flower identification web app")]
pub struct Cli {
    /// Listen port
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Base URL of the model artifact store
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory for cached model artifacts
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Device to run inference on (cpu, cuda:N, metal)
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Download artifacts and build the model before serving
    #[arg(long)]
    pub preload: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
