use clap::Parser;
use std::path::PathBuf;

use crate::size::parse_size;

#[derive(Debug, Parser)]
#[command(name = "create-vhdx")]
#[command(about = "Create an empty fixed-size VHDX disk image", long_about = None)]
pub struct Cli {
    /// Path of the image to create
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Virtual disk size in bytes, optionally with a K, M, G or T suffix
    #[arg(value_name = "SIZE", value_parser = parse_size)]
    pub size: u64,

    /// Creator name recorded in the image
    #[arg(long, value_name = "NAME")]
    pub creator: Option<String>,

    /// Virtual disk id (defaults to a random GUID)
    #[arg(long, value_name = "GUID")]
    pub disk_id: Option<String>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}
