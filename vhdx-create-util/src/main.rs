mod cli;
mod size;

use clap::Parser;
use cli::Cli;
use snafu::{ResultExt, Snafu};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vhdx_create::CreateParams;

/// Top-level application errors for create-vhdx.
#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to start async runtime"))]
    Runtime { source: std::io::Error },

    #[snafu(display("create failed for '{}'", path.display()))]
    Create {
        path: PathBuf,
        source: vhdx_create::CreateError,
    },
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[snafu::report]
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(RuntimeSnafu)?;

    runtime.block_on(cmd_create(cli))
}

async fn cmd_create(cli: Cli) -> Result<()> {
    let Cli {
        path,
        size,
        creator,
        disk_id,
        quiet,
    } = cli;

    if !quiet {
        println!("create {} size: {}", path.display(), size);
    }

    let params = CreateParams {
        size,
        creator,
        disk_id,
    };
    tracing::debug!(?params, "creating image");
    vhdx_create::create_file(&path, &params)
        .await
        .context(CreateSnafu { path: &path })?;

    if !quiet {
        println!("file created!");
    }

    Ok(())
}
