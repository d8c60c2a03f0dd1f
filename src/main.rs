// src/main.rs

use packwatch::errors::PackwatchError;
use packwatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        match err.downcast_ref::<PackwatchError>() {
            Some(PackwatchError::PackerNotFound(looked_in)) => {
                eprintln!("Could not find TexturePacker executable.");
                eprintln!();
                eprintln!("Looked in:");
                for path in looked_in {
                    eprintln!("{}", path.display());
                }
            }
            _ => eprintln!("packwatch error: {err:?}"),
        }
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await?;
    Ok(())
}
