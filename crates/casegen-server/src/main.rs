//! `casegen` binary

use casegen_server::cli::{init_tracing, run_reconcile, run_split, serve_config, Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose, cli.global.log_json)?;

    match cli.command {
        Commands::Serve(args) => {
            let config = serve_config(&args)?;
            casegen_server::serve(&config, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                }
            })
            .await?;
        }
        Commands::Split(args) => println!("{}", run_split(&args)?),
        Commands::Reconcile(args) => println!("{}", run_reconcile(&args)?),
    }
    Ok(())
}
