use clap::Parser;
use cli::Cli;
use config::ConfigLoader;
use log::{error, info};
use scheduler::Scheduler;
use services::PlexConnector;
use sleeper::TokioSleeper;
use tokio::{signal, sync::watch};

mod cleaners;
mod cli;
mod config;
mod http;
mod logging;
mod scheduler;
mod services;
mod sleeper;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::setup_logging(args.log_level)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(listen_for_interrupt(shutdown_tx));

    let loader = ConfigLoader::new(args.config, args.retry_delay, TokioSleeper);
    let scheduler = Scheduler::new(PlexConnector, loader, TokioSleeper, args.dry_run);

    if args.once {
        scheduler.run_once(shutdown_rx).await
    } else {
        scheduler.run_forever(shutdown_rx).await
    }
}

/// Raise the shutdown flag on Ctrl-C/SIGINT. The running sweep, if any, is
/// allowed to finish first.
async fn listen_for_interrupt(shutdown: watch::Sender<bool>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl-C, stopping after the current step...");
            let _ = shutdown.send(true);
        }
        Err(e) => {
            error!("unable to listen for Ctrl-C: {e}");
            // keep the sender alive so the flag is never observed as closed
            std::future::pending::<()>().await;
        }
    }
}
