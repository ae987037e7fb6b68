use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use phrasedex_server::{Cli, Config, Server};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match Config::resolve(cli) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "startup aborted");
            std::process::exit(1);
        }
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = Arc::clone(&shutdown);
    if let Err(err) = ctrlc::set_handler(move || {
        tracing::info!("received interrupt, shutting down");
        shutdown_handler.store(true, Ordering::Release);
    }) {
        tracing::warn!(error = %err, "could not install signal handler, shutdown will require a kill");
    }

    let server = Server::new(config);
    if let Err(err) = server.run(shutdown) {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}
