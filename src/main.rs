//! mvc-dispatch binary entry point.
//!
//! Serves the configured application root as a static site. Applications
//! with controllers embed the library and register them on a
//! [`RouteManager`] before running the [`Application`].

use std::process::ExitCode;
use std::sync::Arc;

use mvc_dispatch::cli::{self, parse_args, print_help, print_version};
use mvc_dispatch::config::Config;
use mvc_dispatch::logging;
use mvc_dispatch::server::Application;
use mvc_dispatch::RouteManager;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'mvc-dispatch --help' for more information.");
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &cli::Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args)?;

    logging::init_with_filter(config.log_filter()).ok();
    info!("mvc-dispatch v{}", env!("CARGO_PKG_VERSION"));

    let server_config = config.to_server_config()?;
    let manager = Arc::new(RouteManager::new(config.to_dispatch_config()?));

    Application::new(server_config, manager).run().await?;
    Ok(())
}
