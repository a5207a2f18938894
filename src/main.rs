mod cli;
mod output;

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use inotify_wait::{EventKind, Watcher, build_args};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    // Logs go to stderr so stdout carries only events.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Watch {
            args,
            json,
            unknown,
        } => {
            let options = args.to_options()?;
            let mut watcher = Watcher::spawn(options)?;

            for kind in EventKind::ALL {
                watcher.on(kind, move |event| output::print_event(event, json));
            }
            if unknown {
                watcher.on_unknown(move |event| output::print_unknown(event, json));
            }
            watcher.on_error(|message| warn!(target: "inotifywait", "{}", message.trim_end()));

            let stop = watcher.stop_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("interrupted");
                    stop.stop();
                }
            });

            watcher.run().await?;
        }
        Commands::Args { args, json } => {
            let options = args.to_options()?;
            let paths = options.resolved_paths()?;
            output::print_command(&options.program, &build_args(&options, &paths), json);
        }
    }

    Ok(())
}
