use clap::Parser;
mod app;
mod commands;
mod logging;
use commands::cli;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();

    match app::run_app(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!(target: "apirun.batch", error = %format!("{err:#}"), "batch aborted");
            eprintln!("apirun: {err:#}");
            std::process::exit(app::EXIT_FATAL);
        }
    }
}
