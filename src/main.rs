mod api;
mod cli;
mod core;
mod engine;
mod prelude;
mod server;
mod tables;

use chrono::Utc;
use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
    server::AppState,
    tables::{build_summary_table, build_window_table},
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let engine = args.api.try_new_engine()?;

    match args.command {
        Command::Summary(args) => {
            let summaries = engine.compute_multi_day_summary(Utc::now(), args.days_ahead).await?;
            println!("{}", build_summary_table(&summaries));
        }

        Command::Window(args) => {
            let window = engine
                .compute_optimal_window(Utc::now(), args.window_hours, args.horizon.horizon_days)
                .await?;
            println!("{}", build_window_table(&window));
        }

        Command::Serve(args) => {
            let state = AppState {
                engine,
                days_ahead: args.summary.days_ahead,
                horizon_days: args.horizon.horizon_days,
            };
            server::serve(&args.bind_address, state).await?;
        }
    }

    info!("done!");
    Ok(())
}
