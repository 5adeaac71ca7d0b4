/*
 * Responsibility
 * - Start the tokio runtime and hand off to app::run()
 */
use anyhow::Result;

mod api;
mod app;
mod config;
mod middleware;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
