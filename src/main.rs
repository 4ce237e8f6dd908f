mod app;
mod capture;
mod commands;
mod config;
mod logging;
mod setup;
mod spectrum;
mod ui;
mod visualizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
