mod app;
mod config;
mod error;
mod output;
mod query;
mod runtime;
mod song;
mod source;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
