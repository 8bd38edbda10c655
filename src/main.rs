mod engine;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use engine::assets::ModelLoader;
use engine::cli::{Cli, CliCommand};
use engine::config::AppConfig;
use engine::xr::SimulatedRuntime;
use engine::EngineResult;

fn run(cli: Cli) -> EngineResult<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(model) = &cli.model {
        config.model_path = Some(model.clone());
    }

    // Relative model paths resolve against the config file's directory.
    let base_dir = cli
        .config
        .as_deref()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let loader = ModelLoader::new(base_dir);

    let runtime = SimulatedRuntime::from_config(&config.simulation);
    let mut universe = engine::Universe::new(config, runtime);
    universe.load_model(&loader);

    match cli.command() {
        CliCommand::Preview => {
            let user_input = engine::user_input::UserInput::new();
            engine::Windowing::run_app(universe, user_input)
        }
        CliCommand::Headless {
            frames,
            select_at,
            sweep_degrees,
        } => {
            let summary = engine::headless::run(&mut universe, frames, select_at, sweep_degrees);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    utils::logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
