//! Main application entry point.

use canvas3d_app::{App, AppConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Canvas3D");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let design = std::env::args_os().nth(1).map(PathBuf::from);

    match App::run(config, design) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Exiting: {e}");
            ExitCode::FAILURE
        }
    }
}
