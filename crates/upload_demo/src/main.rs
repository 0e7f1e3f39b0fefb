use std::path::PathBuf;

use anyhow::Result;
use log::LevelFilter;
use upload_demo::config::load_or_default;
use upload_demo::logging::{self, LogDestination};
use upload_demo::scenario;

fn main() -> Result<()> {
    logging::initialize(LogDestination::Both, LevelFilter::Info);

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = load_or_default(config_path.as_deref())?;
    let report = scenario::run(&config)?;
    report.log();

    println!("{}", report.html);
    Ok(())
}
