use std::env;

use chrono::Local;
use log::LevelFilter;

fn level_from_env(verbose: bool) -> LevelFilter {
    match env::var("LOG_LEVEL").as_deref() {
        Ok("info") => LevelFilter::Info,
        Ok("debug") => LevelFilter::Debug,
        Ok("warn") => LevelFilter::Warn,
        Ok("error") => LevelFilter::Error,
        _ if verbose => LevelFilter::Info,
        _ => LevelFilter::Warn,
    }
}

/// Logs go to stderr so that stdout only carries the report.
pub fn setup_logging(verbose: bool) -> Result<(), fern::InitError> {
    let level = level_from_env(verbose);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}: {}",
                Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
