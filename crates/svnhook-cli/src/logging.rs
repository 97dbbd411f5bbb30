use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use svnhook::Config;
use tracing::Level;

/// Sends `tracing` output to the hook log file.
///
/// Stderr belongs to the Subversion client, so nothing is logged there. If the
/// file cannot be opened the hook runs without a log.
pub fn init(config: &Config, log_path: &Path) {
    let Ok(file) = OpenOptions::new().create(true).append(true).open(log_path) else {
        return;
    };
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}
