use eyre::{eyre, Result};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

const APP_NAME: &str = "spider-panel";
const LOG_FILE_NAME: &str = "spider-panel.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Send all log output to the per-user log file. The terminal is reserved for the panel.
pub fn init_logging(verbose: bool) -> Result<()> {
    let path = get_log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let level = resolve_level(std::env::var("RUST_LOG").ok().as_deref(), verbose);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                chrono::Utc::now().format(TIMESTAMP_FORMAT),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;

    log::info!("[logging] init: path={} level={}", path.display(), level);
    Ok(())
}

/// `--verbose` wins; otherwise `RUST_LOG` if it parses, else INFO
fn resolve_level(env_level: Option<&str>, verbose: bool) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    env_level
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Where the log file lives: `~/Library/Logs` on macOS, `/var/log` for root on Linux,
/// the local data directory everywhere else.
pub fn get_log_file_path() -> Result<PathBuf> {
    Ok(log_dir()?.join(LOG_FILE_NAME))
}

fn log_dir() -> Result<PathBuf> {
    if cfg!(target_os = "macos") {
        let home = dirs::home_dir().ok_or_else(|| eyre!("no home directory"))?;
        return Ok(home.join("Library").join("Logs").join(APP_NAME));
    }
    if cfg!(target_os = "linux") && nix::unistd::getuid().is_root() {
        return Ok(PathBuf::from("/var/log").join(APP_NAME));
    }
    let data = dirs::data_local_dir().ok_or_else(|| eyre!("no local data directory"))?;
    Ok(data.join(APP_NAME).join("logs"))
}
