//! Logging bootstrap for the `pb` binary.
//!
//! Diagnostics go to stderr so that `pb --json` output on stdout stays
//! machine-readable. Events use the `event=<name> key=value` line shape.

use flexi_logger::{Logger, LoggerHandle};
use log::debug;
use once_cell::sync::OnceCell;

/// Environment variable that overrides the configured log level
pub const LOG_ENV: &str = "PLANBOARD_LOG";

const LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

static LOGGER: OnceCell<(&'static str, LoggerHandle)> = OnceCell::new();

/// Pick the effective level. `-v` flags win over the environment, which wins
/// over the board config. Unknown values fall through to the next source.
pub fn resolve_level(verbose: u8, env: Option<&str>, config: Option<&str>) -> &'static str {
    match verbose {
        0 => {}
        1 => return "info",
        _ => return "debug",
    }
    env.and_then(normalize_level)
        .or_else(|| config.and_then(normalize_level))
        .unwrap_or("warn")
}

/// Start the stderr logger at `level`. Later calls keep the first level.
pub fn init_logging(level: &str) -> Result<(), String> {
    let level = normalize_level(level).ok_or_else(|| format!("unsupported log level `{level}`"))?;

    let (active, _) = LOGGER.get_or_try_init(|| -> Result<_, String> {
        let handle = Logger::try_with_str(level)
            .map_err(|err| format!("invalid log level `{level}`: {err}"))?
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;
        Ok((level, handle))
    })?;

    debug!(
        "event=logging_init level={} version={}",
        active,
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn normalize_level(level: &str) -> Option<&'static str> {
    let lowered = level.trim().to_ascii_lowercase();
    LEVELS.iter().copied().find(|l| *l == lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flags_win() {
        assert_eq!(resolve_level(1, Some("error"), Some("trace")), "info");
        assert_eq!(resolve_level(3, None, None), "debug");
    }

    #[test]
    fn env_then_config_then_default() {
        assert_eq!(resolve_level(0, Some("DEBUG"), Some("error")), "debug");
        assert_eq!(resolve_level(0, Some("loud"), Some("error")), "error");
        assert_eq!(resolve_level(0, None, Some("nonsense")), "warn");
        assert_eq!(resolve_level(0, None, None), "warn");
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(init_logging("chatty").is_err());
    }
}
