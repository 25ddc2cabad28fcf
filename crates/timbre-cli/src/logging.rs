use anyhow::{anyhow, Result};
use timbre_search::config::LoggingConfig;
use twyg::{LogLevel, OptsBuilder};

/// Install the global logger from the `[logging]` config section.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let opts = OptsBuilder::new()
        .coloured(config.coloured)
        .level(parse_level(&config.level)?)
        .build()
        .map_err(|e| anyhow!("Invalid logging options: {e}"))?;

    twyg::setup(opts).map_err(|e| anyhow!("Failed to initialise logging: {e}"))?;
    Ok(())
}

fn parse_level(level: &str) -> Result<LogLevel> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(anyhow!(
            "Unknown log level '{other}' (expected trace, debug, info, warn, or error)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert!(matches!(parse_level("INFO"), Ok(LogLevel::Info)));
        assert!(matches!(parse_level(" warning "), Ok(LogLevel::Warn)));
        assert!(parse_level("loud").is_err());
    }
}
