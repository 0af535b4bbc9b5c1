use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - A yt-dlp executable path and an audio format are set
/// - The concurrency limit and history caps are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.media.ytdlp_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "media.ytdlp_path cannot be empty".to_string(),
        ));
    }

    let format = &config.media.audio_format;
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::ValidationError(format!(
            "media.audio_format must be a plain extension like \"m4a\", got {:?}",
            format
        )));
    }

    if config.download.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "download.max_concurrent_jobs must be at least 1".to_string(),
        ));
    }

    if config.download.max_tracked_jobs == 0 || config.download.max_recent_logs == 0 {
        return Err(ConfigError::ValidationError(
            "download.max_tracked_jobs and download.max_recent_logs must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_audio_format_with_path_separator_fails() {
        let mut config = Config::default();
        config.media.audio_format = "../m4a".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.download.max_concurrent_jobs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_jobs"));
    }
}
