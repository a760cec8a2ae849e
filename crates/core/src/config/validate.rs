use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Acquisition timeout is not 0 and exceeds the progress interval
/// - Beat and downbeat clicks use different frequencies
/// - Waveform image has a drawable size
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Acquisition validation
    let acquisition = &config.acquisition;
    if acquisition.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "acquisition.timeout_secs cannot be 0".to_string(),
        ));
    }
    if acquisition.progress_interval_secs == 0
        || acquisition.progress_interval_secs >= acquisition.timeout_secs
    {
        return Err(ConfigError::ValidationError(format!(
            "acquisition.progress_interval_secs must be between 1 and {} (timeout_secs)",
            acquisition.timeout_secs.saturating_sub(1)
        )));
    }

    // Click track validation
    let clicks = &config.click_track;
    if (clicks.beat_freq_hz - clicks.downbeat_freq_hz).abs() < f32::EPSILON {
        return Err(ConfigError::ValidationError(
            "click_track.beat_freq_hz and downbeat_freq_hz must differ".to_string(),
        ));
    }
    if clicks.sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "click_track.sample_rate cannot be 0".to_string(),
        ));
    }

    // Visualization validation
    if config.visualization.width < 2 || config.visualization.height < 2 {
        return Err(ConfigError::ValidationError(
            "visualization width and height must be at least 2".to_string(),
        ));
    }

    Ok(())
}
