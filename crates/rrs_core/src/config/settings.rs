//! Settings struct with TOML-based sections.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Which optional pipeline stages run.
    #[serde(default)]
    pub stages: StageSettings,

    /// External collaborator executables.
    #[serde(default)]
    pub executables: ExecutableSettings,

    /// Playback and monitor timer settings.
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Session logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Application base directory; session trees live below it.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Radar site catalog file.
    #[serde(default = "default_site_catalog")]
    pub site_catalog: String,

    /// Externally visible URL prefix for session asset trees.
    #[serde(default = "default_link_base")]
    pub link_base: String,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_site_catalog() -> String {
    "assets/radar_sites.toml".to_string()
}

fn default_link_base() -> String {
    "http://localhost:8050/assets".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            site_catalog: default_site_catalog(),
            link_base: default_link_base(),
        }
    }
}

/// Per-run selection of optional pipeline stages.
///
/// The metadata stage is not listed here: it always executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSettings {
    /// Query and download raw radar files.
    #[serde(default = "default_true")]
    pub download: bool,

    /// Transpose radar data in time/space for polling.
    #[serde(default = "default_true")]
    pub transpose: bool,

    /// Fast placefiles (reports, surface obs, probability products).
    #[serde(default = "default_true")]
    pub fast_placefiles: bool,

    /// Secondary-model environment placefiles.
    #[serde(default = "default_true")]
    pub model_placefiles: bool,

    /// Hodograph-style renders.
    #[serde(default = "default_true")]
    pub hodographs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            download: true,
            transpose: true,
            fast_placefiles: true,
            model_placefiles: true,
            hodographs: true,
        }
    }
}

impl StageSettings {
    /// A selection with every optional stage disabled.
    pub fn none() -> Self {
        Self {
            download: false,
            transpose: false,
            fast_placefiles: false,
            model_placefiles: false,
            hodographs: false,
        }
    }
}

/// Paths to the external collaborator programs, one per stage task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutableSettings {
    #[serde(default = "default_nexrad_fetch")]
    pub nexrad_fetch: String,

    #[serde(default = "default_radar_munge")]
    pub radar_munge: String,

    #[serde(default = "default_reports_placefile")]
    pub reports_placefile: String,

    #[serde(default = "default_obs_placefile")]
    pub obs_placefile: String,

    #[serde(default = "default_probsevere_fetch")]
    pub probsevere_fetch: String,

    #[serde(default = "default_probsevere_placefile")]
    pub probsevere_placefile: String,

    #[serde(default = "default_model_placefile")]
    pub model_placefile: String,

    #[serde(default = "default_event_times")]
    pub event_times: String,

    #[serde(default = "default_hodo_render")]
    pub hodo_render: String,
}

fn default_nexrad_fetch() -> String {
    "scripts/nexrad_fetch".to_string()
}
fn default_radar_munge() -> String {
    "scripts/radar_munge".to_string()
}
fn default_reports_placefile() -> String {
    "scripts/reports_placefile".to_string()
}
fn default_obs_placefile() -> String {
    "scripts/obs_placefile".to_string()
}
fn default_probsevere_fetch() -> String {
    "scripts/probsevere_fetch".to_string()
}
fn default_probsevere_placefile() -> String {
    "scripts/probsevere_placefile".to_string()
}
fn default_model_placefile() -> String {
    "scripts/model_placefile".to_string()
}
fn default_event_times() -> String {
    "scripts/event_times".to_string()
}
fn default_hodo_render() -> String {
    "scripts/hodo_render".to_string()
}

impl Default for ExecutableSettings {
    fn default() -> Self {
        Self {
            nexrad_fetch: default_nexrad_fetch(),
            radar_munge: default_radar_munge(),
            reports_placefile: default_reports_placefile(),
            obs_placefile: default_obs_placefile(),
            probsevere_fetch: default_probsevere_fetch(),
            probsevere_placefile: default_probsevere_placefile(),
            model_placefile: default_model_placefile(),
            event_times: default_event_times(),
            hodo_render: default_hodo_render(),
        }
    }
}

/// Timer configuration for playback and monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Seconds of virtual time added per playback tick (before the
    /// speed multiplier), and the tick interval itself.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    /// Monitor sampling interval in seconds.
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_seconds: u64,

    /// Initial speed multiplier.
    #[serde(default = "default_speed")]
    pub default_speed: f64,
}

fn default_tick_seconds() -> u64 {
    60
}

fn default_monitor_interval() -> u64 {
    2
}

fn default_speed() -> f64 {
    1.0
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            monitor_interval_seconds: default_monitor_interval(),
            default_speed: default_speed(),
        }
    }
}

/// Session logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (collaborator output only kept in tail).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of collaborator output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: usize,

    /// Show timestamps in session log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_error_tail() -> usize {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_all_stages() {
        let settings = Settings::default();
        assert!(settings.stages.download);
        assert!(settings.stages.hodographs);
    }

    #[test]
    fn empty_toml_parses_with_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.playback.tick_seconds, 60);
        assert_eq!(settings.logging.error_tail, 20);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [stages]
            download = false
            "#,
        )
        .unwrap();
        assert!(!settings.stages.download);
        assert!(settings.stages.transpose);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.playback.tick_seconds, settings.playback.tick_seconds);
        assert_eq!(parsed.paths.base_dir, settings.paths.base_dir);
    }
}
