use crate::config::{
    EmptySnapshotPolicy, Granularity, SliderSpec, DEFAULT_BUCKET_HOURS, DEFAULT_MAP_SCALE,
    DEFAULT_PADDING, DEFAULT_SLIDER_SCALE,
};
use crate::timefmt::{TimeNormalizer, DEFAULT_DISPLAY_TZ};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of `config.toml`. Every section and field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub time: TimeSettings,
    pub view: ViewSettings,
    pub slider: SliderSpec,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub delimiter: char,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    /// Zone assumed for timestamps that carry no offset
    pub source_zone: String,
    pub display_zone: String,
    pub granularity: Granularity,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            source_zone: "UTC".to_string(),
            display_zone: DEFAULT_DISPLAY_TZ.name().to_string(),
            granularity: Granularity::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub map_scale: f64,
    pub slider_scale: f64,
    pub padding: f64,
    pub bucket_hours: f64,
    pub show_overlay: bool,
    pub empty_policy: EmptySnapshotPolicy,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            map_scale: DEFAULT_MAP_SCALE,
            slider_scale: DEFAULT_SLIDER_SCALE,
            padding: DEFAULT_PADDING,
            bucket_hours: DEFAULT_BUCKET_HOURS,
            show_overlay: true,
            empty_policy: EmptySnapshotPolicy::default(),
        }
    }
}

impl ViewSettings {
    /// Replace unusable numbers with defaults. Returns a description of
    /// every field that had to change.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();
        let defaults = ViewSettings::default();

        if !self.bucket_hours.is_finite() || self.bucket_hours <= 0.0 {
            fixes.push(format!(
                "bucket_hours {} replaced by {}",
                self.bucket_hours, defaults.bucket_hours
            ));
            self.bucket_hours = defaults.bucket_hours;
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            fixes.push(format!("padding {} replaced by {}", self.padding, defaults.padding));
            self.padding = defaults.padding;
        }
        fixes
    }
}

impl Settings {
    /// Read settings from `explicit`, or from the default location. A missing
    /// or malformed file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => Self::config_path(),
        };
        if !path.exists() {
            if explicit.is_some() {
                tracing::warn!(path = %path.display(), "settings file not found, using defaults");
            }
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    tracing::debug!(path = %path.display(), "settings loaded");
                    settings
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "malformed settings, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut settings: Settings = toml::from_str(content)?;
        for fix in settings.view.sanitize() {
            tracing::warn!("{fix}");
        }
        Ok(settings)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slicktrack")
            .join("config.toml")
    }

    /// Normalizer for the configured zones; `display_override` wins over
    /// the file. Unknown zone names fall back to the defaults.
    pub fn time_normalizer(&self, display_override: Option<&str>) -> TimeNormalizer {
        let source = resolve_zone(&self.time.source_zone, Tz::UTC);
        let display_name = display_override.unwrap_or(&self.time.display_zone);
        let display = resolve_zone(display_name, DEFAULT_DISPLAY_TZ);
        TimeNormalizer::new(source, display, self.time.granularity)
    }

    /// Field delimiter as a byte. Only single-byte ASCII delimiters work.
    pub fn delimiter(&self, cli_override: Option<char>) -> u8 {
        let ch = cli_override.unwrap_or(self.data.delimiter);
        if ch.is_ascii() {
            ch as u8
        } else {
            tracing::warn!(delimiter = %ch, "delimiter must be ASCII, using ','");
            b','
        }
    }

    /// Slider spec with nonsensical values repaired
    pub fn slider_spec(&self) -> SliderSpec {
        let mut spec = self.slider.clone();
        for fix in spec.sanitize() {
            tracing::warn!("{fix}");
        }
        spec
    }
}

fn resolve_zone(name: &str, fallback: Tz) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(zone = name, fallback = fallback.name(), "unknown time zone");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::parse("").unwrap();
        assert_eq!(s.view.map_scale, 10_000.0);
        assert_eq!(s.view.slider_scale, 15_000.0);
        assert_eq!(s.view.padding, 0.02);
        assert!(s.view.show_overlay);
        assert_eq!(s.slider, SliderSpec::default());
        assert_eq!(s.delimiter(None), b',');
        assert_eq!(s.time_normalizer(None), TimeNormalizer::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let s = Settings::parse(
            r#"
            [data]
            delimiter = ";"

            [time]
            granularity = "second"

            [view]
            empty_policy = "keep_previous"

            [slider]
            max = 48.0
            "#,
        )
        .unwrap();
        assert_eq!(s.delimiter(None), b';');
        assert_eq!(s.delimiter(Some('\t')), b'\t');
        assert_eq!(s.time.granularity, Granularity::Second);
        assert_eq!(s.time.display_zone, "America/St_Johns");
        assert_eq!(s.view.empty_policy, EmptySnapshotPolicy::KeepPrevious);
        assert_eq!(s.slider.max, 48.0);
        assert_eq!(s.slider.step, 2.0);
        assert_eq!(s.slider.label, "Hour");
    }

    #[test]
    fn unknown_zone_falls_back() {
        let mut s = Settings::default();
        s.time.display_zone = "Mars/Olympus_Mons".to_string();
        assert_eq!(s.time_normalizer(None).display_zone(), DEFAULT_DISPLAY_TZ);
        let utc = s.time_normalizer(Some("UTC"));
        assert_eq!(utc.display_zone(), Tz::UTC);
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let s = Settings::default();
        assert_eq!(s.delimiter(Some('§')), b',');
    }

    #[test]
    fn slider_spec_is_sanitized() {
        let mut s = Settings::default();
        s.slider.step = 0.0;
        let spec = s.slider_spec();
        assert_eq!(spec.step, 24.0);
    }

    #[test]
    fn out_of_range_view_numbers_are_replaced() {
        let s = Settings::parse("[view]\nbucket_hours = 1e20\npadding = -1.0").unwrap();
        assert_eq!(s.view.bucket_hours, 1e20);
        assert_eq!(s.view.padding, DEFAULT_PADDING);

        let s = Settings::parse("[view]\nbucket_hours = inf\npadding = nan").unwrap();
        assert_eq!(s.view.bucket_hours, DEFAULT_BUCKET_HOURS);
        assert_eq!(s.view.padding, DEFAULT_PADDING);

        let s = Settings::parse("[view]\nbucket_hours = 0.0").unwrap();
        assert_eq!(s.view.bucket_hours, DEFAULT_BUCKET_HOURS);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("Could not create temp file");
        writeln!(file, "[view]\nmap_scale = \"big\"").unwrap();
        let s = Settings::load(Some(file.path()));
        assert_eq!(s.view.map_scale, DEFAULT_MAP_SCALE);
    }

    #[test]
    fn file_values_are_read() {
        let mut file = tempfile::NamedTempFile::new().expect("Could not create temp file");
        writeln!(file, "[view]\nbucket_hours = 6.0\nshow_overlay = false").unwrap();
        let s = Settings::load(Some(file.path()));
        assert_eq!(s.view.bucket_hours, 6.0);
        assert!(!s.view.show_overlay);
    }
}
