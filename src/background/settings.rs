//! Persisted add-on settings and the user-editable preference subset.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{store::SettingsStore, warn, DEBUG_NAME};

pub const SETTINGS_NAMESPACE: &str = "RandomBackground";
pub const SETTINGS_KEY: &str = "settings";

pub const DEFAULT_ALPHA: f64 = 0.625;
pub const DEFAULT_FADING_SECONDS: f64 = 3.0;
pub const DEFAULT_INTERVAL: f64 = 0.0;

/// Easing curve of the background-image transition. `Instant` switches with
/// no transition rule at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionType {
    #[serde(rename = "")]
    Instant,
    #[serde(rename = "ease")]
    Ease,
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "ease-in")]
    EaseIn,
    #[serde(rename = "ease-out")]
    EaseOut,
    #[default]
    #[serde(rename = "ease-in-out")]
    EaseInOut,
}

impl TransitionType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" | "instant" | "off" => Some(Self::Instant),
            "ease" => Some(Self::Ease),
            "linear" => Some(Self::Linear),
            "ease-in" | "ease_in" | "easein" => Some(Self::EaseIn),
            "ease-out" | "ease_out" | "easeout" => Some(Self::EaseOut),
            "ease-in-out" | "ease_in_out" | "easeinout" => Some(Self::EaseInOut),
            _ => None,
        }
    }

    /// CSS timing function, `None` for an instant switch.
    pub fn timing_function(self) -> Option<&'static str> {
        match self {
            Self::Instant => None,
            Self::Ease => Some("ease"),
            Self::Linear => Some("linear"),
            Self::EaseIn => Some("ease-in"),
            Self::EaseOut => Some("ease-out"),
            Self::EaseInOut => Some("ease-in-out"),
        }
    }
}

fn lenient_transition<'de, D>(deserializer: D) -> Result<TransitionType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(TransitionType::parse)
        .unwrap_or_default())
}

/// Everything persisted under `RandomBackground/settings`, including the
/// rotation state that has to survive a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSettings {
    pub alpha: f64,
    pub image_urls_pool: Vec<String>,
    pub image_urls_string: String,
    pub last_image_url: String,
    pub interval: f64,
    pub fading_seconds: f64,
    #[serde(deserialize_with = "lenient_transition")]
    pub transition_type: TransitionType,
    pub use_image_proxy: bool,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            image_urls_pool: Vec::new(),
            image_urls_string: String::new(),
            last_image_url: String::new(),
            interval: DEFAULT_INTERVAL,
            fading_seconds: DEFAULT_FADING_SECONDS,
            transition_type: TransitionType::default(),
            use_image_proxy: false,
        }
    }
}

impl BackgroundSettings {
    /// Loads the stored object merged over the defaults. Stored keys win;
    /// a stored key with the wrong shape falls back to its default alone.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let Some(stored) = store.load(SETTINGS_NAMESPACE, SETTINGS_KEY) else {
            return Self::default();
        };
        let Some(stored) = stored.as_object() else {
            warn!("[{}][STORE] Stored settings are not an object; using defaults", DEBUG_NAME);
            return Self::default();
        };

        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => return Self::default(),
        };

        for (key, value) in stored {
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value.clone());
            if serde_json::from_value::<Self>(Value::Object(candidate)).is_ok() {
                merged.insert(key.clone(), value.clone());
            } else {
                warn!(
                    "[{}][STORE] Ignoring stored '{}' with unexpected value {}",
                    DEBUG_NAME,
                    key, value
                );
            }
        }

        serde_json::from_value::<Self>(Value::Object(merged))
            .unwrap_or_default()
            .sanitized()
    }

    pub fn save(&self, store: &mut dyn SettingsStore) {
        let value = match serde_json::to_value(self) {
            Ok(v) => v,
            Err(e) => {
                warn!("[{}][STORE] Failed to encode settings: {e}", DEBUG_NAME);
                return;
            }
        };
        if let Err(e) = store.save(SETTINGS_NAMESPACE, SETTINGS_KEY, &value) {
            warn!("[{}][STORE] Failed to save settings: {e}", DEBUG_NAME);
        }
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            image_urls_string: self.image_urls_string.clone(),
            alpha: self.alpha,
            fading_seconds: self.fading_seconds,
            transition_type: self.transition_type,
            interval: self.interval,
            use_image_proxy: self.use_image_proxy,
        }
    }

    /// Overwrites the user-editable fields, returning whether anything
    /// changed. A different URL text also empties the persisted bag so the
    /// next start draws from the new list.
    pub fn apply_preferences(&mut self, preferences: Preferences) -> bool {
        let preferences = preferences.sanitized();
        if preferences == self.preferences() {
            return false;
        }
        if preferences.image_urls_string != self.image_urls_string {
            self.image_urls_pool.clear();
        }
        self.image_urls_string = preferences.image_urls_string;
        self.alpha = preferences.alpha;
        self.fading_seconds = preferences.fading_seconds;
        self.transition_type = preferences.transition_type;
        self.interval = preferences.interval;
        self.use_image_proxy = preferences.use_image_proxy;
        true
    }

    fn sanitized(mut self) -> Self {
        let prefs = self.preferences().sanitized();
        self.alpha = prefs.alpha;
        self.fading_seconds = prefs.fading_seconds;
        self.interval = prefs.interval;
        self
    }
}

/// The part of the settings a user edits directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub image_urls_string: String,
    pub alpha: f64,
    pub fading_seconds: f64,
    pub transition_type: TransitionType,
    pub interval: f64,
    pub use_image_proxy: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        BackgroundSettings::default().preferences()
    }
}

impl Preferences {
    /// Non-finite numbers fall back to their defaults; alpha is clamped to
    /// 0..=1 and the fade duration cannot go negative.
    pub fn sanitized(mut self) -> Self {
        self.alpha = if self.alpha.is_finite() {
            self.alpha.clamp(0.0, 1.0)
        } else {
            DEFAULT_ALPHA
        };
        self.fading_seconds = if self.fading_seconds.is_finite() {
            self.fading_seconds.max(0.0)
        } else {
            DEFAULT_FADING_SECONDS
        };
        if !self.interval.is_finite() {
            self.interval = DEFAULT_INTERVAL;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn load_without_stored_value_gives_defaults() {
        let store = MemoryStore::new();
        let settings = BackgroundSettings::load(&store);
        assert_eq!(settings, BackgroundSettings::default());
        assert_eq!(settings.alpha, 0.625);
        assert_eq!(settings.fading_seconds, 3.0);
        assert_eq!(settings.transition_type, TransitionType::EaseInOut);
    }

    #[test]
    fn stored_values_win_and_bad_keys_fall_back() {
        let mut store = MemoryStore::new();
        store
            .save(
                SETTINGS_NAMESPACE,
                SETTINGS_KEY,
                &json!({
                    "alpha": 0.3,
                    "interval": "soon",
                    "last_image_url": "http://a",
                    "image_urls_pool": ["http://b"],
                    "transition_type": "bouncy",
                    "interval_id": 17
                }),
            )
            .unwrap();

        let settings = BackgroundSettings::load(&store);
        assert_eq!(settings.alpha, 0.3);
        assert_eq!(settings.interval, DEFAULT_INTERVAL);
        assert_eq!(settings.last_image_url, "http://a");
        assert_eq!(settings.image_urls_pool, vec!["http://b".to_string()]);
        assert_eq!(settings.transition_type, TransitionType::EaseInOut);
    }

    #[test]
    fn transition_serializes_to_css_names() {
        let mut settings = BackgroundSettings::default();
        settings.transition_type = TransitionType::Instant;
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["transition_type"], json!(""));

        settings.transition_type = TransitionType::EaseOut;
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["transition_type"], json!("ease-out"));
    }

    #[test]
    fn applying_new_urls_discards_the_bag() {
        let mut settings = BackgroundSettings {
            image_urls_string: "http://a\nhttp://b".to_string(),
            image_urls_pool: vec!["http://b".to_string()],
            ..BackgroundSettings::default()
        };

        let mut prefs = settings.preferences();
        prefs.alpha = 0.1;
        assert!(settings.apply_preferences(prefs.clone()));
        assert_eq!(settings.image_urls_pool, vec!["http://b".to_string()]);
        assert!(!settings.apply_preferences(prefs.clone()));

        prefs.image_urls_string = "http://c".to_string();
        assert!(settings.apply_preferences(prefs));
        assert!(settings.image_urls_pool.is_empty());
        assert_eq!(settings.alpha, 0.1);
    }

    #[test]
    fn sanitizing_clamps_out_of_range_numbers() {
        let prefs = Preferences {
            alpha: 4.0,
            fading_seconds: -2.0,
            interval: f64::NAN,
            ..Preferences::default()
        }
        .sanitized();
        assert_eq!(prefs.alpha, 1.0);
        assert_eq!(prefs.fading_seconds, 0.0);
        assert_eq!(prefs.interval, DEFAULT_INTERVAL);
    }
}
