use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::yaml::load_yaml;
use crate::background::{
    proxy::{ImageProxy, DEFAULT_QUALITY},
    settings::{Preferences, TransitionType},
    surfaces::Viewport,
};

#[derive(Debug, Clone)]
pub struct AddonConfig {
    pub debug: bool,
    pub log_level: String,
    pub settings: AddonSettings,
    pub background: BackgroundOverrides,
    pub proxy: Option<ImageProxy>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone)]
pub struct AddonSettings {
    pub watcher: WatcherSettings,
    pub runtime: RuntimeSettings,
    pub diagnostics: DiagnosticsSettings,
}

#[derive(Debug, Clone)]
pub struct WatcherSettings {
    pub enabled: bool,
    pub interval_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub tick_sleep_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DiagnosticsSettings {
    pub log_watcher_reloads: bool,
}

/// Values from the `background` section. Keys left out of the file keep
/// whatever the persisted settings hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundOverrides {
    pub images: Option<String>,
    pub alpha: Option<f64>,
    pub fading_seconds: Option<f64>,
    pub transition: Option<TransitionType>,
    pub interval: Option<f64>,
    pub use_image_proxy: Option<bool>,
}

impl BackgroundOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, mut base: Preferences) -> Preferences {
        if let Some(images) = &self.images {
            base.image_urls_string = images.clone();
        }
        if let Some(alpha) = self.alpha {
            base.alpha = alpha;
        }
        if let Some(fading_seconds) = self.fading_seconds {
            base.fading_seconds = fading_seconds;
        }
        if let Some(transition) = self.transition {
            base.transition_type = transition;
        }
        if let Some(interval) = self.interval {
            base.interval = interval;
        }
        if let Some(use_image_proxy) = self.use_image_proxy {
            base.use_image_proxy = use_image_proxy;
        }
        base.sanitized()
    }
}

impl Default for AddonSettings {
    fn default() -> Self {
        Self {
            watcher: WatcherSettings::default(),
            runtime: RuntimeSettings::default(),
            diagnostics: DiagnosticsSettings::default(),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 600,
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self { tick_sleep_ms: 50 }
    }
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            log_watcher_reloads: true,
        }
    }
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "warn".to_string(),
            settings: AddonSettings::default(),
            background: BackgroundOverrides::default(),
            proxy: None,
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
        }
    }
}

impl AddonConfig {
    pub fn load(path: &Path) -> Option<Self> {
        let value = load_yaml(path)?;
        Self::from_yaml(&value)
    }

    pub fn from_yaml(root: &Value) -> Option<Self> {
        // An empty file is a valid, all-defaults config.
        if root.is_null() {
            return Some(Self::default());
        }
        let map = root.as_mapping()?;
        let defaults = Self::default();

        let development = mapping_at(map, "development")
            .or_else(|| mapping_at(map, "settings").and_then(|s| mapping_at(s, "development")));

        let debug = bool_at(map, "debug")
            .or_else(|| development.and_then(|dev| bool_any(dev, &["debug", "debug_mode"])))
            .unwrap_or(defaults.debug);
        let log_level = str_at(map, "log_level")
            .or_else(|| development.and_then(|dev| str_any(dev, &["log_level", "logging"])))
            .unwrap_or(&defaults.log_level)
            .to_lowercase();

        Some(Self {
            debug,
            log_level,
            settings: parse_settings(map),
            background: mapping_at(map, "background")
                .map(parse_background)
                .unwrap_or_default(),
            proxy: mapping_at(map, "proxy").and_then(parse_proxy),
            viewport: mapping_at(map, "viewport")
                .map(|vp| parse_viewport(vp, defaults.viewport))
                .unwrap_or(defaults.viewport),
        })
    }
}

fn parse_settings(root: &Mapping) -> AddonSettings {
    let mut settings = AddonSettings::default();
    let Some(section) = mapping_at(root, "settings") else {
        return settings;
    };

    if let Some(watcher) = mapping_at(section, "watcher") {
        settings.watcher.enabled = bool_at(watcher, "enabled").unwrap_or(settings.watcher.enabled);
        settings.watcher.interval_ms = u64_at(watcher, "interval_ms")
            .unwrap_or(settings.watcher.interval_ms)
            .max(100);
    }

    if let Some(runtime) = mapping_at(section, "runtime") {
        settings.runtime.tick_sleep_ms = u64_at(runtime, "tick_sleep_ms")
            .unwrap_or(settings.runtime.tick_sleep_ms)
            .max(1);
    }

    if let Some(diag) = mapping_at(section, "diagnostics") {
        settings.diagnostics.log_watcher_reloads =
            bool_any(diag, &["log_watcher_reloads", "log_live_reload"])
                .unwrap_or(settings.diagnostics.log_watcher_reloads);
    }

    settings
}

fn parse_background(section: &Mapping) -> BackgroundOverrides {
    BackgroundOverrides {
        images: images_any(section, &["images", "image_urls", "image_urls_string"]),
        alpha: f64_any(section, &["alpha", "opacity"]),
        fading_seconds: f64_any(section, &["fading_seconds", "fade_seconds", "fade"]),
        transition: str_any(section, &["transition", "transition_type"])
            .and_then(TransitionType::parse)
            .or_else(|| {
                // `transition: ~` or `transition: false` mean an instant switch.
                let raw = any_value(section, &["transition", "transition_type"])?;
                (raw.is_null() || raw.as_bool() == Some(false)).then_some(TransitionType::Instant)
            }),
        interval: f64_any(section, &["interval", "interval_seconds"]),
        use_image_proxy: bool_any(section, &["use_image_proxy", "proxy"]),
    }
}

fn parse_proxy(section: &Mapping) -> Option<ImageProxy> {
    let base_url = str_any(section, &["base_url", "url", "endpoint"])?.trim();
    if base_url.is_empty() {
        return None;
    }
    let token = str_at(section, "token").unwrap_or_default().trim();
    let quality = u64_at(section, "quality")
        .map(|q| q.min(100) as u8)
        .unwrap_or(DEFAULT_QUALITY);
    Some(ImageProxy::new(base_url, token, quality))
}

fn parse_viewport(section: &Mapping, fallback: Viewport) -> Viewport {
    Viewport {
        width: u64_at(section, "width")
            .map(|w| w.min(u32::MAX as u64) as u32)
            .unwrap_or(fallback.width),
        height: u64_at(section, "height")
            .map(|h| h.min(u32::MAX as u64) as u32)
            .unwrap_or(fallback.height),
    }
}

fn value_at<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(Value::String(key.to_string()))
}

fn any_value<'a>(map: &'a Mapping, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value_at(map, k))
}

fn bool_at(map: &Mapping, key: &str) -> Option<bool> {
    value_at(map, key)?.as_bool()
}

fn bool_any(map: &Mapping, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| bool_at(map, k))
}

fn str_at<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    value_at(map, key)?.as_str()
}

fn str_any<'a>(map: &'a Mapping, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| str_at(map, k))
}

fn mapping_at<'a>(map: &'a Mapping, key: &str) -> Option<&'a Mapping> {
    value_at(map, key)?.as_mapping()
}

fn u64_at(map: &Mapping, key: &str) -> Option<u64> {
    value_at(map, key)?
        .as_i64()
        .and_then(|v| if v >= 0 { Some(v as u64) } else { None })
}

fn f64_at(map: &Mapping, key: &str) -> Option<f64> {
    value_at(map, key)?.as_f64()
}

fn f64_any(map: &Mapping, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| f64_at(map, k))
}

/// Accepts either the raw multi-line text or a YAML list of lines.
fn images_any(map: &Mapping, keys: &[&str]) -> Option<String> {
    let value = any_value(map, keys)?;
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }
    if value.is_null() {
        return Some(String::new());
    }
    let list = value.as_sequence()?;
    let lines: Vec<&str> = list.iter().filter_map(|v| v.as_str()).collect();
    Some(lines.join("\n"))
}
