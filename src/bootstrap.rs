// ~/RandomBackground/src/bootstrap.rs

use std::fs;
use std::path::Path;

use crate::utility::config_path;
use crate::{info, warn, ADDON_NAME, DEBUG_NAME};

/// Create the add-on directory and scaffold default files that are missing.
/// Existing files are never overwritten.
pub fn bootstrap_addon(addon_dir: &Path) {
    info!("[{}] === Bootstrap starting ===", DEBUG_NAME);

    if let Err(e) = fs::create_dir_all(addon_dir) {
        warn!("[{}] Failed to create {}: {e}", DEBUG_NAME, addon_dir.display());
        return;
    }
    info!("[{}] Addon directory: {}", DEBUG_NAME, addon_dir.display());

    scaffold_addon_json(addon_dir);
    scaffold_config_yaml(addon_dir);
    info!("[{}] Scaffolding complete", DEBUG_NAME);
}

fn scaffold_addon_json(addon_dir: &Path) {
    let path = addon_dir.join("addon.json");
    if path.exists() { return; }

    let content = format!(
        r#"{{
    "id": "addon.{name}",
    "name": "RandomBackground",
    "description": "Shows random background from configured pool of image links",
    "exe_path": "bin/{name}",
    "protocol": "json-lines",
    "version": "{version}"
}}
"#,
        name = ADDON_NAME,
        version = env!("CARGO_PKG_VERSION")
    );
    match fs::write(&path, content) {
        Ok(_) => info!("[{}] Created addon.json", DEBUG_NAME),
        Err(e) => warn!("[{}] Failed to create addon.json: {e}", DEBUG_NAME),
    }
}

pub const DEFAULT_CONFIG_YAML: &str = r#"settings:
  watcher:
    enabled: true
    interval_ms: 600
  runtime:
    tick_sleep_ms: 50
  diagnostics:
    log_watcher_reloads: true
  development:
    debug: false
    log_level: warn

background:
  # One image link per line. `#` starts a comment, `//` comments out a line.
  # Listing a link twice makes it come up twice as often.
  images: |
    # Flowers
    # https://xxx/a.jpg

    // Cute cats!
    # https://yyy/b.png
  alpha: 0.625
  fading_seconds: 3
  # ease | linear | ease-in | ease-out | ease-in-out | none
  transition: ease-in-out
  # Seconds between image changes, <= 0 keeps one image until restart
  interval: 0
  use_image_proxy: false

proxy:
  base_url: ""
  token: ""
  quality: 100

viewport:
  width: 1920
  height: 1080
"#;

fn scaffold_config_yaml(addon_dir: &Path) {
    let path = config_path(addon_dir);
    if path.exists() { return; }

    match fs::write(&path, DEFAULT_CONFIG_YAML) {
        Ok(_) => info!("[{}] Created config.yaml", DEBUG_NAME),
        Err(e) => warn!("[{}] Failed to create config.yaml: {e}", DEBUG_NAME),
    }
}
