use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

pub const HOME_ENV: &str = "RANDOM_BACKGROUND_HOME";
const ADDON_DIR_NAME: &str = ".RandomBackground";

pub fn user_home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .filter_map(|var| env::var_os(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Directory of the running executable, skipping a trailing `bin/`.
pub fn exe_root_dir() -> Option<PathBuf> {
    let exe_path = env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    if exe_dir.file_name().and_then(|n| n.to_str()) == Some("bin") {
        return exe_dir.parent().map(Path::to_path_buf);
    }

    Some(exe_dir.to_path_buf())
}

/// Where config, persisted settings and the log live.
pub fn addon_root_dir() -> PathBuf {
    resolve_addon_root(env::var_os(HOME_ENV), user_home_dir(), exe_root_dir())
}

fn resolve_addon_root(
    override_dir: Option<OsString>,
    home: Option<PathBuf>,
    exe_root: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(home) = home {
        return home.join(ADDON_DIR_NAME);
    }
    exe_root.unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join("config.yaml")
}

pub fn log_path(root: &Path) -> PathBuf {
    root.join("random-background.log")
}
