pub mod background;
pub mod bootstrap;
pub mod data_loaders;
pub mod error;
pub mod host_bridge;
pub mod logging;
pub mod store;
pub mod utility;

pub const ADDON_NAME: &str = "random-background";
pub const DEBUG_NAME: &str = "RANDOM_BACKGROUND";
