use std::{
	fs,
	io::{self, BufRead},
	path::Path,
	sync::mpsc::{self, Receiver, TryRecvError},
	thread,
	time::{Duration, Instant, SystemTime},
};

use random_background::{
	background::{BackgroundSettings, Collaborators, Document, RotationController},
	bootstrap,
	data_loaders::config::AddonConfig,
	error,
	host_bridge::{HostBridge, HostCommand},
	info, logging,
	store::JsonFileStore,
	utility::{addon_root_dir, config_path, log_path},
	warn, DEBUG_NAME,
};

fn config_modified(path: &Path) -> Option<SystemTime> {
	fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Stdin lines become host commands; end of input means the host is gone.
fn spawn_command_reader() -> Receiver<HostCommand> {
	let (tx, rx) = mpsc::channel();
	thread::spawn(move || {
		for line in io::stdin().lock().lines() {
			let Ok(line) = line else {
				break;
			};
			if let Some(cmd) = HostCommand::parse(&line) {
				if tx.send(cmd).is_err() {
					return;
				}
			}
		}
		let _ = tx.send(HostCommand::Stop);
	});
	rx
}

/// Writes config.yaml's background overrides into the persisted settings
/// before the controller reads them.
fn seed_settings(store: &mut JsonFileStore, config: &AddonConfig) {
	if config.background.is_empty() {
		return;
	}
	let mut settings = BackgroundSettings::load(store);
	let preferences = config.background.apply_to(settings.preferences());
	if settings.apply_preferences(preferences) {
		settings.save(store);
		info!("[{}] Seeded stored settings from config.yaml", DEBUG_NAME);
	}
}

fn apply_config(controller: &mut RotationController, bridge: &HostBridge, config: &AddonConfig) {
	logging::set_debug(config.debug);
	logging::set_level(&config.log_level);

	controller.set_proxy(config.proxy.clone());
	if bridge_viewport_changed(bridge, config) {
		controller.viewport_changed();
	}

	let preferences = config.background.apply_to(controller.settings().preferences());
	controller.on_config_change(preferences);
}

fn bridge_viewport_changed(bridge: &HostBridge, config: &AddonConfig) -> bool {
	if bridge.viewport() == config.viewport {
		return false;
	}
	bridge.set_viewport(config.viewport);
	true
}

fn main() {
	let root = addon_root_dir();
	logging::init(true, "info", &log_path(&root));
	bootstrap::bootstrap_addon(&root);

	let config_path = config_path(&root);
	let mut config = AddonConfig::load(&config_path).unwrap_or_default();

	logging::set_debug(config.debug);
	logging::set_level(&config.log_level);
	std::panic::set_hook(Box::new(|panic_info| {
		error!("[{}] Panic: {}", DEBUG_NAME, panic_info);
	}));

	info!("!---------- [{}] Starting Random Background Addon ----------!", DEBUG_NAME);
	info!("[{}] Config loaded from {}", DEBUG_NAME, config_path.display());

	let mut store = JsonFileStore::new(&root);
	seed_settings(&mut store, &config);

	let bridge = HostBridge::stdout(config.viewport);
	let mut controller = RotationController::start(
		Collaborators::new(Box::new(store), Box::new(bridge.clone()))
			.with_proxy(config.proxy.clone()),
	);

	let commands = spawn_command_reader();

	let mut loop_sleep = Duration::from_millis(config.settings.runtime.tick_sleep_ms.max(1));
	let mut watcher_enabled = config.settings.watcher.enabled;
	let mut watcher_interval = Duration::from_millis(config.settings.watcher.interval_ms.max(100));
	let mut last_watch_tick = Instant::now();
	let mut last_config_modified = config_modified(&config_path);
	let mut force_reload = false;

	loop {
		loop {
			let cmd = match commands.try_recv() {
				Ok(cmd) => cmd,
				Err(TryRecvError::Empty) => break,
				Err(TryRecvError::Disconnected) => HostCommand::Stop,
			};

			match cmd {
				HostCommand::Next => controller.next_background(),
				HostCommand::Reload => force_reload = true,
				HostCommand::Viewport(viewport) => {
					bridge.set_viewport(viewport);
					controller.viewport_changed();
					info!(
						"[{}][HOST] Viewport is now {}x{}",
						DEBUG_NAME, viewport.width, viewport.height
					);
				}
				HostCommand::Stop => {
					info!("[{}][HOST] Stop requested, shutting down", DEBUG_NAME);
					controller.stop();
					return;
				}
			}
		}

		controller.poll();

		let watch_due = watcher_enabled && last_watch_tick.elapsed() >= watcher_interval;
		if watch_due || force_reload {
			last_watch_tick = Instant::now();

			let current_modified = config_modified(&config_path);
			let changed = match (last_config_modified, current_modified) {
				(Some(prev), Some(curr)) => curr > prev,
				(None, Some(_)) => true,
				_ => false,
			};

			if changed || force_reload {
				match AddonConfig::load(&config_path) {
					Some(new_config) => {
						config = new_config;
						apply_config(&mut controller, &bridge, &config);
						loop_sleep =
							Duration::from_millis(config.settings.runtime.tick_sleep_ms.max(1));
						watcher_enabled = config.settings.watcher.enabled;
						watcher_interval =
							Duration::from_millis(config.settings.watcher.interval_ms.max(100));
						if config.settings.diagnostics.log_watcher_reloads {
							warn!(
								"[{}][WATCHER] Reloaded config from {}",
								DEBUG_NAME,
								config_path.display()
							);
						}
					}
					None => {
						warn!(
							"[{}][WATCHER] Detected config change but failed to parse {}; keeping previous config",
							DEBUG_NAME,
							config_path.display()
						);
					}
				}

				last_config_modified = current_modified;
				force_reload = false;
			}
		}

		thread::sleep(loop_sleep);
	}
}
