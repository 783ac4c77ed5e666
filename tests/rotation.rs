use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
    time::Duration,
};

use rand::{rngs::StdRng, SeedableRng};
use random_background::{
    background::{
        settings::{SETTINGS_KEY, SETTINGS_NAMESPACE},
        BackgroundSettings, Collaborators, HeadlessDocument, ImageProxy, ManualClock, Preferences,
        RotationController, RotationState, Viewport,
    },
    host_bridge::HostBridge,
    store::{JsonFileStore, MemoryStore, SettingsStore},
};
use serde_json::{json, Value};

const VIEWPORT: Viewport = Viewport {
    width: 1920,
    height: 1080,
};

fn start(
    store: impl SettingsStore + 'static,
    document: HeadlessDocument,
    clock: &ManualClock,
    seed: u64,
) -> RotationController {
    RotationController::start(
        Collaborators::new(Box::new(store), Box::new(document))
            .with_clock(Box::new(clock.clone()))
            .with_rng(StdRng::seed_from_u64(seed)),
    )
}

#[test]
fn two_urls_without_interval_show_one_image_and_stay_idle() {
    let mut store = MemoryStore::new();
    store
        .save(
            SETTINGS_NAMESPACE,
            SETTINGS_KEY,
            &json!({ "image_urls_string": "http://a\nhttp://b", "interval": 0 }),
        )
        .unwrap();
    let document = HeadlessDocument::new(VIEWPORT);
    let clock = ManualClock::new();

    let mut controller = start(store.clone(), document.clone(), &clock, 7);

    assert_eq!(controller.state(), RotationState::Idle);
    let snapshot = document.snapshot();
    assert_eq!(snapshot.style_writes, 1);
    assert!(
        snapshot.style_text.contains("url(\"http://a\")")
            || snapshot.style_text.contains("url(\"http://b\")")
    );

    clock.advance(Duration::from_secs(3600));
    assert!(!controller.poll());
    assert_eq!(document.snapshot().style_writes, 1);
}

#[test]
fn enabling_an_interval_rotates_on_schedule() {
    let mut store = MemoryStore::new();
    store
        .save(
            SETTINGS_NAMESPACE,
            SETTINGS_KEY,
            &json!({ "image_urls_string": "http://a\nhttp://b" }),
        )
        .unwrap();
    let document = HeadlessDocument::new(VIEWPORT);
    let clock = ManualClock::new();
    let mut controller = start(store.clone(), document.clone(), &clock, 3);

    let mut prefs: Preferences = controller.settings().preferences();
    prefs.interval = 5.0;
    controller.on_config_change(prefs);
    assert_eq!(controller.state(), RotationState::Rotating);

    let first = controller.settings().last_image_url.clone();
    clock.advance(Duration::from_secs(4));
    assert!(!controller.poll());

    clock.advance(Duration::from_secs(1));
    assert!(controller.poll());
    let second = controller.settings().last_image_url.clone();
    assert_ne!(first, second);
    assert_eq!(BackgroundSettings::load(&store).last_image_url, second);

    clock.advance(Duration::from_secs(5));
    assert!(controller.poll());
    assert_eq!(controller.settings().last_image_url, first);
}

#[test]
fn restart_resumes_the_persisted_bag() {
    let dir = tempfile::tempdir().unwrap();
    let urls = "http://a\nhttp://b\nhttp://c\nhttp://d";
    {
        let mut store = JsonFileStore::new(dir.path());
        store
            .save(
                SETTINGS_NAMESPACE,
                SETTINGS_KEY,
                &json!({ "image_urls_string": urls }),
            )
            .unwrap();
    }

    let clock = ManualClock::new();
    let controller = start(
        JsonFileStore::new(dir.path()),
        HeadlessDocument::new(VIEWPORT),
        &clock,
        11,
    );
    let shown = controller.settings().last_image_url.clone();
    let queued: Vec<String> = controller
        .queued_urls()
        .iter()
        .map(|url| url.to_string())
        .collect();
    controller.stop();

    let persisted = BackgroundSettings::load(&JsonFileStore::new(dir.path()));
    assert_eq!(persisted.last_image_url, shown);
    // Two draws so far: the shown image and the one queued behind it.
    assert_eq!(persisted.image_urls_pool.len(), 2);
    assert!(!persisted.image_urls_pool.contains(&shown));
    assert!(!persisted.image_urls_pool.contains(&queued[0]));

    let document = HeadlessDocument::new(VIEWPORT);
    let resumed = start(JsonFileStore::new(dir.path()), document.clone(), &clock, 12);
    let resumed_shown = resumed.settings().last_image_url.clone();
    assert!(persisted.image_urls_pool.contains(&resumed_shown));
    assert!(document
        .snapshot()
        .style_text
        .contains(&format!("url(\"{resumed_shown}\")")));
}

#[test]
fn stop_removes_both_surfaces() {
    let mut store = MemoryStore::new();
    store
        .save(
            SETTINGS_NAMESPACE,
            SETTINGS_KEY,
            &json!({ "image_urls_string": "http://a\nhttp://b", "interval": 10 }),
        )
        .unwrap();
    let document = HeadlessDocument::new(VIEWPORT);
    let controller = start(store, document.clone(), &ManualClock::new(), 5);
    assert!(document.snapshot().style_attached);

    controller.stop();
    let snapshot = document.snapshot();
    assert!(!snapshot.style_attached);
    assert!(!snapshot.preload_attached);
}

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn host_bridge_receives_proxied_background() {
    let captured = Captured::default();
    let bridge = HostBridge::new(Box::new(captured.clone()), Viewport {
        width: 1280,
        height: 720,
    });
    let mut store = MemoryStore::new();
    store
        .save(
            SETTINGS_NAMESPACE,
            SETTINGS_KEY,
            &json!({ "image_urls_string": "http://img/one.png", "use_image_proxy": true }),
        )
        .unwrap();

    let proxy = ImageProxy::new("https://resize.example.com", "tok", 80);
    let controller = RotationController::start(
        Collaborators::new(Box::new(store), Box::new(bridge))
            .with_clock(Box::new(ManualClock::new()))
            .with_rng(StdRng::seed_from_u64(1))
            .with_proxy(Some(proxy)),
    );
    controller.stop();

    let output = String::from_utf8(captured.0.borrow().clone()).unwrap();
    let requests: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let css = requests
        .iter()
        .find(|r| r["cmd"] == "style.replace")
        .and_then(|r| r["args"]["css"].as_str())
        .unwrap()
        .to_string();
    assert!(css.contains("https://resize.example.com/tok?url="));
    assert!(css.contains("size=1280x720"));
    assert!(css.contains("quality=80"));
    assert_eq!(requests.last().unwrap()["cmd"], "preload.remove");
}

#[test]
fn viewport_change_reissues_proxied_urls() {
    let captured = Captured::default();
    let bridge = HostBridge::new(Box::new(captured.clone()), Viewport {
        width: 1280,
        height: 720,
    });
    let mut store = MemoryStore::new();
    store
        .save(
            SETTINGS_NAMESPACE,
            SETTINGS_KEY,
            &json!({ "image_urls_string": "http://a\nhttp://b", "use_image_proxy": true }),
        )
        .unwrap();

    let mut controller = RotationController::start(
        Collaborators::new(Box::new(store), Box::new(bridge.clone()))
            .with_clock(Box::new(ManualClock::new()))
            .with_rng(StdRng::seed_from_u64(2))
            .with_proxy(Some(ImageProxy::new("https://resize.example.com", "tok", 80))),
    );
    let anchor = controller.settings().last_image_url.clone();

    bridge.set_viewport(Viewport {
        width: 800,
        height: 600,
    });
    controller.viewport_changed();

    assert_eq!(controller.settings().last_image_url, anchor);
    assert!(controller.shown_url().contains("size=800x600"));
    assert!(controller.queued_urls()[0].contains("size=800x600"));
    let output = String::from_utf8(captured.0.borrow().clone()).unwrap();
    let last_source = output
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|r| r["cmd"] == "preload.source")
        .last()
        .unwrap();
    assert!(last_source["args"]["src"]
        .as_str()
        .unwrap()
        .contains("size=800x600"));
}
