//! Rotation controller: lookahead queue, apply/preload cycle and the
//! repeating timer, driven by live settings edits.

use std::collections::VecDeque;

use rand::{rngs::StdRng, SeedableRng};

use super::{
    proxy::ImageProxy,
    settings::{BackgroundSettings, Preferences},
    shuffle_bag::ShuffleBag,
    style::BackgroundStyle,
    surfaces::{Document, SurfaceHandles},
    timer::{Clock, RepeatingTimer, SystemClock},
    url_pool,
};
use crate::{debug, info, store::SettingsStore, DEBUG_NAME};

/// Number of selected-but-not-shown images kept ahead of the screen.
pub const LOOKAHEAD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle,
    Rotating,
}

/// Everything the controller needs from its host.
pub struct Collaborators {
    pub store: Box<dyn SettingsStore>,
    pub document: Box<dyn Document>,
    pub clock: Box<dyn Clock>,
    pub rng: StdRng,
    pub proxy: Option<ImageProxy>,
}

impl Collaborators {
    pub fn new(store: Box<dyn SettingsStore>, document: Box<dyn Document>) -> Self {
        Self {
            store,
            document,
            clock: Box::new(SystemClock),
            rng: StdRng::from_entropy(),
            proxy: None,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<ImageProxy>) -> Self {
        self.proxy = proxy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedImage {
    /// URL as drawn from the bag.
    source: String,
    /// URL handed to the document, after the optional proxy rewrite.
    display: String,
}

pub struct RotationController {
    settings: BackgroundSettings,
    bag: ShuffleBag,
    queue: VecDeque<QueuedImage>,
    shown: String,
    timer: Option<RepeatingTimer>,
    surfaces: SurfaceHandles,
    store: Box<dyn SettingsStore>,
    document: Box<dyn Document>,
    clock: Box<dyn Clock>,
    proxy: Option<ImageProxy>,
}

impl RotationController {
    /// Loads the persisted settings, acquires the surfaces, shows the first
    /// image and arms the timer when an interval is configured.
    pub fn start(collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            mut document,
            clock,
            rng,
            proxy,
        } = collaborators;

        let settings = BackgroundSettings::load(store.as_ref());
        let mut bag = ShuffleBag::new(rng);
        bag.restore(
            url_pool::parse(&settings.image_urls_string),
            &settings.image_urls_pool,
        );
        let surfaces = SurfaceHandles::acquire(document.as_mut());

        info!(
            "[{}] Starting with {} image URL(s), {} left in the bag",
            DEBUG_NAME,
            bag.urls().len(),
            bag.pool().len()
        );

        let mut controller = Self {
            settings,
            bag,
            queue: VecDeque::with_capacity(LOOKAHEAD),
            shown: String::new(),
            timer: None,
            surfaces,
            store,
            document,
            clock,
            proxy,
        };

        controller.rotate();
        controller.setup_interval();
        controller
    }

    /// Disarms the timer, releases both surfaces and persists the state.
    pub fn stop(mut self) {
        self.clear_interval();
        self.surfaces.release();
        self.save_settings();
        info!("[{}] Stopped", DEBUG_NAME);
    }

    /// Applies a user edit, reacting only to what actually changed.
    pub fn on_config_change(&mut self, preferences: Preferences) {
        let new = preferences.sanitized();
        let old = self.settings.preferences();
        if new == old {
            return;
        }

        self.settings.image_urls_string = new.image_urls_string.clone();
        self.settings.alpha = new.alpha;
        self.settings.fading_seconds = new.fading_seconds;
        self.settings.transition_type = new.transition_type;
        self.settings.interval = new.interval;
        self.settings.use_image_proxy = new.use_image_proxy;
        self.save_settings();

        if new.image_urls_string != old.image_urls_string {
            self.bag.set_urls(url_pool::parse(&new.image_urls_string));
            self.queue.clear();
            info!(
                "[{}][CONFIG] Image list changed, {} URL(s)",
                DEBUG_NAME,
                self.bag.urls().len()
            );
            self.rotate();
            self.setup_interval();
            return;
        }

        if new.use_image_proxy != old.use_image_proxy {
            self.refresh_display();
        } else if new.alpha != old.alpha
            || new.fading_seconds != old.fading_seconds
            || new.transition_type != old.transition_type
        {
            self.apply_background(false);
        }

        if new.interval != old.interval {
            self.setup_interval();
        }
    }

    /// Swaps the resize service endpoint, e.g. after the host config changed.
    pub fn set_proxy(&mut self, proxy: Option<ImageProxy>) {
        if self.proxy == proxy {
            return;
        }
        self.proxy = proxy;
        if self.settings.use_image_proxy {
            self.refresh_display();
        }
    }

    /// Re-derives proxied URLs after the document's viewport changed.
    pub fn viewport_changed(&mut self) {
        if self.settings.use_image_proxy && self.proxy.is_some() {
            self.refresh_display();
        }
    }

    /// Manual trigger: show the next image now without touching the timer.
    pub fn next_background(&mut self) {
        self.rotate();
    }

    /// Host-loop entry point. Rotates once when the timer is due and
    /// reports whether a new image went up. A tick over an empty list
    /// consumes the deadline and returns false.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();
        let due = self
            .timer
            .as_mut()
            .is_some_and(|timer| timer.fire_if_due(now));
        if !due {
            return false;
        }
        debug!("[{}][TIMER] Tick", DEBUG_NAME);
        if self.bag.is_empty() {
            return false;
        }
        self.rotate();
        true
    }

    /// Tops the lookahead queue up to two entries.
    pub fn refill_queue(&mut self) {
        let mut drew = false;
        while self.queue.len() < LOOKAHEAD {
            // Compare against whatever will be on screen right before this one.
            let previous = self
                .queue
                .back()
                .map(|queued| queued.source.as_str())
                .unwrap_or(self.settings.last_image_url.as_str());
            let Some(source) = self.bag.next(false, previous) else {
                break;
            };
            let display = self.display_url(&source);
            self.queue.push_back(QueuedImage { source, display });
            drew = true;
        }
        if drew {
            self.save_settings();
        }
    }

    /// With `change_image` the queue head becomes the background, otherwise
    /// the current image is re-rendered with the current opacity and fade.
    pub fn apply_background(&mut self, change_image: bool) {
        if change_image {
            let Some(next) = self.queue.pop_front() else {
                return;
            };
            info!(
                "[{}][ROTATE] Setting background image to {}",
                DEBUG_NAME,
                next.display
            );
            self.settings.last_image_url = next.source;
            self.shown = next.display;
            self.save_settings();
        } else {
            if self.shown.is_empty() && !self.settings.last_image_url.is_empty() {
                self.shown = self.display_url(&self.settings.last_image_url);
            }
            info!(
                "[{}][ROTATE] Setting background opacity to {}",
                DEBUG_NAME,
                self.settings.alpha
            );
        }

        let css = BackgroundStyle {
            alpha: self.settings.alpha,
            fading_seconds: self.settings.fading_seconds,
            transition: self.settings.transition_type,
            image_url: &self.shown,
        }
        .render();
        self.surfaces.write_style(&css);
    }

    /// Refill, show the next image, warm the one after it.
    pub fn rotate(&mut self) {
        if self.bag.is_empty() {
            return;
        }
        self.refill_queue();
        self.apply_background(true);
        self.preload();
    }

    pub fn preload(&mut self) {
        if let Some(head) = self.queue.front() {
            self.surfaces.preload(&head.display);
        }
    }

    pub fn state(&self) -> RotationState {
        if self.timer.is_some() {
            RotationState::Rotating
        } else {
            RotationState::Idle
        }
    }

    pub fn settings(&self) -> &BackgroundSettings {
        &self.settings
    }

    pub fn image_urls(&self) -> &[String] {
        self.bag.urls()
    }

    /// Display URLs waiting in the lookahead queue, next first.
    pub fn queued_urls(&self) -> Vec<&str> {
        self.queue.iter().map(|q| q.display.as_str()).collect()
    }

    /// Display URL currently rendered, empty before the first apply.
    pub fn shown_url(&self) -> &str {
        &self.shown
    }

    pub fn timer(&self) -> Option<&RepeatingTimer> {
        self.timer.as_ref()
    }

    fn setup_interval(&mut self) {
        self.clear_interval();
        self.timer = RepeatingTimer::arm(self.settings.interval, self.clock.now());
        if let Some(timer) = &self.timer {
            info!(
                "[{}][TIMER] Rotating every {:?}",
                DEBUG_NAME,
                timer.period()
            );
        }
    }

    fn clear_interval(&mut self) {
        if self.timer.take().is_some() {
            debug!("[{}][TIMER] Interval cleared", DEBUG_NAME);
        }
    }

    fn display_url(&self, source: &str) -> String {
        match (&self.proxy, self.settings.use_image_proxy) {
            (Some(proxy), true) => {
                let viewport = self.document.viewport();
                proxy.rewrite(source, viewport.width, viewport.height)
            }
            _ => source.to_string(),
        }
    }

    fn refresh_display(&mut self) {
        self.rewrite_display_urls();
        self.apply_background(false);
        self.preload();
    }

    fn rewrite_display_urls(&mut self) {
        let displays: Vec<String> = self
            .queue
            .iter()
            .map(|queued| self.display_url(&queued.source))
            .collect();
        for (queued, display) in self.queue.iter_mut().zip(displays) {
            queued.display = display;
        }
        self.shown = if self.settings.last_image_url.is_empty() {
            String::new()
        } else {
            self.display_url(&self.settings.last_image_url)
        };
    }

    fn save_settings(&mut self) {
        self.settings.image_urls_pool = self.bag.pool().to_vec();
        self.settings.save(self.store.as_mut());
    }
}
