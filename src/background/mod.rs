//! Background rotation engine: URL parsing, shuffle-bag selection and the
//! timer-driven apply/preload controller.

pub mod controller;
pub mod proxy;
pub mod settings;
pub mod shuffle_bag;
pub mod style;
pub mod surfaces;
pub mod timer;
pub mod url_pool;

pub use controller::{Collaborators, RotationController, RotationState};
pub use proxy::ImageProxy;
pub use settings::{BackgroundSettings, Preferences, TransitionType};
pub use surfaces::{Document, HeadlessDocument, PreloadSurface, StyleSurface, Viewport};
pub use timer::{Clock, ManualClock, SystemClock};
