//! Document surfaces the controller draws on.
//!
//! The host owns the real document; the controller only ever holds one style
//! block and one hidden preload image, acquired at start and released at stop.

use std::{cell::RefCell, rc::Rc};

pub const STYLE_ID: &str = "random_background_css";
pub const PRELOAD_ID: &str = "preload_image";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A style block whose text is rewritten wholesale on every apply.
pub trait StyleSurface {
    fn replace(&mut self, css: &str);
    fn remove(&mut self);
}

/// A hidden 1x1 image used to warm the next background.
pub trait PreloadSurface {
    fn set_source(&mut self, url: &str);
    fn remove(&mut self);
}

pub trait Document {
    /// Returns the block with `id`, creating it when the document has none.
    fn attach_style(&mut self, id: &str) -> Box<dyn StyleSurface>;
    /// Returns the hidden image with `id`, creating it when missing.
    fn attach_preload(&mut self, id: &str) -> Box<dyn PreloadSurface>;
    fn viewport(&self) -> Viewport;
}

/// Both surfaces owned by one running controller. Dropping the handles
/// removes whatever is still attached.
pub struct SurfaceHandles {
    style: Option<Box<dyn StyleSurface>>,
    preload: Option<Box<dyn PreloadSurface>>,
}

impl SurfaceHandles {
    pub fn acquire(document: &mut dyn Document) -> Self {
        Self {
            style: Some(document.attach_style(STYLE_ID)),
            preload: Some(document.attach_preload(PRELOAD_ID)),
        }
    }

    pub fn write_style(&mut self, css: &str) {
        if let Some(style) = self.style.as_mut() {
            style.replace(css);
        }
    }

    pub fn preload(&mut self, url: &str) {
        if let Some(preload) = self.preload.as_mut() {
            preload.set_source(url);
        }
    }

    pub fn release(&mut self) {
        if let Some(mut style) = self.style.take() {
            style.remove();
        }
        if let Some(mut preload) = self.preload.take() {
            preload.remove();
        }
    }
}

impl Drop for SurfaceHandles {
    fn drop(&mut self) {
        self.release();
    }
}

/* =========================
   HEADLESS DOCUMENT
   ========================= */

/// Latest state of a [`HeadlessDocument`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessState {
    pub style_attached: bool,
    pub preload_attached: bool,
    pub style_text: String,
    pub style_writes: usize,
    pub preload_source: String,
    pub preload_history: Vec<String>,
}

/// In-memory document. Clones share state, so a caller can keep one clone
/// to inspect what a controller rendered.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDocument {
    state: Rc<RefCell<HeadlessState>>,
    viewport: Viewport,
}

impl HeadlessDocument {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Rc::default(),
            viewport,
        }
    }

    pub fn snapshot(&self) -> HeadlessState {
        self.state.borrow().clone()
    }
}

impl Document for HeadlessDocument {
    fn attach_style(&mut self, _id: &str) -> Box<dyn StyleSurface> {
        self.state.borrow_mut().style_attached = true;
        Box::new(HeadlessStyle(self.state.clone()))
    }

    fn attach_preload(&mut self, _id: &str) -> Box<dyn PreloadSurface> {
        self.state.borrow_mut().preload_attached = true;
        Box::new(HeadlessPreload(self.state.clone()))
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

struct HeadlessStyle(Rc<RefCell<HeadlessState>>);

impl StyleSurface for HeadlessStyle {
    fn replace(&mut self, css: &str) {
        let mut state = self.0.borrow_mut();
        state.style_text = css.to_string();
        state.style_writes += 1;
    }

    fn remove(&mut self) {
        let mut state = self.0.borrow_mut();
        state.style_attached = false;
        state.style_text.clear();
    }
}

struct HeadlessPreload(Rc<RefCell<HeadlessState>>);

impl PreloadSurface for HeadlessPreload {
    fn set_source(&mut self, url: &str) {
        let mut state = self.0.borrow_mut();
        state.preload_source = url.to_string();
        state.preload_history.push(url.to_string());
    }

    fn remove(&mut self) {
        let mut state = self.0.borrow_mut();
        state.preload_attached = false;
        state.preload_source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_write_and_release_surfaces() {
        let mut document = HeadlessDocument::new(Viewport { width: 10, height: 10 });
        let observer = document.clone();

        let mut handles = SurfaceHandles::acquire(&mut document);
        handles.write_style("a {}");
        handles.preload("http://next");

        let state = observer.snapshot();
        assert!(state.style_attached && state.preload_attached);
        assert_eq!(state.style_text, "a {}");
        assert_eq!(state.preload_source, "http://next");

        handles.release();
        handles.release();
        handles.write_style("ignored");

        let state = observer.snapshot();
        assert!(!state.style_attached && !state.preload_attached);
        assert_eq!(state.style_writes, 1);
    }

    #[test]
    fn dropping_handles_removes_surfaces() {
        let mut document = HeadlessDocument::default();
        let observer = document.clone();
        drop(SurfaceHandles::acquire(&mut document));
        assert!(!observer.snapshot().style_attached);
        assert!(!observer.snapshot().preload_attached);
    }
}
