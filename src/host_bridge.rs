// ~/RandomBackground/src/host_bridge.rs
//
// Line-delimited JSON link to the embedding host. Every document operation is
// one `{"ns", "cmd", "args"}` request on stdout; the host answers nothing and
// sends its own commands as lines on stdin.

use std::{
    cell::{Cell, RefCell},
    io::{self, Write},
    rc::Rc,
};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    background::surfaces::{Document, PreloadSurface, StyleSurface, Viewport},
    debug, warn, DEBUG_NAME,
};

const DOM_NS: &str = "dom";

/// Cloneable handle on the outgoing stream and the host-reported viewport.
#[derive(Clone)]
pub struct HostBridge {
    out: Rc<RefCell<Box<dyn Write>>>,
    viewport: Rc<Cell<Viewport>>,
}

impl HostBridge {
    pub fn new(out: Box<dyn Write>, viewport: Viewport) -> Self {
        Self {
            out: Rc::new(RefCell::new(out)),
            viewport: Rc::new(Cell::new(viewport)),
        }
    }

    pub fn stdout(viewport: Viewport) -> Self {
        Self::new(Box::new(io::stdout()), viewport)
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.viewport.set(viewport);
    }

    /// Fire-and-forget request. Write failures are logged and dropped; the
    /// next apply rewrites the full state anyway.
    pub fn request(&self, ns: &str, cmd: &str, args: Option<Value>) {
        debug!("[{}][HOST] Sending request: ns={}, cmd={}", DEBUG_NAME, ns, cmd);

        let req = json!({
            "ns": ns,
            "cmd": cmd,
            "args": args
        });

        let line = match serde_json::to_string(&req) {
            Ok(line) => line,
            Err(e) => {
                warn!("[{}][HOST] Failed to serialize request JSON: {:?}", DEBUG_NAME, e);
                return;
            }
        };

        let mut out = self.out.borrow_mut();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!("[{}][HOST] Failed to write request: {e}", DEBUG_NAME);
        }
    }
}

impl Document for HostBridge {
    fn attach_style(&mut self, id: &str) -> Box<dyn StyleSurface> {
        self.request(DOM_NS, "style.attach", Some(json!({ "id": id })));
        Box::new(BridgeStyle {
            bridge: self.clone(),
            id: id.to_string(),
        })
    }

    fn attach_preload(&mut self, id: &str) -> Box<dyn PreloadSurface> {
        self.request(
            DOM_NS,
            "preload.attach",
            Some(json!({ "id": id, "width": 1, "height": 1, "hidden": true })),
        );
        Box::new(BridgePreload {
            bridge: self.clone(),
            id: id.to_string(),
        })
    }

    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }
}

struct BridgeStyle {
    bridge: HostBridge,
    id: String,
}

impl StyleSurface for BridgeStyle {
    fn replace(&mut self, css: &str) {
        self.bridge.request(
            DOM_NS,
            "style.replace",
            Some(json!({ "id": self.id, "css": css })),
        );
    }

    fn remove(&mut self) {
        self.bridge
            .request(DOM_NS, "style.remove", Some(json!({ "id": self.id })));
    }
}

struct BridgePreload {
    bridge: HostBridge,
    id: String,
}

impl PreloadSurface for BridgePreload {
    fn set_source(&mut self, url: &str) {
        self.bridge.request(
            DOM_NS,
            "preload.source",
            Some(json!({ "id": self.id, "src": url })),
        );
    }

    fn remove(&mut self) {
        self.bridge
            .request(DOM_NS, "preload.remove", Some(json!({ "id": self.id })));
    }
}

/* =========================
   INCOMING COMMANDS
   ========================= */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Rotate to the next image now.
    Next,
    /// Re-read config.yaml without waiting for the watcher.
    Reload,
    Viewport(Viewport),
    Stop,
}

#[derive(Deserialize)]
struct RawCommand {
    cmd: String,
    #[serde(default)]
    args: Value,
}

impl HostCommand {
    /// Accepts bare words (`next`) or `{"cmd": "...", "args": {...}}`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.starts_with('{') {
            let raw: RawCommand = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("[{}][HOST] Unreadable command {line}: {e}", DEBUG_NAME);
                    return None;
                }
            };
            return Self::from_parts(&raw.cmd, &raw.args);
        }

        Self::from_parts(line, &Value::Null)
    }

    fn from_parts(cmd: &str, args: &Value) -> Option<Self> {
        match cmd.trim().to_lowercase().as_str() {
            "next" | "rotate" => Some(Self::Next),
            "reload" => Some(Self::Reload),
            "stop" | "quit" | "exit" => Some(Self::Stop),
            "viewport" => {
                let width = args.get("width")?.as_u64()?;
                let height = args.get("height")?.as_u64()?;
                Some(Self::Viewport(Viewport {
                    width: u32::try_from(width).ok()?,
                    height: u32::try_from(height).ok()?,
                }))
            }
            other => {
                warn!("[{}][HOST] Unknown command '{other}'", DEBUG_NAME);
                None
            }
        }
    }
}
