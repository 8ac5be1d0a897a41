//! Roundcrop WASM - WebAssembly bindings for the circular crop session
//!
//! This crate exposes `roundcrop-core`'s crop session to JavaScript. The
//! host keeps the DOM (file input, pointer listeners, upload) and forwards
//! events; the session computes geometry and renders the final bitmap.
//!
//! # Module Structure
//!
//! - `session` - `JsCropSession`, the stateful crop session
//! - `types` - JS-facing geometry view and error conversion
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropSession } from '@roundcrop/wasm';
//!
//! await init();
//! const session = new JsCropSession();
//! session.load_file(file.name, file.type, bytes);
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

pub use session::JsCropSession;
pub use types::{GeometryView, SourceRectView};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
