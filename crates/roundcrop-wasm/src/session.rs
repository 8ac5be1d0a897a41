//! Crop session bindings.
//!
//! The host owns the file picker, the pointer listeners and the upload; this
//! type owns everything in between.
//!
//! ```typescript
//! const session = new JsCropSession({ viewport_size: 280 });
//! session.load_file(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//!
//! el.onpointerdown = (e) => {
//!   if (session.pointer_down(e.pointerId, e.clientX, e.clientY) === 'capture') {
//!     el.setPointerCapture(e.pointerId);
//!   }
//!   render(session.geometry());
//! };
//!
//! const bytes = session.commit();
//! try {
//!   await upload(new Blob([bytes], { type: session.output_media_type() }));
//!   session.export_succeeded();
//! } catch (err) {
//!   try {
//!     session.export_failed(String(err));
//!   } catch (e) {
//!     // e.name === 'SinkFailed'; session.state() is 'editing' again
//!   }
//! }
//! ```

use roundcrop_core::{CropConfig, CropSession, InteractionEvent, SelectedFile, SinkError};
use wasm_bindgen::prelude::*;

use crate::types::{
    config_error_to_js, config_from_js, console_warn, crop_error_to_js, effect_name, state_name,
    GeometryView,
};

/// A circular crop session for JavaScript.
#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a closed session.
    ///
    /// # Arguments
    /// * `config` - Optional partial config object; missing fields use defaults
    ///
    /// # Errors
    /// Throws an `InvalidConfig` error if the object cannot be read or fails
    /// validation.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCropSession, JsValue> {
        let config = config_from_js(config)?;
        Self::with_config(config).map_err(config_error_to_js)
    }

    /// Current lifecycle state: `"closed"`, `"editing"` or `"committing"`.
    pub fn state(&self) -> String {
        state_name(self.inner.state()).to_string()
    }

    /// Media type of the payload `commit()` returns.
    pub fn output_media_type(&self) -> String {
        self.inner.config().output_format.media_type().to_string()
    }

    /// Validate, decode and open a file.
    ///
    /// # Errors
    /// Throws with `name` set to `InvalidType`, `TooLarge`, `DecodeFailed`
    /// or `Busy`. Only `DecodeFailed` changes the session (it closes).
    pub fn load_file(&mut self, name: String, media_type: String, bytes: Vec<u8>) -> Result<(), JsValue> {
        self.inner
            .load(SelectedFile::new(name, media_type, bytes))
            .map_err(crop_error_to_js)
    }

    /// Returns `"capture"` when the host should capture the pointer.
    pub fn pointer_down(&mut self, id: i32, x: f64, y: f64) -> String {
        self.dispatch(InteractionEvent::PointerDown { id, x, y })
    }

    pub fn pointer_move(&mut self, id: i32, x: f64, y: f64) -> String {
        self.dispatch(InteractionEvent::PointerMove { id, x, y })
    }

    /// Returns `"release"` when the host should release the pointer.
    pub fn pointer_up(&mut self, id: i32) -> String {
        self.dispatch(InteractionEvent::PointerUp { id })
    }

    pub fn pointer_cancel(&mut self, id: i32) -> String {
        self.dispatch(InteractionEvent::PointerCancel { id })
    }

    /// Wheel zoom. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f64) {
        self.dispatch(InteractionEvent::Wheel { delta_y });
    }

    /// Set the zoom from a slider (clamped to the configured bounds).
    pub fn set_zoom(&mut self, zoom: f64) {
        self.inner.set_zoom(zoom);
    }

    /// Preview geometry as a plain object, or `null` when nothing is loaded.
    pub fn geometry(&self) -> Result<JsValue, JsValue> {
        match self.geometry_view() {
            Some(view) => serde_wasm_bindgen::to_value(&view)
                .map_err(|e| JsValue::from_str(&format!("Failed to serialize geometry: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    /// Render the crop and enter the committing state.
    ///
    /// Report the upload outcome with `export_succeeded()` or
    /// `export_failed()`.
    pub fn commit(&mut self) -> Result<Vec<u8>, JsValue> {
        self.inner
            .begin_commit()
            .map(|payload| payload.bytes)
            .map_err(crop_error_to_js)
    }

    /// The upload finished; the session closes.
    pub fn export_succeeded(&mut self) -> Result<(), JsValue> {
        self.inner.finish_commit(Ok(())).map_err(crop_error_to_js)
    }

    /// The upload failed; the session returns to editing so the user can
    /// retry.
    ///
    /// # Errors
    /// Always throws: `SinkFailed` carrying `message` once the session is
    /// back in editing, or `NotReady` if no commit was in flight.
    pub fn export_failed(&mut self, message: String) -> Result<(), JsValue> {
        console_warn(&format!("Crop export failed: {}", message));
        self.inner
            .finish_commit(Err(SinkError::new(message)))
            .map_err(crop_error_to_js)
    }

    /// Close the session without exporting.
    ///
    /// Throws `Busy` while committing.
    pub fn cancel(&mut self) -> Result<(), JsValue> {
        self.inner.cancel().map_err(crop_error_to_js)
    }
}

impl JsCropSession {
    pub fn with_config(config: CropConfig) -> Result<Self, roundcrop_core::ConfigError> {
        Ok(Self {
            inner: CropSession::new(config)?,
        })
    }

    pub fn inner(&self) -> &CropSession {
        &self.inner
    }

    fn dispatch(&mut self, event: InteractionEvent) -> String {
        effect_name(self.inner.handle_event(event)).to_string()
    }

    pub(crate) fn geometry_view(&self) -> Option<GeometryView> {
        let geometry = self.inner.geometry()?;
        let transform = self.inner.transform()?;
        let rect = self.inner.visible_rect()?;
        Some(GeometryView::from_parts(&geometry, &transform, rect))
    }
}
