//! JavaScript-facing views of core types.
//!
//! These are plain serde structs and string mappings so they can be tested
//! on the host target; only the conversions to `JsValue` need wasm32.

use roundcrop_core::{
    ConfigError, CropConfig, CropError, DisplayGeometry, Effect, SessionState, SourceRect,
    TransformState,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Preview geometry as handed to JavaScript.
///
/// The host positions the image element with `originX`/`originY` and sizes
/// it with `displayWidth`/`displayHeight`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryView {
    pub base_scale: f64,
    pub scale: f64,
    pub display_width: f64,
    pub display_height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    /// Source rectangle currently visible through the viewport.
    pub source_rect: SourceRectView,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceRectView {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<SourceRect> for SourceRectView {
    fn from(rect: SourceRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl GeometryView {
    pub(crate) fn from_parts(
        geometry: &DisplayGeometry,
        transform: &TransformState,
        rect: SourceRect,
    ) -> Self {
        Self {
            base_scale: geometry.base_scale,
            scale: geometry.scale,
            display_width: geometry.display_width,
            display_height: geometry.display_height,
            origin_x: geometry.origin_x,
            origin_y: geometry.origin_y,
            zoom: transform.zoom,
            pan_x: transform.pan.x,
            pan_y: transform.pan.y,
            source_rect: rect.into(),
        }
    }
}

/// Map a session state to the string the host sees.
pub(crate) fn state_name(state: SessionState) -> &'static str {
    match state {
        SessionState::Closed => "closed",
        SessionState::Editing => "editing",
        SessionState::Committing => "committing",
    }
}

/// Map an interaction effect to the pointer-capture action the host performs.
///
/// - `"capture"` - call `setPointerCapture(id)`
/// - `"release"` - call `releasePointerCapture(id)`
/// - `"none"` - nothing to do
pub(crate) fn effect_name(effect: Effect) -> &'static str {
    match effect {
        Effect::None => "none",
        Effect::CapturePointer(_) => "capture",
        Effect::ReleasePointer(_) => "release",
    }
}

/// Build a JS `Error` whose `name` is the crop error kind.
pub(crate) fn crop_error_to_js(err: CropError) -> JsValue {
    named_error(err.kind(), &err.to_string())
}

pub(crate) fn config_error_to_js(err: ConfigError) -> JsValue {
    named_error("InvalidConfig", &err.to_string())
}

fn named_error(name: &str, message: &str) -> JsValue {
    let error = js_sys::Error::new(message);
    error.set_name(name);
    error.into()
}

/// Read an optional config object; `undefined`/`null` means defaults.
pub(crate) fn config_from_js(value: JsValue) -> Result<CropConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(CropConfig::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| named_error("InvalidConfig", &format!("Invalid crop config: {}", e)))
}

/// Warn in the browser console.
pub(crate) fn console_warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_error_name_is_kind() {
        let value = crop_error_to_js(CropError::NotReady);
        let error: js_sys::Error = value.dyn_into().unwrap();
        assert_eq!(String::from(error.name()), "NotReady");
    }

    #[wasm_bindgen_test]
    fn test_config_from_undefined_is_default() {
        let config = config_from_js(JsValue::UNDEFINED).unwrap();
        assert_eq!(config, CropConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_config_from_partial_object() {
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"viewport_size".into(), &JsValue::from_f64(320.0)).unwrap();
        let config = config_from_js(obj.into()).unwrap();
        assert_eq!(config.viewport_size, 320);
        assert_eq!(config.output_edge, CropConfig::default().output_edge);
    }

    #[wasm_bindgen_test]
    fn test_config_from_wrong_type_rejected() {
        assert!(config_from_js(JsValue::from_str("nope")).is_err());
    }
}
