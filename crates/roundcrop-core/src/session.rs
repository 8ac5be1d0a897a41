//! Crop session lifecycle.
//!
//! ```text
//!            load ok                 begin_commit
//!   Closed ──────────▶ Editing ───────────────────▶ Committing
//!     ▲  ▲               │  ▲                         │   │
//!     │  └── cancel ─────┘  └──── sink failed ────────┘   │
//!     └──────────────────── sink ok ──────────────────────┘
//! ```
//!
//! Decoding and exporting are the two steps that may suspend. Decoding is
//! handed out as a [`DecodeTicket`]: the host runs it wherever it likes and
//! reports back with [`CropSession::complete_load`]. Only the most recent
//! selection's result is applied. Exporting goes through an [`ExportSink`],
//! either driven by [`CropSession::commit_to`] or split into
//! [`CropSession::begin_commit`] / [`CropSession::finish_commit`] when the
//! upload lives outside Rust.
//!
//! While committing, pointer input, new selections and cancel are refused.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, CropConfig};
use crate::encode::Payload;
use crate::error::CropError;
use crate::geometry::{self, DisplayGeometry, SourceRect, TransformState};
use crate::interaction::{Controller, Effect, InteractionEvent, PointerState};
use crate::raster;
use crate::source::{validate_selection, DecodeTicket, ImageSource, SelectedFile};

/// Failure reported by an export sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SinkError(pub String);

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receiver of the finished payload (typically an upload).
pub trait ExportSink {
    /// Deliver the payload. Resolving to `Err` keeps the session editable.
    fn export(&mut self, payload: &Payload) -> impl Future<Output = Result<(), SinkError>>;
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No image loaded.
    Closed,
    /// Image loaded; the user is positioning it.
    Editing,
    /// Payload handed to the sink; waiting for the outcome.
    Committing,
}

/// Everything that lives while an image is loaded.
#[derive(Debug)]
struct Workspace {
    source: ImageSource,
    transform: TransformState,
    controller: Controller,
}

#[derive(Debug)]
enum Phase {
    Closed,
    Editing(Workspace),
    Committing(Workspace),
}

/// One crop session: a loaded image, its transform and the commit flow.
#[derive(Debug)]
pub struct CropSession {
    config: CropConfig,
    phase: Phase,
    /// Last generation handed out by `select_file`.
    generation: u64,
    /// Generation whose decode result is still awaited.
    pending: Option<u64>,
}

impl CropSession {
    /// Create a closed session.
    pub fn new(config: CropConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::Closed,
            generation: 0,
            pending: None,
        })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Closed => SessionState::Closed,
            Phase::Editing(_) => SessionState::Editing,
            Phase::Committing(_) => SessionState::Committing,
        }
    }

    /// True while a decode result is awaited.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn workspace(&self) -> Option<&Workspace> {
        match &self.phase {
            Phase::Editing(ws) | Phase::Committing(ws) => Some(ws),
            Phase::Closed => None,
        }
    }

    /// The loaded image, if any.
    pub fn source(&self) -> Option<&ImageSource> {
        self.workspace().map(|ws| &ws.source)
    }

    /// Current zoom and pan, if an image is loaded.
    pub fn transform(&self) -> Option<TransformState> {
        self.workspace().map(|ws| ws.transform)
    }

    pub fn pointer_state(&self) -> PointerState {
        self.workspace()
            .map(|ws| ws.controller.state())
            .unwrap_or_default()
    }

    /// Preview geometry, recomputed from the current transform.
    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.workspace().map(|ws| {
            geometry::forward(ws.source.natural_size(), self.config.viewport(), &ws.transform)
        })
    }

    /// Source rectangle visible through the viewport.
    pub fn visible_rect(&self) -> Option<SourceRect> {
        self.geometry()
            .map(|g| geometry::inverse(&g, self.config.viewport()))
    }

    /// Validate a selection and hand out a ticket for decoding it.
    ///
    /// Nothing about the current session changes until the ticket's result
    /// is passed to [`complete_load`](Self::complete_load).
    pub fn select_file(&mut self, file: SelectedFile) -> Result<DecodeTicket, CropError> {
        if matches!(self.phase, Phase::Committing(_)) {
            warn!(file = %file.name, "Ignoring file selection while committing");
            return Err(CropError::Busy);
        }

        if let Err(e) = validate_selection(&file, &self.config) {
            warn!(file = %file.name, media_type = %file.media_type, size = file.len(), error = %e, "Rejected file selection");
            return Err(e);
        }

        self.generation += 1;
        self.pending = Some(self.generation);
        info!(
            file = %file.name,
            media_type = %file.media_type,
            size = file.len(),
            generation = self.generation,
            "File accepted, decoding"
        );

        Ok(DecodeTicket::new(self.generation, file))
    }

    /// Apply the outcome of a decode.
    ///
    /// Results for any generation other than the pending one are dropped.
    /// Success replaces the current image and resets the transform; failure
    /// closes the session and returns the error.
    pub fn complete_load(
        &mut self,
        generation: u64,
        result: Result<ImageSource, CropError>,
    ) -> Result<(), CropError> {
        if self.pending != Some(generation) {
            debug!(generation, pending = ?self.pending, "Discarding stale decode result");
            return Ok(());
        }
        self.pending = None;

        match result {
            Ok(source) => {
                let (width, height) = source.natural_size();
                self.phase = Phase::Editing(Workspace {
                    source,
                    transform: TransformState::default(),
                    controller: Controller::new(self.config.zoom_bounds()),
                });
                info!(width, height, generation, "Image loaded");
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Closed;
                warn!(generation, error = %e, "Image decode failed");
                Err(e)
            }
        }
    }

    /// Select and decode a file in one step.
    pub fn load(&mut self, file: SelectedFile) -> Result<(), CropError> {
        let ticket = self.select_file(file)?;
        let result = ticket.decode();
        self.complete_load(ticket.generation(), result)
    }

    /// Feed a pointer or wheel event. Ignored unless editing.
    pub fn handle_event(&mut self, event: InteractionEvent) -> Effect {
        match &mut self.phase {
            Phase::Editing(ws) => ws.controller.handle(&mut ws.transform, event),
            _ => Effect::None,
        }
    }

    /// Set the zoom directly (clamped). Ignored unless editing.
    pub fn set_zoom(&mut self, zoom: f64) {
        if let Phase::Editing(ws) = &mut self.phase {
            let bounds = *ws.controller.bounds();
            bounds.set_zoom(&mut ws.transform, zoom);
        }
    }

    /// Render the current crop and enter `Committing`.
    ///
    /// # Errors
    ///
    /// - `NotReady` if no image is loaded.
    /// - `Busy` if a commit is already in flight.
    /// - `Encode` if the bitmap could not be encoded; the session stays
    ///   in `Editing`.
    pub fn begin_commit(&mut self) -> Result<Payload, CropError> {
        let ws = match &self.phase {
            Phase::Editing(ws) => ws,
            Phase::Committing(_) => return Err(CropError::Busy),
            Phase::Closed => return Err(CropError::NotReady),
        };

        let payload = raster::rasterize(
            &ws.source,
            self.config.viewport(),
            &ws.transform,
            &self.config.output_spec(),
        )?;

        if let Phase::Editing(mut ws) = std::mem::replace(&mut self.phase, Phase::Closed) {
            ws.controller.reset();
            self.phase = Phase::Committing(ws);
        }
        if let Some(generation) = self.pending.take() {
            debug!(generation, "Dropping pending decode on commit");
        }

        info!(
            media_type = payload.media_type,
            edge = payload.edge,
            bytes = payload.len(),
            "Crop rendered, exporting"
        );
        Ok(payload)
    }

    /// Apply the export sink's outcome.
    ///
    /// Success closes the session; failure returns to `Editing` with the
    /// transform intact so the user can retry.
    pub fn finish_commit(&mut self, outcome: Result<(), SinkError>) -> Result<(), CropError> {
        let ws = match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Committing(ws) => ws,
            other => {
                self.phase = other;
                return Err(CropError::NotReady);
            }
        };

        match outcome {
            Ok(()) => {
                info!("Export succeeded, session closed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Export failed, returning to editing");
                self.phase = Phase::Editing(ws);
                Err(CropError::SinkFailed(e.0))
            }
        }
    }

    /// Render, export through `sink`, and apply the outcome.
    pub async fn commit_to<S: ExportSink>(&mut self, sink: &mut S) -> Result<(), CropError> {
        let payload = self.begin_commit()?;
        let outcome = sink.export(&payload).await;
        self.finish_commit(outcome)
    }

    /// Discard the loaded image (and any pending decode) without exporting.
    ///
    /// Returns `Busy` while committing.
    pub fn cancel(&mut self) -> Result<(), CropError> {
        if matches!(self.phase, Phase::Committing(_)) {
            warn!("Cancel ignored while committing");
            return Err(CropError::Busy);
        }
        if self.state() == SessionState::Editing || self.pending.is_some() {
            info!("Crop session cancelled");
        }
        self.phase = Phase::Closed;
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Pan;
    use crate::source::tests::png_bytes;

    fn session() -> CropSession {
        CropSession::new(CropConfig::default()).unwrap()
    }

    fn png_file(width: u32, height: u32) -> SelectedFile {
        SelectedFile::new("photo.png", "image/png", png_bytes(width, height))
    }

    fn loaded(width: u32, height: u32) -> CropSession {
        let mut s = session();
        s.load(png_file(width, height)).unwrap();
        s
    }

    fn drag(s: &mut CropSession, from: (f64, f64), to: (f64, f64)) {
        s.handle_event(InteractionEvent::PointerDown { id: 1, x: from.0, y: from.1 });
        s.handle_event(InteractionEvent::PointerMove { id: 1, x: to.0, y: to.1 });
        s.handle_event(InteractionEvent::PointerUp { id: 1 });
    }

    /// Records payloads and answers with a fixed outcome.
    struct RecordingSink {
        outcome: Result<(), SinkError>,
        received: Vec<Payload>,
    }

    impl RecordingSink {
        fn ok() -> Self {
            Self {
                outcome: Ok(()),
                received: Vec::new(),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                outcome: Err(SinkError::new(message)),
                received: Vec::new(),
            }
        }
    }

    impl ExportSink for RecordingSink {
        async fn export(&mut self, payload: &Payload) -> Result<(), SinkError> {
            self.received.push(payload.clone());
            self.outcome.clone()
        }
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let mut config = CropConfig::default();
        config.viewport_size = 0;
        assert!(CropSession::new(config).is_err());
    }

    #[test]
    fn test_new_rejects_unallocatable_output() {
        let mut config = CropConfig::default();
        config.output_edge = u32::MAX;
        assert!(matches!(
            CropSession::new(config),
            Err(ConfigError::OutputEdgeTooLarge { .. })
        ));
    }

    #[test]
    fn test_starts_closed() {
        let s = session();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.geometry().is_none());
        assert!(s.transform().is_none());
        assert!(!s.is_loading());
    }

    #[test]
    fn test_load_enters_editing_at_rest() {
        let s = loaded(1000, 500);
        assert_eq!(s.state(), SessionState::Editing);
        assert_eq!(s.transform(), Some(TransformState::default()));
        assert_eq!(s.source().unwrap().natural_size(), (1000, 500));
    }

    #[test]
    fn test_geometry_rest_landscape() {
        let s = loaded(1000, 500);
        let g = s.geometry().unwrap();
        assert!((g.base_scale - 0.56).abs() < 1e-9);
        assert!((g.display_width - 560.0).abs() < 1e-9);
        assert!((g.display_height - 280.0).abs() < 1e-9);
        assert!((g.origin_x + 140.0).abs() < 1e-9);
        assert!(g.origin_y.abs() < 1e-9);

        let rect = s.visible_rect().unwrap();
        assert!((rect.x - 250.0).abs() < 1e-9);
        assert!(rect.y.abs() < 1e-9);
        assert!((rect.width - 500.0).abs() < 1e-9);
        assert!((rect.height - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_after_zoom_and_drag() {
        let mut s = loaded(1000, 500);
        s.set_zoom(2.0);
        drag(&mut s, (100.0, 100.0), (150.0, 80.0));

        let t = s.transform().unwrap();
        assert_eq!(t.zoom, 2.0);
        assert_eq!(t.pan, Pan::new(50.0, -20.0));

        let g = s.geometry().unwrap();
        assert!((g.scale - 1.12).abs() < 1e-9);
        assert!((g.origin_x + 370.0).abs() < 1e-9);
        assert!((g.origin_y + 160.0).abs() < 1e-9);

        let rect = s.visible_rect().unwrap();
        assert_eq!((rect.x * 100.0).round() / 100.0, 330.36);
        assert_eq!((rect.y * 100.0).round() / 100.0, 142.86);
        assert!((rect.width - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_commit_without_image_not_ready() {
        let mut s = session();
        assert!(matches!(s.begin_commit(), Err(CropError::NotReady)));
        assert_eq!(s.state(), SessionState::Closed);

        let mut sink = RecordingSink::ok();
        let result = pollster::block_on(s.commit_to(&mut sink));
        assert!(matches!(result, Err(CropError::NotReady)));
        assert!(sink.received.is_empty());
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn test_oversized_selection_keeps_session() {
        let mut s = loaded(400, 300);
        drag(&mut s, (0.0, 0.0), (12.0, 7.0));
        let before = s.transform();

        let big = SelectedFile::new("huge.jpg", "image/jpeg", vec![0u8; 15 * 1024 * 1024]);
        assert!(matches!(s.select_file(big), Err(CropError::TooLarge { .. })));

        assert_eq!(s.state(), SessionState::Editing);
        assert_eq!(s.transform(), before);
        assert_eq!(s.source().unwrap().natural_size(), (400, 300));
        assert!(!s.is_loading());
    }

    #[test]
    fn test_text_selection_invalid_type() {
        let mut s = session();
        let txt = SelectedFile::new("notes.txt", "text/plain", b"hello".to_vec());
        assert!(matches!(s.load(txt), Err(CropError::InvalidType(_))));
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn test_decode_failure_closes() {
        let mut s = loaded(100, 100);
        let broken = SelectedFile::new("broken.jpg", "image/jpeg", vec![0xFF, 0xD8, 0x00]);
        assert!(matches!(s.load(broken), Err(CropError::DecodeFailed(_))));
        assert_eq!(s.state(), SessionState::Closed);
        assert!(!s.is_loading());
    }

    #[test]
    fn test_load_uses_upright_dimensions() {
        let mut s = session();
        let bytes = crate::source::tests::jpeg_with_orientation(400, 200, 6);
        s.load(SelectedFile::new("phone.jpg", "image/jpeg", bytes)).unwrap();

        assert_eq!(s.source().unwrap().natural_size(), (200, 400));
        let g = s.geometry().unwrap();
        assert!((g.base_scale - 1.4).abs() < 1e-9);
        assert!((g.display_width - 280.0).abs() < 1e-9);
        assert!((g.display_height - 560.0).abs() < 1e-9);
    }

    #[test]
    fn test_new_image_resets_transform() {
        let mut s = loaded(1000, 500);
        s.set_zoom(2.5);
        drag(&mut s, (0.0, 0.0), (30.0, 30.0));

        s.load(png_file(300, 600)).unwrap();
        assert_eq!(s.transform(), Some(TransformState::default()));
        assert_eq!(s.source().unwrap().natural_size(), (300, 600));
    }

    #[test]
    fn test_pending_decode_keeps_current_session_interactive() {
        let mut s = loaded(500, 500);
        let ticket = s.select_file(png_file(200, 100)).unwrap();

        assert!(s.is_loading());
        assert_eq!(s.state(), SessionState::Editing);
        s.handle_event(InteractionEvent::Wheel { delta_y: -1.0 });
        assert!((s.transform().unwrap().zoom - 1.05).abs() < 1e-12);

        s.complete_load(ticket.generation(), ticket.decode()).unwrap();
        assert_eq!(s.source().unwrap().natural_size(), (200, 100));
        assert_eq!(s.transform().unwrap().zoom, 1.0);
    }

    #[test]
    fn test_stale_decode_result_ignored() {
        let mut s = session();
        let first = s.select_file(png_file(10, 10)).unwrap();
        let second = s.select_file(png_file(20, 20)).unwrap();

        // The older selection finishes last
        s.complete_load(second.generation(), second.decode()).unwrap();
        s.complete_load(first.generation(), first.decode()).unwrap();

        assert_eq!(s.source().unwrap().natural_size(), (20, 20));
    }

    #[test]
    fn test_events_ignored_when_closed() {
        let mut s = session();
        let effect = s.handle_event(InteractionEvent::PointerDown { id: 1, x: 0.0, y: 0.0 });
        assert_eq!(effect, Effect::None);
        assert_eq!(s.pointer_state(), PointerState::Idle);
    }

    #[test]
    fn test_pointer_capture_reported() {
        let mut s = loaded(100, 100);
        let effect = s.handle_event(InteractionEvent::PointerDown { id: 4, x: 1.0, y: 1.0 });
        assert_eq!(effect, Effect::CapturePointer(4));
        assert!(s.pointer_state().is_dragging());
    }

    #[test]
    fn test_commit_success_closes() {
        let mut s = loaded(640, 480);
        let mut sink = RecordingSink::ok();

        pollster::block_on(s.commit_to(&mut sink)).unwrap();

        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.source().is_none());
        assert_eq!(sink.received.len(), 1);
        assert_eq!(sink.received[0].media_type, "image/jpeg");
        assert_eq!(sink.received[0].edge, 400);
    }

    #[test]
    fn test_commit_failure_returns_to_editing() {
        let mut s = loaded(640, 480);
        s.set_zoom(1.5);
        drag(&mut s, (10.0, 10.0), (30.0, 5.0));
        let before = s.transform();

        let mut sink = RecordingSink::failing("network down");
        let result = pollster::block_on(s.commit_to(&mut sink));

        match result {
            Err(CropError::SinkFailed(msg)) => assert_eq!(msg, "network down"),
            other => panic!("Expected SinkFailed, got: {:?}", other),
        }
        assert_eq!(s.state(), SessionState::Editing);
        assert_eq!(s.transform(), before);

        // Retry succeeds without re-cropping
        let mut ok = RecordingSink::ok();
        pollster::block_on(s.commit_to(&mut ok)).unwrap();
        assert_eq!(ok.received[0].bytes, sink.received[0].bytes);
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn test_committing_refuses_input() {
        let mut s = loaded(300, 300);
        let _payload = s.begin_commit().unwrap();
        assert_eq!(s.state(), SessionState::Committing);

        assert!(matches!(s.begin_commit(), Err(CropError::Busy)));
        assert!(matches!(s.select_file(png_file(5, 5)), Err(CropError::Busy)));
        assert!(matches!(s.cancel(), Err(CropError::Busy)));

        let before = s.transform();
        s.handle_event(InteractionEvent::Wheel { delta_y: -1.0 });
        s.set_zoom(3.0);
        assert_eq!(s.transform(), before);
        // Preview geometry is still readable while the upload runs
        assert!(s.geometry().is_some());
    }

    #[test]
    fn test_commit_drops_pending_decode() {
        let mut s = loaded(300, 300);
        let ticket = s.select_file(png_file(50, 50)).unwrap();
        s.begin_commit().unwrap();

        s.complete_load(ticket.generation(), ticket.decode()).unwrap();
        assert_eq!(s.state(), SessionState::Committing);
        assert_eq!(s.source().unwrap().natural_size(), (300, 300));
    }

    #[test]
    fn test_finish_without_commit_not_ready() {
        let mut s = loaded(100, 100);
        assert!(matches!(s.finish_commit(Ok(())), Err(CropError::NotReady)));
        assert_eq!(s.state(), SessionState::Editing);
    }

    #[test]
    fn test_identical_commits_identical_bytes() {
        let mut s = loaded(800, 600);
        s.set_zoom(2.2);
        drag(&mut s, (0.0, 0.0), (-40.0, 25.0));

        let first = s.begin_commit().unwrap();
        s.finish_commit(Err(SinkError::new("retry"))).unwrap_err();
        let second = s.begin_commit().unwrap();

        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_cancel_discards_image() {
        let mut s = loaded(100, 100);
        s.cancel().unwrap();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.source().is_none());
        assert!(matches!(s.begin_commit(), Err(CropError::NotReady)));
    }

    #[test]
    fn test_cancel_drops_pending_decode() {
        let mut s = session();
        let ticket = s.select_file(png_file(10, 10)).unwrap();
        s.cancel().unwrap();

        s.complete_load(ticket.generation(), ticket.decode()).unwrap();
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CropSession>();
    }
}
