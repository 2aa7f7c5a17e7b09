//! Render dispatch
//!
//! Receives snapshot events from the fetcher and hands each snapshot to the
//! presentation layer. Freshness filtering has already happened in the
//! fetcher; the dispatcher forwards everything it receives, in order.

use std::collections::BTreeSet;

use tokio::sync::mpsc;
use tracing::debug;

use crate::data::Snapshot;
use crate::fetcher::SnapshotEvent;

/// The presentation layer as seen from the core
///
/// Rendering the same key twice must update the existing display surface
/// for that key; the last call wins.
pub trait Renderer {
    /// Shows `snapshot`, creating the display surface for its key if needed
    fn render_snapshot(&mut self, snapshot: Snapshot);

    /// Drops the display surface for `key`, if there is one
    fn discard(&mut self, key: &str);

    /// Keys that currently have a display surface
    fn displayed_keys(&self) -> BTreeSet<String>;
}

/// Forwards fetched snapshots to a `Renderer`
pub struct Dispatcher<R> {
    renderer: R,
}

impl<R: Renderer> Dispatcher<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Forwards one event to the renderer
    pub fn dispatch(&mut self, event: SnapshotEvent) {
        debug!(key = %event.snapshot.key, source = %event.source, "Rendering snapshot");
        self.renderer.render_snapshot(event.snapshot);
    }

    /// Forwards every event from `rx` until all senders are gone.
    /// Returns the number of snapshots rendered.
    pub async fn drain(&mut self, mut rx: mpsc::UnboundedReceiver<SnapshotEvent>) -> usize {
        let mut rendered = 0;
        while let Some(event) = rx.recv().await {
            self.dispatch(event);
            rendered += 1;
        }
        rendered
    }
}

/// Renderer that keeps every snapshot it was given, in order
///
/// Used by tests and anywhere the rendered output needs inspecting.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub rendered: Vec<Snapshot>,
    displayed: BTreeSet<String>,
}

impl Renderer for RecordingRenderer {
    fn render_snapshot(&mut self, snapshot: Snapshot) {
        self.displayed.insert(snapshot.key.clone());
        self.rendered.push(snapshot);
    }

    fn discard(&mut self, key: &str) {
        self.displayed.remove(key);
    }

    fn displayed_keys(&self) -> BTreeSet<String> {
        self.displayed.clone()
    }
}
