use crate::actions::{self, Action};
use crate::cache::Cache;
use crate::effects::{self, Effect};
use crate::graph_state::NodeId;
use crate::hotspot::{Hotspot, HotspotOverlay, PanoramaViewer, Propagation};
use crate::store::Store;
use std::time::Instant;
use tracing::warn;

pub struct State {
    pub store: Store,
    pub cache: Cache,
    overlay: HotspotOverlay,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
    texture_requests: Vec<String>,
    // hotspot cache version last pushed to the overlay
    synced: Option<u64>,
}

impl State {
    pub fn new(store: Store) -> Self {
        let overlay = HotspotOverlay::new(&store.config);
        Self {
            store,
            cache: Cache::new(),
            overlay,
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
            texture_requests: Vec::new(),
            synced: None,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    pub fn flush_actions(&mut self) {
        let actions = std::mem::take(&mut self.action_queue);
        for action in actions {
            match actions::update(&mut self.store, action) {
                Ok(mut effects) => self.effect_queue.append(&mut effects),
                Err(e) => {
                    warn!(error = %e, "action rejected");
                    self.store.raise_error(e.to_string());
                }
            }
        }
    }

    pub fn flush_effects(&mut self) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            if let Some(url) = effects::run(&mut self.store, effect) {
                self.texture_requests.push(url);
            }
        }
    }

    /// Panorama urls the host should start fetching. Results come back
    /// as [`Action::PanoramaLoaded`].
    pub fn take_texture_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.texture_requests)
    }

    pub fn hotspots(&mut self) -> &[Hotspot] {
        self.cache.hotspots.get(&self.store)
    }

    /// Route a marker click. A hit queues the navigation and consumes
    /// the click.
    pub fn click(&mut self, target: &NodeId) -> Propagation {
        let response = self.overlay.click(target);
        if let Some(action) = response.action {
            self.dispatch(action);
        }
        response.propagation
    }

    /// One display refresh: apply queued work, advance auto-rotate, and
    /// bring the viewer's markers up to date.
    pub fn frame(&mut self, now: Instant, viewer: &mut dyn PanoramaViewer) {
        self.flush_actions();
        self.flush_effects();

        if let Err(e) = self.store.advance_auto_rotate() {
            warn!(error = %e, "auto-rotate stopped");
            self.store.auto_rotate.stop();
            self.store.raise_error(e.to_string());
        }

        self.cache.hotspots.get(&self.store);
        let version = self.cache.hotspots.version();
        if self.synced != Some(version) {
            let markers = self.cache.hotspots.get(&self.store).clone();
            self.overlay.sync(markers, now);
            self.synced = Some(version);
        }
        self.overlay.poll(now, viewer);
    }
}
