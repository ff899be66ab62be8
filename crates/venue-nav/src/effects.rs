use crate::store::Store;
use std::path::PathBuf;
use tracing::warn;

/// Deferred effects that must run outside the main reducer (file IO,
/// image fetches by the host)
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Save the current revision to disk
    SaveRevision { path: PathBuf },
    /// Replace the current revision with one from disk
    LoadRevision { path: PathBuf },
    /// Ask the host to fetch a panorama image
    LoadPanorama { url: String },
}

/// Execute a single effect against the store. Returns the panorama url
/// the host should start fetching, if any.
pub fn run(store: &mut Store, effect: Effect) -> Option<String> {
    match effect {
        Effect::SaveRevision { path } => {
            if let Err(e) = store.save_to_file(&path) {
                warn!(path = %path.display(), error = %e, "save failed");
                store.raise_error(e.to_string());
            }
            None
        }
        Effect::LoadRevision { path } => match store.load_from_file(&path) {
            Ok(()) => store.request_panorama(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "load failed");
                store.raise_error(e.to_string());
                None
            }
        },
        Effect::LoadPanorama { url } => Some(url),
    }
}
