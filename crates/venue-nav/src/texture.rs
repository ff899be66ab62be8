use crate::error::TextureError;
use tracing::{debug, warn};

/// Which panorama image is shown and which one is being fetched.
///
/// Loads run on the host; results come back through [`complete`].
/// A failed or superseded load never replaces what is on screen.
///
/// [`complete`]: PanoramaTexture::complete
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanoramaTexture {
    current: Option<String>,
    pending: Option<String>,
}

impl PanoramaTexture {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Ask for `url` to be shown. Returns the url the host should
    /// start fetching, if any. `None` clears the image.
    pub fn request(&mut self, url: Option<&str>) -> Option<String> {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            self.current = None;
            self.pending = None;
            return None;
        };
        if self.pending.as_deref() == Some(url) {
            return None;
        }
        if self.current.as_deref() == Some(url) {
            self.pending = None;
            return None;
        }
        self.pending = Some(url.to_owned());
        Some(url.to_owned())
    }

    /// Record the outcome of a fetch. Returns whether the shown image
    /// changed.
    pub fn complete(
        &mut self,
        url: &str,
        outcome: Result<(), TextureError>,
    ) -> bool {
        if self.pending.as_deref() != Some(url) {
            debug!(url, "ignoring superseded panorama load");
            return false;
        }
        self.pending = None;
        match outcome {
            Ok(()) => {
                self.current = Some(url.to_owned());
                true
            }
            Err(e) => {
                warn!(url, error = %e, "panorama load failed, keeping previous image");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_load_replaces_image() {
        let mut t = PanoramaTexture::default();

        assert_eq!(t.request(Some("a.jpg")), Some("a.jpg".to_string()));
        assert!(t.complete("a.jpg", Ok(())));

        assert_eq!(t.current(), Some("a.jpg"));
        assert_eq!(t.pending(), None);
    }

    #[test]
    fn test_failed_load_keeps_previous_image() {
        let mut t = PanoramaTexture::default();
        t.request(Some("a.jpg"));
        t.complete("a.jpg", Ok(()));

        t.request(Some("b.jpg"));
        let changed = t.complete(
            "b.jpg",
            Err(TextureError::Fetch("404".to_string())),
        );

        assert!(!changed);
        assert_eq!(t.current(), Some("a.jpg"));
        assert_eq!(t.pending(), None);
    }

    #[test]
    fn test_failed_first_load_leaves_empty() {
        let mut t = PanoramaTexture::default();
        t.request(Some("a.jpg"));
        t.complete("a.jpg", Err(TextureError::Decode("bad".to_string())));
        assert_eq!(t.current(), None);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut t = PanoramaTexture::default();
        t.request(Some("a.jpg"));
        t.request(Some("b.jpg"));

        assert!(!t.complete("a.jpg", Ok(())), "a was superseded by b");
        assert_eq!(t.current(), None);
        assert!(t.complete("b.jpg", Ok(())));
        assert_eq!(t.current(), Some("b.jpg"));
    }

    #[test]
    fn test_repeated_request_is_not_refetched() {
        let mut t = PanoramaTexture::default();
        assert!(t.request(Some("a.jpg")).is_some());
        assert_eq!(t.request(Some("a.jpg")), None);
        t.complete("a.jpg", Ok(()));
        assert_eq!(t.request(Some("a.jpg")), None);
    }

    #[test]
    fn test_no_url_clears() {
        let mut t = PanoramaTexture::default();
        t.request(Some("a.jpg"));
        t.complete("a.jpg", Ok(()));

        assert_eq!(t.request(None), None);
        assert_eq!(t.current(), None);
    }
}
