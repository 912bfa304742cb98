//! Ownership of image blob URLs.
//!
//! With `EmbedType: blob` the image plugins embed pictures as `blob:` object
//! URLs. The control that created (or was handed) a URL owns it and revokes
//! it according to the configured policy.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;
use tracing::debug;

use crate::config::RevokePolicy;
use crate::platform::BlobRevoker;

static IMAGE_BLOB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc=(?:"(blob:[^"]+)"|'(blob:[^']+)')"#).expect("valid regex")
});

/// Blob URLs referenced by `<img>` tags, in document order, without duplicates.
pub fn parse_image_blob_urls(html: &str) -> Vec<SmolStr> {
    let mut urls: Vec<SmolStr> = Vec::new();
    for caps in IMAGE_BLOB_URL.captures_iter(html) {
        if let Some(url) = caps.get(1).or_else(|| caps.get(2)) {
            let url = SmolStr::new(url.as_str());
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Blob URLs owned by one control.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlobRegistry {
    urls: Vec<SmolStr>,
}

impl BlobRegistry {
    pub fn track(&mut self, url: impl Into<SmolStr>) {
        let url = url.into();
        if !self.urls.contains(&url) {
            self.urls.push(url);
        }
    }

    /// Take ownership of every blob referenced by `html`.
    pub fn track_referenced(&mut self, html: &str) {
        for url in parse_image_blob_urls(html) {
            self.track(url);
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn urls(&self) -> &[SmolStr] {
        &self.urls
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Revoke tracked blobs no longer referenced by a newly assigned value.
    pub fn prune_unreferenced(&mut self, value: &str, revoker: &dyn BlobRevoker) {
        let referenced = parse_image_blob_urls(value);
        self.urls.retain(|url| {
            let keep = referenced.contains(url);
            if !keep {
                debug!(url = %url, "revoking blob no longer referenced");
                revoker.revoke(url);
            }
            keep
        });
    }

    /// Release blobs when the owning control is disposed.
    ///
    /// `final_value` is the control's value at disposal; it is only consulted
    /// for [`RevokePolicy::UnreferencedOnly`].
    pub fn release(&mut self, policy: RevokePolicy, final_value: &str, revoker: &dyn BlobRevoker) {
        let referenced = match policy {
            RevokePolicy::All => Vec::new(),
            RevokePolicy::UnreferencedOnly => parse_image_blob_urls(final_value),
        };
        for url in self.urls.drain(..) {
            if !referenced.contains(&url) {
                revoker.revoke(&url);
            }
        }
    }

    /// Adopt blobs referenced by a committed detached editor value.
    pub fn adopt(&mut self, detached_value: &str) {
        self.track_referenced(detached_value);
    }

    /// Revoke blobs that only a discarded detached editor value references.
    pub fn discard(&self, detached_value: &str, primary_value: &str, revoker: &dyn BlobRevoker) {
        let in_primary = parse_image_blob_urls(primary_value);
        for url in parse_image_blob_urls(detached_value) {
            if !self.contains(&url) && !in_primary.contains(&url) {
                debug!(url = %url, "revoking blob added in detached editor");
                revoker.revoke(&url);
            }
        }
    }
}
