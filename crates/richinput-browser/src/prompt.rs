//! Blob revocation and confirmation prompts.

use richinput_core::platform::{BlobRevoker, ConfirmPrompt};
use tracing::warn;

/// Revokes object URLs with `URL.revokeObjectURL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlBlobRevoker;

impl BlobRevoker for UrlBlobRevoker {
    fn revoke(&self, url: &str) {
        if let Err(e) = web_sys::Url::revoke_object_url(url) {
            warn!(url, error = ?e, "failed to revoke blob url");
        }
    }
}

/// Asks with the browser's modal `window.confirm`.
///
/// The answer is delivered synchronously; the control queues it behind the
/// work in progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowConfirm;

impl ConfirmPrompt for WindowConfirm {
    fn confirm(&self, message: &str, done: Box<dyn FnOnce(bool)>) {
        let answer = match web_sys::window() {
            Some(window) => window.confirm_with_message(message).unwrap_or_else(|e| {
                warn!(error = ?e, "confirm dialog unavailable");
                false
            }),
            None => false,
        };
        done(answer);
    }
}
