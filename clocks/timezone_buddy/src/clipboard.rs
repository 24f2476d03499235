//! Clipboard - puts share links on the OS clipboard
//!
//! nannou_egui does not forward egui's platform output, so `copied_text`
//! never reaches the system. Copies go through `arboard` instead.

use shared::{CodecError, Notice, Session};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Failed to build share link: {0}")]
    Link(#[from] CodecError),
    #[error("Clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
}

/// Destination for copied text
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard, opened on first use
///
/// The handle is kept for the life of the app; on X11 and Wayland the
/// copied text is only served while it is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let clipboard = self.inner.insert(clipboard);
        clipboard.set_text(text.to_string())?;
        Ok(())
    }
}

/// Build the share link and copy it, returning the link on success
pub fn copy_share_link(
    session: &Session,
    base_url: &str,
    clipboard: &mut dyn Clipboard,
) -> Result<String, ClipboardError> {
    let link = session.share_link(base_url)?;
    clipboard.set_text(&link)?;
    Ok(link)
}

/// Copy the share link and describe the result for a toast
pub fn copy_share_link_notice(
    session: &Session,
    base_url: &str,
    clipboard: &mut dyn Clipboard,
) -> Notice {
    match copy_share_link(session, base_url, clipboard) {
        Ok(link) => {
            info!(link = %link, "Share link copied");
            Notice::success("Link copied to clipboard!")
        }
        Err(e) => {
            warn!("Failed to copy share link: {}", e);
            Notice::error("Failed to copy link")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        decode_fragment, Catalog, Clock, LaunchLocation, MemoryStore, StateCodec, SystemClock,
        VisitorSync,
    };

    /// In-memory clipboard that can be told to fail
    #[derive(Default)]
    struct FakeClipboard {
        text: Option<String>,
        fail: bool,
    }

    impl Clipboard for FakeClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Clipboard(arboard::Error::ClipboardNotSupported));
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn session() -> Session {
        let (session, _) = Session::start(
            StateCodec::new(Catalog::builtin(), "Europe/Paris"),
            Box::new(MemoryStore::new()),
            Box::new(LaunchLocation::default()),
            VisitorSync::new(None),
            SystemClock.now(),
        );
        session
    }

    #[test]
    fn test_copy_puts_link_on_clipboard() {
        let session = session();
        let mut clipboard = FakeClipboard::default();

        let notice = copy_share_link_notice(&session, "https://example.com/", &mut clipboard);
        assert_eq!(notice, Notice::success("Link copied to clipboard!"));

        let text = clipboard.text.unwrap();
        let (base, token) = text.split_once('#').unwrap();
        assert_eq!(base, "https://example.com/");
        let shared = decode_fragment(token).unwrap();
        assert_eq!(shared.zones, Some(vec!["paris".to_string()]));
        assert_eq!(shared.offset, Some(0));
    }

    #[test]
    fn test_clipboard_failure_reports_error() {
        let session = session();
        let mut clipboard = FakeClipboard {
            fail: true,
            ..Default::default()
        };

        assert!(matches!(
            copy_share_link(&session, "https://example.com/", &mut clipboard),
            Err(ClipboardError::Clipboard(_))
        ));
        let notice = copy_share_link_notice(&session, "https://example.com/", &mut clipboard);
        assert_eq!(notice, Notice::error("Failed to copy link"));
        assert!(clipboard.text.is_none());
    }
}
