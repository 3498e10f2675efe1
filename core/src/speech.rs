//! Speech session collaborator seams.
//!
//! The cloud transport (connection, audio capture, recognition protocol)
//! lives outside this crate. The engine only needs the session's tri-state
//! status to route keystrokes, a way to request start/stop, and the three
//! result callbacks, which the host must deliver on the key-event thread so
//! that engine state keeps a single writer.

/// Where the speech session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechStatus {
    /// Nothing in flight; keystrokes flow to composition.
    #[default]
    Idle,
    /// Audio is being captured; all keys but the hot-key are swallowed.
    Recording,
    /// Stop requested, final result pending; everything is swallowed.
    Waiting,
}

/// The recognition session the transport implements.
///
/// `start` is called from a detached worker thread (connection setup must not
/// block key delivery); `stop` is a cooperative request that moves the
/// session towards `Waiting` once the transport confirms. Status reads happen
/// on the key-event thread, so implementations must be `Send + Sync`.
pub trait SpeechSession: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn status(&self) -> SpeechStatus;
}

/// Recognition results flowing back into the engine.
///
/// Implemented by [`crate::Engine`]. The transport's own threads must not
/// call these directly; the host marshals them onto the key-event thread.
pub trait SpeechListener {
    /// An intermediate transcript; shown as preedit, nothing committed.
    fn on_partial_result(&mut self, text: &str);
    /// The final transcript; committed, session UI reset.
    fn on_completed(&mut self, text: &str);
    /// The session died (task failure, channel closed). Partial input is
    /// discarded and the UI reset; never fatal to composition.
    fn on_failed(&mut self);
}
