use crate::engine::xr::{HitTestTracker, SessionId, XrRuntime};

/// Engine-side state for the one running immersive session.
///
/// Built on `SessionStarted`, torn down on `SessionEnded`. Owning the tracker
/// here means a new session can never inherit the previous one's subscription.
#[derive(Debug)]
pub struct ActiveSession {
    pub id: SessionId,
    pub tracker: HitTestTracker,
    pub frames: u64,
}

impl ActiveSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            tracker: HitTestTracker::new(),
            frames: 0,
        }
    }

    /// Release runtime resources held by this session.
    pub fn end(mut self, runtime: &mut dyn XrRuntime) {
        self.tracker.reset(runtime);
    }
}
