use std::collections::VecDeque;

use crate::engine::assets::LoadedModel;
use crate::engine::xr::{HitTestSource, ReferenceSpace, RequestId, SessionId};

#[derive(Debug, Clone)]
pub enum Event {
    SessionStarted {
        session: SessionId,
    },
    SessionEnded {
        session: SessionId,
    },
    ReferenceSpaceResolved {
        request: RequestId,
        space: ReferenceSpace,
    },
    HitTestSourceResolved {
        request: RequestId,
        source: HitTestSource,
    },
    RequestFailed {
        request: RequestId,
        reason: String,
    },
    /// Discrete "place it here" action (tap / trigger / click).
    Select,
    ToggleSession,
    Resize {
        width: u32,
        height: u32,
    },
    Orbit {
        dx: f32,
        dy: f32,
    },
    ModelLoaded {
        model: LoadedModel,
    },
    ModelLoadFailed {
        path: String,
        reason: String,
    },
}

/**
 * Single-threaded FIFO of platform events (async completions, session
 * lifecycle, user input, asset loads). Drained at the top of every tick,
 * before the frame callback runs, so handlers never overlap a frame update.
 */
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Queue a select action.
    pub fn queue_select(&mut self) {
        self.push(Event::Select);
    }

    /// Queue an enter/exit immersive mode request.
    pub fn queue_toggle_session(&mut self) {
        self.push(Event::ToggleSession);
    }

    /// Queue a viewport resize.
    pub fn queue_resize(&mut self, width: u32, height: u32) {
        self.push(Event::Resize { width, height });
    }

    #[cfg(test)]
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Take everything queued so far. Events pushed while handling these wait
    /// for the next drain.
    pub fn take_all(&mut self) -> VecDeque<Event> {
        std::mem::take(&mut self.events)
    }
}
