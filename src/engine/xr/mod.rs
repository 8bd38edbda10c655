//! Immersive session plumbing.
//!
//! `XrRuntime` is the seam to the device runtime. Requests that the platform
//! resolves asynchronously return a `RequestId` right away; their completions
//! come back later as events on the engine's `EventQueue`, drained on the same
//! thread as the frame callback.

pub mod session;
pub mod simulated;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::EngineResult;
use crate::engine::event_queue::EventQueue;
use crate::engine::math::{self, Mat4, Quat, Vec3};

pub use hit_test::{HitTestTracker, ReticleUpdate, SubscriptionState};
pub use session::ActiveSession;
pub use simulated::SimulatedRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle for one asynchronous runtime request. Unique for the runtime's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XrFeature {
    HitTest,
    LocalFloor,
    DomOverlay,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionInit {
    pub required_features: Vec<XrFeature>,
    pub optional_features: Vec<XrFeature>,
}

impl SessionInit {
    pub fn requests(&self, feature: XrFeature) -> bool {
        self.required_features.contains(&feature) || self.optional_features.contains(&feature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpaceKind {
    /// Tracks the device itself; origin at the viewer, forward is -Z.
    Viewer,
    /// Floor-level origin; the session's base space.
    LocalFloor,
}

impl ReferenceSpaceKind {
    pub fn to_openxr(self) -> openxr::ReferenceSpaceType {
        match self {
            ReferenceSpaceKind::Viewer => openxr::ReferenceSpaceType::VIEW,
            ReferenceSpaceKind::LocalFloor => openxr::ReferenceSpaceType::STAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpace {
    pub id: SpaceId,
    pub kind: ReferenceSpaceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSourceId(pub u32);

/// Runtime-owned hit-test feed, anchored to a reference space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSource {
    pub id: HitTestSourceId,
    pub space: SpaceId,
}

/// Rigid transform: position plus unit orientation (xyzw).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: math::QUAT_IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    #[cfg(test)]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Column-major 4x4 rigid transform.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_trs(self.position, self.orientation, [1.0; 3])
    }

    /// Direction of the local -Z axis.
    pub fn forward(&self) -> Vec3 {
        math::quat_rotate(self.orientation, [0.0, 0.0, -1.0])
    }
}

impl From<openxr::Posef> for Pose {
    fn from(p: openxr::Posef) -> Self {
        Self {
            position: [p.position.x, p.position.y, p.position.z],
            orientation: [p.orientation.x, p.orientation.y, p.orientation.z, p.orientation.w],
        }
    }
}

impl From<Pose> for openxr::Posef {
    fn from(p: Pose) -> Self {
        openxr::Posef {
            orientation: openxr::Quaternionf {
                x: p.orientation[0],
                y: p.orientation[1],
                z: p.orientation[2],
                w: p.orientation[3],
            },
            position: openxr::Vector3f {
                x: p.position[0],
                y: p.position[1],
                z: p.position[2],
            },
        }
    }
}

/// One surface intersection. The runtime resolves its pose against the
/// session's base space; asking for any other space yields `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    base_space: SpaceId,
    pose: openxr::Posef,
}

impl HitTestResult {
    /// `pose` as the runtime reports it, relative to `base_space`.
    pub fn new(base_space: SpaceId, pose: openxr::Posef) -> Self {
        Self { base_space, pose }
    }

    pub fn get_pose(&self, space: &ReferenceSpace) -> Option<Pose> {
        (space.id == self.base_space).then(|| self.pose.into())
    }
}

/// Per-tick frame token. Valid only for the tick it was produced in.
#[derive(Debug, Clone)]
pub struct XrFrame {
    pub session: SessionId,
    pub index: u64,
    results: HashMap<HitTestSourceId, Vec<HitTestResult>>,
}

impl XrFrame {
    pub fn new(session: SessionId, index: u64) -> Self {
        Self {
            session,
            index,
            results: HashMap::new(),
        }
    }

    pub fn with_results(mut self, source: HitTestSourceId, results: Vec<HitTestResult>) -> Self {
        self.results.insert(source, results);
        self
    }

    /// Results for `source`, nearest first. Empty for unknown sources.
    pub fn hit_test_results(&self, source: &HitTestSource) -> &[HitTestResult] {
        self.results.get(&source.id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Immersive session API as seen by the engine.
pub trait XrRuntime {
    /// Whether `feature` is enabled for the active session.
    fn supports_feature(&self, feature: XrFeature) -> bool;

    /// Ask for an immersive session. `Event::SessionStarted` follows on a later poll.
    fn request_session(&mut self, init: &SessionInit) -> EngineResult<()>;

    /// Ask the active session to end. `Event::SessionEnded` follows on a later poll.
    fn end_session(&mut self) -> EngineResult<()>;

    /// Move any completed requests / lifecycle changes onto the queue.
    fn poll_events(&mut self, queue: &mut EventQueue);

    /// Frame token for this tick, `None` when no session is presenting.
    fn begin_frame(&mut self) -> Option<XrFrame>;

    /// Space that hit-test poses are reported in (the renderer's space).
    fn base_reference_space(&self) -> Option<ReferenceSpace>;

    fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> EngineResult<RequestId>;

    fn request_hit_test_source(&mut self, space: &ReferenceSpace) -> EngineResult<RequestId>;

    fn cancel_hit_test_source(&mut self, source: &HitTestSource);
}
