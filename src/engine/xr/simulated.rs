//! Deterministic in-process XR runtime.
//!
//! Stands in for a headset / phone runtime in tests, the headless demo and the
//! desktop preview. Requests resolve after a configurable number of polls; hit
//! tests cast the viewer's -Z ray against a set of infinite planes. Results are
//! handed out as `openxr::Posef`, the way a device runtime reports them.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use crate::engine::config::{SimulationConfig, SurfaceConfig};
use crate::engine::event_queue::{Event, EventQueue};
use crate::engine::math::{self, Vec3};
use crate::engine::xr::{
    HitTestResult, HitTestSource, HitTestSourceId, Pose, ReferenceSpace, ReferenceSpaceKind,
    RequestId, SessionId, SessionInit, SpaceId, XrFeature, XrFrame, XrRuntime,
};
use crate::engine::{EngineError, EngineResult};

/// Counters tests use to check request discipline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestStats {
    pub sessions_started: u32,
    pub reference_space_requests: u32,
    pub hit_test_source_requests: u32,
    pub cancelled_sources: u32,
}

#[derive(Debug, Clone)]
enum Completion {
    Space(ReferenceSpace),
    Source(HitTestSource),
    Failed(String),
}

#[derive(Debug)]
struct Pending {
    due: u64,
    request: RequestId,
    completion: Completion,
}

#[derive(Debug)]
struct SimSession {
    id: SessionId,
    base_space: ReferenceSpace,
    features: HashSet<XrFeature>,
}

#[derive(Debug)]
pub struct SimulatedRuntime {
    supports_hit_test: bool,
    latency_frames: u32,
    fail_reference_space: bool,
    fail_hit_test_source: bool,
    never_resolve: bool,

    session: Option<SimSession>,
    outbox: VecDeque<Event>,
    pending: Vec<Pending>,
    sources: Vec<HitTestSource>,
    space_types: HashMap<SpaceId, openxr::ReferenceSpaceType>,

    clock: u64,
    frame_index: u64,
    next_request: u64,
    next_space: u32,
    next_source: u32,

    viewer: Pose,
    surfaces: Vec<SurfaceConfig>,
    scripted: VecDeque<Vec<Pose>>,

    stats: RequestStats,
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRuntime {
    /// Runtime with hit-test support, one-poll latency, identity viewer and no surfaces.
    pub fn new() -> Self {
        Self {
            supports_hit_test: true,
            latency_frames: 1,
            fail_reference_space: false,
            fail_hit_test_source: false,
            never_resolve: false,
            session: None,
            outbox: VecDeque::new(),
            pending: Vec::new(),
            sources: Vec::new(),
            space_types: HashMap::new(),
            clock: 0,
            frame_index: 0,
            next_request: 1,
            next_space: 1,
            next_source: 1,
            viewer: Pose::default(),
            surfaces: Vec::new(),
            scripted: VecDeque::new(),
            stats: RequestStats::default(),
        }
    }

    pub fn from_config(cfg: &SimulationConfig) -> Self {
        let orientation =
            math::quat_from_axis_angle([1.0, 0.0, 0.0], cfg.viewer_pitch_degrees.to_radians());
        let mut rt = Self::new()
            .with_hit_test_support(cfg.supports_hit_test)
            .with_latency_frames(cfg.acquisition_latency_frames)
            .with_viewer(Pose::new(cfg.viewer_position, orientation))
            .with_surfaces(cfg.surfaces.clone());
        rt.fail_reference_space(cfg.fail_reference_space);
        rt.fail_hit_test_source(cfg.fail_hit_test_source);
        rt.never_resolve(cfg.never_resolve);
        rt
    }

    pub fn with_hit_test_support(mut self, supported: bool) -> Self {
        self.supports_hit_test = supported;
        self
    }

    /// Polls between a request and its completion. Clamped to at least one so a
    /// request never resolves inside the frame that issued it.
    pub fn with_latency_frames(mut self, frames: u32) -> Self {
        self.latency_frames = frames.max(1);
        self
    }

    pub fn with_viewer(mut self, viewer: Pose) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn with_surfaces(mut self, surfaces: Vec<SurfaceConfig>) -> Self {
        self.surfaces = surfaces;
        self
    }

    pub fn set_viewer(&mut self, viewer: Pose) {
        self.viewer = viewer;
    }

    pub fn viewer(&self) -> Pose {
        self.viewer
    }

    pub fn fail_reference_space(&mut self, fail: bool) {
        self.fail_reference_space = fail;
    }

    pub fn fail_hit_test_source(&mut self, fail: bool) {
        self.fail_hit_test_source = fail;
    }

    /// Requests stay pending forever.
    pub fn never_resolve(&mut self, never: bool) {
        self.never_resolve = never;
    }

    /// Override the ray cast for the next frame: every viewer-anchored source
    /// reports exactly these poses, in this order.
    #[cfg(test)]
    pub fn script_frame(&mut self, poses: Vec<Pose>) {
        self.scripted.push_back(poses);
    }

    pub fn stats(&self) -> RequestStats {
        self.stats
    }

    #[cfg(test)]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Runtime-initiated end (user left immersive mode from system UI).
    #[cfg(test)]
    pub fn force_end(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session = %session.id, "runtime ended session");
            self.sources.clear();
            self.outbox.push_back(Event::SessionEnded { session: session.id });
        }
    }

    fn alloc_request(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        id
    }

    fn alloc_space(&mut self, kind: ReferenceSpaceKind) -> ReferenceSpace {
        let id = SpaceId(self.next_space);
        self.next_space += 1;
        self.space_types.insert(id, kind.to_openxr());
        ReferenceSpace { id, kind }
    }

    fn schedule(&mut self, request: RequestId, completion: Completion) {
        if self.never_resolve {
            debug!(?request, "request parked forever");
            return;
        }
        self.pending.push(Pending {
            due: self.clock + self.latency_frames as u64,
            request,
            completion,
        });
    }

    /// Ray-plane intersections along the viewer's forward ray, nearest first.
    fn cast(&self) -> Vec<Pose> {
        let origin = self.viewer.position;
        let dir = self.viewer.forward();

        let mut hits: Vec<(f32, Pose)> = self
            .surfaces
            .iter()
            .filter_map(|s| intersect_plane(origin, dir, s))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, pose)| pose).collect()
    }
}

/// Distance and surface-aligned pose (+Y along the normal) of a ray/plane hit.
fn intersect_plane(origin: Vec3, dir: Vec3, surface: &SurfaceConfig) -> Option<(f32, Pose)> {
    let normal = math::normalize(surface.normal);
    let denom = math::dot(normal, dir);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = math::dot(math::sub(surface.point, origin), normal) / denom;
    if t <= 0.0 {
        return None;
    }
    let position = math::add(origin, math::scale(dir, t));
    let orientation = math::quat_from_unit_vectors([0.0, 1.0, 0.0], normal);
    Some((t, Pose::new(position, orientation)))
}

impl XrRuntime for SimulatedRuntime {
    fn supports_feature(&self, feature: XrFeature) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.features.contains(&feature))
    }

    fn request_session(&mut self, init: &SessionInit) -> EngineResult<()> {
        if self.session.is_some() {
            return Err(EngineError::SessionActive);
        }

        let available = |f: &XrFeature| *f != XrFeature::HitTest || self.supports_hit_test;
        if let Some(missing) = init.required_features.iter().find(|f| !available(f)) {
            return Err(EngineError::Unsupported(format!("{missing:?}")));
        }

        let features: HashSet<XrFeature> = [XrFeature::HitTest, XrFeature::LocalFloor, XrFeature::DomOverlay]
            .into_iter()
            .filter(|f| init.requests(*f) && available(f))
            .collect();

        let base_space = self.alloc_space(ReferenceSpaceKind::LocalFloor);
        let id = SessionId::new();
        info!(session = %id, ?features, "simulated session started");

        self.session = Some(SimSession {
            id,
            base_space,
            features,
        });
        self.stats.sessions_started += 1;
        self.outbox.push_back(Event::SessionStarted { session: id });
        Ok(())
    }

    fn end_session(&mut self) -> EngineResult<()> {
        let session = self.session.take().ok_or(EngineError::NoSession)?;
        info!(session = %session.id, "simulated session ending");
        self.sources.clear();
        self.outbox.push_back(Event::SessionEnded { session: session.id });
        Ok(())
    }

    fn poll_events(&mut self, queue: &mut EventQueue) {
        self.clock += 1;

        while let Some(event) = self.outbox.pop_front() {
            queue.push(event);
        }

        let clock = self.clock;
        let (due, waiting): (Vec<Pending>, Vec<Pending>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.due <= clock);
        self.pending = waiting;

        for p in due {
            let event = match p.completion {
                Completion::Space(space) => Event::ReferenceSpaceResolved {
                    request: p.request,
                    space,
                },
                Completion::Source(source) => {
                    // Sources only produce results while their session lives.
                    if self.session.is_some() {
                        self.sources.push(source);
                    }
                    Event::HitTestSourceResolved {
                        request: p.request,
                        source,
                    }
                }
                Completion::Failed(reason) => Event::RequestFailed {
                    request: p.request,
                    reason,
                },
            };
            queue.push(event);
        }
    }

    fn begin_frame(&mut self) -> Option<XrFrame> {
        let session = self.session.as_ref()?;
        let base = session.base_space.id;
        let sid = session.id;

        self.frame_index += 1;
        let poses = match self.scripted.pop_front() {
            Some(poses) => poses,
            None => self.cast(),
        };
        let results: Vec<HitTestResult> =
            poses.into_iter().map(|p| HitTestResult::new(base, p.into())).collect();

        // The cast follows the viewer's ray, so only sources anchored to a
        // VIEW space see it.
        let mut frame = XrFrame::new(sid, self.frame_index);
        for source in &self.sources {
            let from_viewer =
                self.space_types.get(&source.space) == Some(&openxr::ReferenceSpaceType::VIEW);
            let hits = if from_viewer { results.clone() } else { Vec::new() };
            frame = frame.with_results(source.id, hits);
        }
        Some(frame)
    }

    fn base_reference_space(&self) -> Option<ReferenceSpace> {
        self.session.as_ref().map(|s| s.base_space)
    }

    fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> EngineResult<RequestId> {
        if self.session.is_none() {
            return Err(EngineError::NoSession);
        }
        self.stats.reference_space_requests += 1;

        let request = self.alloc_request();
        let completion = if self.fail_reference_space {
            Completion::Failed(format!("reference space {kind:?} not available"))
        } else {
            Completion::Space(self.alloc_space(kind))
        };
        self.schedule(request, completion);
        Ok(request)
    }

    fn request_hit_test_source(&mut self, space: &ReferenceSpace) -> EngineResult<RequestId> {
        if self.session.is_none() {
            return Err(EngineError::NoSession);
        }
        if !self.supports_feature(XrFeature::HitTest) {
            return Err(EngineError::Unsupported("hit-test".into()));
        }
        self.stats.hit_test_source_requests += 1;

        let request = self.alloc_request();
        let completion = if self.fail_hit_test_source {
            Completion::Failed("hit-test source creation failed".into())
        } else {
            let id = HitTestSourceId(self.next_source);
            self.next_source += 1;
            Completion::Source(HitTestSource {
                id,
                space: space.id,
            })
        };
        self.schedule(request, completion);
        Ok(request)
    }

    fn cancel_hit_test_source(&mut self, source: &HitTestSource) {
        self.stats.cancelled_sources += 1;
        self.sources.retain(|s| s.id != source.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall(z: f32) -> SurfaceConfig {
        SurfaceConfig {
            point: [0.0, 0.0, z],
            normal: [0.0, 0.0, 1.0],
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn cast_sorts_nearest_first() {
        let rt = SimulatedRuntime::new()
            .with_viewer(Pose::from_position([0.0, 1.0, 2.0]))
            .with_surfaces(vec![wall(-3.0), wall(0.0)]);

        let hits = rt.cast();
        assert_eq!(hits.len(), 2);
        assert!(approx(hits[0].position, [0.0, 1.0, 0.0]));
        assert!(approx(hits[1].position, [0.0, 1.0, -3.0]));
    }

    #[test]
    fn parallel_and_behind_surfaces_miss() {
        let floor = SurfaceConfig {
            point: [0.0, 0.0, 0.0],
            normal: [0.0, 1.0, 0.0],
        };
        let rt = SimulatedRuntime::new()
            .with_viewer(Pose::from_position([0.0, 1.0, 2.0]))
            .with_surfaces(vec![floor, wall(5.0)]);

        assert!(rt.cast().is_empty());
    }

    #[test]
    fn looking_down_hits_floor_with_up_normal() {
        let cfg = SimulationConfig::default();
        let rt = SimulatedRuntime::from_config(&cfg);

        let hits = rt.cast();
        assert_eq!(hits.len(), 1);
        assert!(approx(hits[0].position, [0.0, 0.0, -1.5]));
        // floor normal is already +Y: identity orientation
        assert!(approx(math::quat_rotate(hits[0].orientation, [0.0, 1.0, 0.0]), [0.0, 1.0, 0.0]));
    }

    #[test]
    fn completions_wait_for_latency() {
        let mut rt = SimulatedRuntime::new().with_latency_frames(3);
        let mut q = EventQueue::new();
        rt.request_session(&SessionInit::default()).unwrap();
        rt.poll_events(&mut q);
        q.take_all();

        rt.request_reference_space(ReferenceSpaceKind::Viewer).unwrap();
        rt.poll_events(&mut q);
        rt.poll_events(&mut q);
        assert!(q.take_all().is_empty());
        rt.poll_events(&mut q);
        assert!(matches!(q.pop(), Some(Event::ReferenceSpaceResolved { .. })));
    }

    fn hit_test_init() -> SessionInit {
        SessionInit {
            required_features: vec![XrFeature::HitTest],
            optional_features: vec![],
        }
    }

    fn resolved_source(rt: &mut SimulatedRuntime, space: &ReferenceSpace) -> HitTestSource {
        let mut q = EventQueue::new();
        rt.request_hit_test_source(space).unwrap();
        rt.poll_events(&mut q);
        q.take_all()
            .into_iter()
            .find_map(|e| match e {
                Event::HitTestSourceResolved { source, .. } => Some(source),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn viewer_source_reports_hits_in_base_space() {
        let mut rt = SimulatedRuntime::new().with_latency_frames(1);
        let mut q = EventQueue::new();
        rt.request_session(&hit_test_init()).unwrap();
        rt.poll_events(&mut q);

        let viewer = rt.alloc_space(ReferenceSpaceKind::Viewer);
        let source = resolved_source(&mut rt, &viewer);
        let base = rt.base_reference_space().unwrap();

        let p = Pose::from_position([0.5, 0.0, -2.0]);
        rt.script_frame(vec![p]);
        let frame = rt.begin_frame().unwrap();
        let hits = frame.hit_test_results(&source);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pose.position.x, 0.5);
        assert_eq!(hits[0].pose.position.z, -2.0);
        assert_eq!(hits[0].get_pose(&base), Some(p));
    }

    #[test]
    fn floor_anchored_source_sees_no_viewer_ray() {
        let mut rt = SimulatedRuntime::new().with_latency_frames(1);
        let mut q = EventQueue::new();
        rt.request_session(&hit_test_init()).unwrap();
        rt.poll_events(&mut q);

        let base = rt.base_reference_space().unwrap();
        let source = resolved_source(&mut rt, &base);

        rt.script_frame(vec![Pose::from_position([0.0, 0.0, -1.0])]);
        let frame = rt.begin_frame().unwrap();
        assert!(frame.hit_test_results(&source).is_empty());
    }

    #[test]
    fn failure_knobs_come_from_config() {
        let cfg = SimulationConfig {
            fail_hit_test_source: true,
            acquisition_latency_frames: 1,
            ..Default::default()
        };
        let mut rt = SimulatedRuntime::from_config(&cfg);
        let mut q = EventQueue::new();
        rt.request_session(&hit_test_init()).unwrap();
        rt.poll_events(&mut q);

        let base = rt.base_reference_space().unwrap();
        rt.request_hit_test_source(&base).unwrap();
        rt.poll_events(&mut q);
        assert!(q.take_all().iter().any(|e| matches!(e, Event::RequestFailed { .. })));
    }

    #[test]
    fn required_unsupported_feature_rejects_session() {
        let mut rt = SimulatedRuntime::new().with_hit_test_support(false);
        let err = rt
            .request_session(&SessionInit {
                required_features: vec![XrFeature::HitTest],
                optional_features: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
        assert!(rt.begin_frame().is_none());
    }

    #[test]
    fn second_session_while_active_is_rejected() {
        let mut rt = SimulatedRuntime::new();
        rt.request_session(&SessionInit::default()).unwrap();
        assert!(matches!(
            rt.request_session(&SessionInit::default()),
            Err(EngineError::SessionActive)
        ));
    }

    #[test]
    fn no_frames_after_end() {
        let mut rt = SimulatedRuntime::new();
        let mut q = EventQueue::new();
        rt.request_session(&SessionInit::default()).unwrap();
        let id = rt.session_id().unwrap();
        assert_eq!(rt.begin_frame().map(|f| f.session), Some(id));

        rt.end_session().unwrap();
        assert!(rt.session_id().is_none());
        assert!(rt.begin_frame().is_none());
        rt.poll_events(&mut q);
        assert!(q.take_all().iter().any(|e| matches!(e, Event::SessionEnded { .. })));
        assert!(matches!(rt.end_session(), Err(EngineError::NoSession)));
    }

    #[test]
    fn requests_without_session_fail() {
        let mut rt = SimulatedRuntime::new();
        assert!(matches!(
            rt.request_reference_space(ReferenceSpaceKind::Viewer),
            Err(EngineError::NoSession)
        ));
    }
}
