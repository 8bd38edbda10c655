//! Scripted run against the simulated runtime, for demos and smoke checks.

use serde::Serialize;

use crate::engine::animation_loop::AnimationLoop;
use crate::engine::graphics::FrameStats;
use crate::engine::math::{self, Vec3};
use crate::engine::universe::Universe;
use crate::engine::xr::{Pose, SimulatedRuntime, SubscriptionState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessSummary {
    pub frames: u64,
    pub session_active: bool,
    pub hit_test: &'static str,
    pub reticle_visible_frames: u64,
    /// Shaded colour of the reticle the last time it was drawn.
    pub reticle_color: Option<[f32; 4]>,
    pub placements: u32,
    pub model_position: Option<Vec3>,
    pub sessions_started: u32,
    pub reference_space_requests: u32,
    pub hit_test_source_requests: u32,
    pub cancelled_sources: u32,
    pub last_frame: FrameStats,
}

fn state_name(state: &SubscriptionState) -> &'static str {
    match state {
        SubscriptionState::NotRequested => "not-requested",
        SubscriptionState::RequestingSpace { .. } | SubscriptionState::RequestingSource { .. } => {
            "requesting"
        }
        SubscriptionState::Ready { .. } => "ready",
        SubscriptionState::Unavailable => "unavailable",
    }
}

/// Enter a session on the first tick, optionally sweep the viewer and fire a
/// select, then report what happened.
pub fn run(
    universe: &mut Universe<SimulatedRuntime>,
    frames: u64,
    select_at: Option<u64>,
    sweep_degrees: f32,
) -> HeadlessSummary {
    universe.queue_mut().queue_toggle_session();

    let start = universe.runtime().viewer();
    let step = math::quat_from_axis_angle([0.0, 1.0, 0.0], sweep_degrees.to_radians());
    let mut yaw = math::QUAT_IDENTITY;

    let mut visible_frames = 0;
    let mut reticle_color = None;

    let last_frame = AnimationLoop::new(universe).run(
        frames,
        |i, u| {
            if sweep_degrees != 0.0 {
                yaw = math::quat_mul(step, yaw);
                u.runtime_mut()
                    .set_viewer(Pose::new(start.position, math::quat_mul(yaw, start.orientation)));
            }
            if select_at == Some(i) {
                u.queue_mut().queue_select();
            }
        },
        |_, u, _| {
            if u.reticle_visible() {
                visible_frames += 1;
            }
            if let Some(color) = u.renderer.drawn_color(u.reticle.node()) {
                reticle_color = Some(color);
            }
        },
    );

    let hit_test = universe
        .session()
        .map(|s| state_name(s.tracker.state()))
        .unwrap_or("no-session");
    let stats = universe.runtime().stats();

    HeadlessSummary {
        frames,
        session_active: universe.session().is_some(),
        hit_test,
        reticle_visible_frames: visible_frames,
        reticle_color,
        placements: universe.placements(),
        model_position: universe.model_position(),
        sessions_started: stats.sessions_started,
        reference_space_requests: stats.reference_space_requests,
        hit_test_source_requests: stats.hit_test_source_requests,
        cancelled_sources: stats.cancelled_sources,
        last_frame,
    }
}
