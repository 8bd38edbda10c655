#[cfg(test)]
mod tests {
    use crate::engine::assets::{GlbInfo, LoadedModel};
    use crate::engine::config::AppConfig;
    use crate::engine::event_queue::Event;
    use crate::engine::math::Mat4;
    use crate::engine::universe::Universe;
    use crate::engine::xr::{Pose, ReticleUpdate, SimulatedRuntime, SubscriptionState};

    fn chair() -> LoadedModel {
        LoadedModel {
            path: "chair.glb".into(),
            info: GlbInfo {
                meshes: 1,
                nodes: 1,
                ..Default::default()
            },
        }
    }

    /// Viewer with a model loaded and no surfaces: hits only come from scripts.
    fn viewer(latency: u32) -> Universe<SimulatedRuntime> {
        let rt = SimulatedRuntime::new().with_latency_frames(latency);
        let mut u = Universe::new(AppConfig::default(), rt);
        u.handle_event(Event::ModelLoaded { model: chair() });
        u
    }

    fn start_session(u: &mut Universe<SimulatedRuntime>) {
        u.queue_mut().queue_toggle_session();
        u.tick(); // request
        u.tick(); // SessionStarted handled, first tracked frame
        assert!(u.session().is_some());
    }

    fn tick_until_ready(u: &mut Universe<SimulatedRuntime>) {
        for _ in 0..20 {
            if u.session().is_some_and(|s| s.tracker.is_ready()) {
                return;
            }
            u.tick();
        }
        panic!("hit-test source never became ready");
    }

    #[test]
    fn reticle_hidden_until_source_acquired() {
        let mut u = viewer(6);
        start_session(&mut u);

        while !u.session().unwrap().tracker.is_ready() {
            // scripted hits are ignored until the source exists
            u.runtime_mut().script_frame(vec![Pose::from_position([0.0, 0.0, -1.0])]);
            u.tick();
            if !u.session().unwrap().tracker.is_ready() {
                assert!(!u.reticle_visible());
            }
        }
    }

    #[test]
    fn one_acquisition_per_session() {
        let mut u = viewer(8);
        start_session(&mut u);
        for _ in 0..40 {
            u.tick();
        }

        let stats = u.runtime().stats();
        assert_eq!(stats.reference_space_requests, 1);
        assert_eq!(stats.hit_test_source_requests, 1);
        assert_eq!(u.session().unwrap().tracker.acquisitions_started(), 1);
    }

    #[test]
    fn new_session_reacquires_once() {
        let mut u = viewer(1);
        start_session(&mut u);
        tick_until_ready(&mut u);

        u.queue_mut().queue_toggle_session();
        u.tick(); // end requested
        u.tick(); // SessionEnded handled
        assert!(u.session().is_none());
        assert_eq!(u.runtime().stats().cancelled_sources, 1);
        assert!(!u.reticle_visible());

        start_session(&mut u);
        assert!(matches!(
            u.session().unwrap().tracker.state(),
            SubscriptionState::RequestingSpace { .. }
        ));
        tick_until_ready(&mut u);
        for _ in 0..10 {
            u.tick();
        }

        let stats = u.runtime().stats();
        assert_eq!(stats.sessions_started, 2);
        assert_eq!(stats.reference_space_requests, 2);
        assert_eq!(stats.hit_test_source_requests, 2);
    }

    #[test]
    fn first_result_wins_and_empty_hides() {
        let mut u = viewer(1);
        start_session(&mut u);
        tick_until_ready(&mut u);

        let near = Pose::from_position([0.2, 0.0, -0.8]);
        let far = Pose::from_position([0.0, 0.0, -3.0]);
        u.runtime_mut().script_frame(vec![near, far]);
        u.tick();
        assert!(u.reticle_visible());
        assert_eq!(u.reticle.current_transform(&u.scene), near.to_matrix());
        assert!(u.renderer.is_drawn(u.reticle.node()));

        u.runtime_mut().script_frame(vec![]);
        u.tick();
        assert!(!u.reticle_visible());
        assert!(!u.renderer.is_drawn(u.reticle.node()));
    }

    #[test]
    fn select_places_only_when_visible() {
        let mut u = viewer(1);
        start_session(&mut u);
        tick_until_ready(&mut u);

        // hidden: no-op
        u.runtime_mut().script_frame(vec![]);
        u.tick();
        let before = u.model_position();
        u.queue_mut().queue_select();
        u.runtime_mut().script_frame(vec![]);
        u.tick();
        assert_eq!(u.model_position(), before);
        assert_eq!(u.placements(), 0);

        // visible: exact translation
        let p = Pose::new([1.0, 0.25, -2.0], [0.0, 0.70710677, 0.0, 0.70710677]);
        u.runtime_mut().script_frame(vec![p]);
        u.tick();
        u.queue_mut().queue_select();
        u.runtime_mut().script_frame(vec![p]);
        u.tick();
        assert_eq!(u.model_position(), Some(p.to_matrix().translation()));
        assert_eq!(u.placements(), 1);
    }

    #[test]
    fn frame_select_frame_scenario() {
        let mut u = viewer(1);
        u.queue_mut().queue_toggle_session();
        u.tick();

        // frame 1: session known, no source yet
        u.tick();
        assert!(!u.reticle_visible());

        tick_until_ready(&mut u);

        // frame 2: one hit at P
        let p = Pose::from_position([0.4, 0.0, -1.2]);
        u.runtime_mut().script_frame(vec![p]);
        u.tick();
        assert!(u.reticle_visible());
        assert_eq!(u.reticle.current_transform(&u.scene), p.to_matrix());

        // select: handled before frame 3's tracker update
        u.queue_mut().queue_select();
        u.runtime_mut().script_frame(vec![]);
        u.tick();
        assert_eq!(u.model_position(), Some([0.4, 0.0, -1.2]));

        // frame 3 had zero results
        assert!(!u.reticle_visible());
        u.runtime_mut().script_frame(vec![]);
        u.tick();
        assert_eq!(u.model_position(), Some([0.4, 0.0, -1.2]));
    }

    #[test]
    fn no_frame_force_hides() {
        let mut u = viewer(1);
        u.reticle.update(&mut u.scene, Mat4::from_translation([0.0, 0.0, -1.0]), true);

        assert_eq!(u.on_frame(None), ReticleUpdate::Hide);
        assert!(!u.reticle_visible());
    }

    #[test]
    fn never_resolving_acquisition_stays_hidden() {
        let mut u = viewer(1);
        u.runtime_mut().never_resolve(true);
        start_session(&mut u);

        for _ in 0..30 {
            u.runtime_mut().script_frame(vec![Pose::default()]);
            u.tick();
            assert!(!u.reticle_visible());
        }
        assert!(matches!(
            u.session().unwrap().tracker.state(),
            SubscriptionState::RequestingSpace { .. }
        ));
        assert_eq!(u.runtime().stats().reference_space_requests, 1);
    }

    #[test]
    fn space_resolving_after_session_end_is_dropped() {
        let mut u = viewer(4);
        start_session(&mut u);
        // space request is in flight; end the session before it resolves
        u.queue_mut().queue_toggle_session();
        for _ in 0..12 {
            u.tick();
        }

        assert!(u.session().is_none());
        assert_eq!(u.runtime().stats().hit_test_source_requests, 0);
    }

    #[test]
    fn late_source_after_session_end_is_cancelled() {
        let mut u = viewer(2);
        start_session(&mut u);
        for _ in 0..10 {
            if matches!(
                u.session().unwrap().tracker.state(),
                SubscriptionState::RequestingSource { .. }
            ) {
                break;
            }
            u.tick();
        }

        u.queue_mut().queue_toggle_session();
        for _ in 0..5 {
            u.tick();
        }

        assert!(u.session().is_none());
        let stats = u.runtime().stats();
        assert_eq!(stats.hit_test_source_requests, 1);
        assert_eq!(stats.cancelled_sources, 1);
    }

    #[test]
    fn runtime_ended_session_resets_like_user_exit() {
        let mut u = viewer(1);
        start_session(&mut u);
        tick_until_ready(&mut u);
        u.runtime_mut().script_frame(vec![Pose::default()]);
        u.tick();
        assert!(u.reticle_visible());

        u.runtime_mut().force_end();
        u.tick();
        assert!(u.session().is_none());
        assert!(!u.reticle_visible());
        assert!(u.orbit.enabled);
    }
}
