use tracing::{debug, info, warn};

use crate::engine::assets::{LoadedModel, ModelLoader};
use crate::engine::camera::{OrbitControls, PerspectiveCamera};
use crate::engine::config::AppConfig;
use crate::engine::event_queue::{Event, EventQueue};
use crate::engine::graphics::{FrameStats, Renderer};
use crate::engine::math::Vec3;
use crate::engine::reticle::Reticle;
use crate::engine::scene::{NodeKey, NodeKind, Scene, SceneNode};
use crate::engine::xr::{ActiveSession, ReticleUpdate, XrFrame, XrRuntime};
use crate::engine::EngineResult;

/// Everything the viewer owns: scene, camera, renderer, the XR runtime and the
/// per-session state. One instance per process; built at init, the
/// `ActiveSession` inside it comes and goes with immersive sessions.
pub struct Universe<R: XrRuntime> {
    pub config: AppConfig,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub orbit: OrbitControls,
    pub renderer: Renderer,
    pub reticle: Reticle,

    runtime: R,
    queue: EventQueue,
    session: Option<ActiveSession>,
    model: Option<NodeKey>,
    placements: u32,
}

impl<R: XrRuntime> Universe<R> {
    pub fn new(config: AppConfig, runtime: R) -> Self {
        let mut scene = Scene::new();

        let l = &config.lighting;
        scene.add(SceneNode::new(
            "ambient",
            NodeKind::AmbientLight {
                color: l.ambient_color,
                intensity: l.ambient_intensity,
            },
        ));
        scene.add(
            SceneNode::new(
                "sun",
                NodeKind::DirectionalLight {
                    color: l.directional_color,
                    intensity: l.directional_intensity,
                },
            )
            .with_position(l.directional_position),
        );

        let reticle = Reticle::new(&mut scene, &config.reticle);
        let camera = PerspectiveCamera::from_config(&config.camera, 1.0);
        let orbit = OrbitControls::new(&camera, &config.camera);

        Self {
            config,
            scene,
            camera,
            orbit,
            renderer: Renderer::new(),
            reticle,
            runtime,
            queue: EventQueue::new(),
            session: None,
            model: None,
            placements: 0,
        }
    }

    /// Kick off loading the configured model; the result arrives as an event.
    pub fn load_model(&mut self, loader: &ModelLoader) {
        if let Some(path) = self.config.model_path.clone() {
            loader.load(&path, &mut self.queue);
        }
    }

    pub fn queue_mut(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    #[cfg(test)]
    pub fn model(&self) -> Option<NodeKey> {
        self.model
    }

    pub fn model_position(&self) -> Option<Vec3> {
        self.model.and_then(|k| self.scene.get(k)).map(|n| n.position)
    }

    pub fn placements(&self) -> u32 {
        self.placements
    }

    pub fn reticle_visible(&self) -> bool {
        self.reticle.current_visible(&self.scene)
    }

    /// Enter immersive mode, or leave it if a session is running.
    pub fn toggle_session(&mut self) -> EngineResult<()> {
        if self.session.is_some() {
            info!("leaving immersive session");
            self.runtime.end_session()
        } else {
            info!("requesting immersive session");
            self.runtime.request_session(&self.config.session.session_init())
        }
    }

    /// Pull runtime completions into the queue, then handle everything queued.
    pub fn drain_events(&mut self) {
        self.runtime.poll_events(&mut self.queue);
        for event in self.queue.take_all() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::SessionStarted { session } => {
                if let Some(active) = &self.session {
                    warn!(active = %active.id, new = %session, "session started while another is active");
                    return;
                }
                info!(%session, "immersive session started");
                self.session = Some(ActiveSession::new(session));
                self.orbit.enabled = false;
            }

            Event::SessionEnded { session } => {
                let Some(active) = self.session.take_if(|s| s.id == session) else {
                    debug!(%session, "end for unknown session");
                    return;
                };
                info!(
                    %session,
                    frames = active.frames,
                    acquisitions = active.tracker.acquisitions_started(),
                    "immersive session ended"
                );
                active.end(&mut self.runtime);
                self.reticle.hide(&mut self.scene);
                self.orbit.enabled = true;
            }

            Event::ReferenceSpaceResolved { request, space } => match self.session.as_mut() {
                Some(active) => active.tracker.on_reference_space(&mut self.runtime, request, space),
                None => debug!(?request, "reference space resolved after session end"),
            },

            Event::HitTestSourceResolved { request, source } => match self.session.as_mut() {
                Some(active) => active.tracker.on_hit_test_source(&mut self.runtime, request, source),
                None => {
                    debug!(?request, "hit-test source resolved after session end; cancelling");
                    self.runtime.cancel_hit_test_source(&source);
                }
            },

            Event::RequestFailed { request, reason } => {
                let handled = self
                    .session
                    .as_mut()
                    .is_some_and(|s| s.tracker.on_request_failed(request, &reason));
                if !handled {
                    debug!(?request, "stale request failure: {reason}");
                }
            }

            Event::Select => self.on_select(),

            Event::ToggleSession => {
                if let Err(e) = self.toggle_session() {
                    warn!("session toggle failed: {e}");
                }
            }

            Event::Resize { width, height } => {
                self.camera.set_viewport(width, height);
            }

            Event::Orbit { dx, dy } => self.orbit.rotate(dx, dy),

            Event::ModelLoaded { model } => self.attach_model(model),

            Event::ModelLoadFailed { path, reason } => {
                warn!(path = %path, "continuing without a model: {reason}");
            }
        }
    }

    fn attach_model(&mut self, model: LoadedModel) {
        // One model at a time.
        if let Some(old) = self.model.take() {
            self.scene.remove(old);
        }
        let node = SceneNode::new(
            "model",
            NodeKind::Model {
                source: model.path,
                meshes: model.info.meshes,
            },
        );
        self.model = Some(self.scene.add(node));
    }

    fn on_select(&mut self) {
        let Some(model) = self.model else {
            debug!("select ignored: no model loaded");
            return;
        };
        if let Some(position) = self.reticle.on_select(&mut self.scene, model) {
            info!(?position, "model placed");
            self.placements += 1;
        }
    }

    /// Frame callback body. `frame` is `None` outside an immersive session.
    pub fn on_frame(&mut self, frame: Option<&XrFrame>) -> ReticleUpdate {
        let update = match (frame, self.session.as_mut()) {
            (Some(frame), Some(active)) if frame.session == active.id => {
                active.frames += 1;
                active.tracker.on_frame(&mut self.runtime, frame)
            }
            // Frame for a session we have not heard about yet.
            (Some(_), _) => ReticleUpdate::Unchanged,
            // No XR frame: nothing to aim at.
            (None, _) => ReticleUpdate::Hide,
        };
        self.reticle.apply(&mut self.scene, update);

        if let Some(node) = self.model.and_then(|k| self.scene.get_mut(k)) {
            node.rotation_y -= self.config.spin_speed;
        }

        // Nothing to orbit around until a model is in the scene.
        if self.orbit.enabled && self.model.is_some() {
            self.orbit.update(&mut self.camera);
        }

        update
    }

    pub fn render(&mut self) -> FrameStats {
        self.scene.update_matrices();
        self.renderer.render(&self.scene, &self.camera)
    }

    /// One full tick: events, XR frame, render.
    pub fn tick(&mut self) -> FrameStats {
        self.drain_events();
        let frame = self.runtime.begin_frame();
        self.on_frame(frame.as_ref());
        self.render()
    }
}
