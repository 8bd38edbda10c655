use crate::engine::graphics::FrameStats;
use crate::engine::universe::Universe;
use crate::engine::xr::XrRuntime;

/// Cooperative scheduler: one `tick` per display refresh.
///
/// Everything (runtime completions, input, the frame callback, rendering) runs
/// inside `tick` on the calling thread, in queue order.
pub struct AnimationLoop<'a, R: XrRuntime> {
    universe: &'a mut Universe<R>,
}

impl<'a, R: XrRuntime> AnimationLoop<'a, R> {
    pub fn new(universe: &'a mut Universe<R>) -> Self {
        Self { universe }
    }

    pub fn tick(&mut self) -> FrameStats {
        self.universe.tick()
    }

    /// Run `frames` ticks. `before_tick(index, universe)` may queue input or
    /// steer the runtime; `after_tick(index, universe, stats)` observes the
    /// rendered result.
    pub fn run(
        &mut self,
        frames: u64,
        mut before_tick: impl FnMut(u64, &mut Universe<R>),
        mut after_tick: impl FnMut(u64, &Universe<R>, &FrameStats),
    ) -> FrameStats {
        let mut last = FrameStats::default();
        for i in 0..frames {
            before_tick(i, &mut *self.universe);
            last = self.tick();
            after_tick(i, &*self.universe, &last);
        }
        last
    }
}
