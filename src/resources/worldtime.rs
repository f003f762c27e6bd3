use bevy_ecs::prelude::Resource;

/// Fixed frame length the headless driver runs at.
pub const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Resource, Clone, Copy)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    /// Frames started so far; the first frame is 1.
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// True on every `interval`-th frame. An interval of 0 never fires.
    pub fn every(&self, interval: u32) -> bool {
        interval > 0 && self.frame_count % interval as u64 == 0
    }
}
