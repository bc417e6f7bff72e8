use bevy_ecs::prelude::Resource;

/// Session clock. Advanced once per tick by the shell, before the schedule
/// runs, so every system of a tick sees the same `delta`.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldTime {
    /// Seconds since the session started ticking.
    pub elapsed: f32,
    /// Seconds covered by the current tick.
    pub delta: f32,
    pub ticks: u64,
}

impl WorldTime {
    /// Move the clock forward by `dt` seconds and return the new tick number.
    pub fn advance(&mut self, dt: f32) -> u64 {
        let dt = dt.max(0.0);
        self.delta = dt;
        self.elapsed += dt;
        self.ticks += 1;
        self.ticks
    }
}
