use std::time::Duration;

/// One full revolution every 45 seconds, matching a slow showcase spin.
pub const DEFAULT_TURN_SECS: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Rotation state machine for the displayed artwork.
///
/// The angle is in degrees, wraps at 360 and only advances while `Running`.
/// Pausing retains the angle so a resumed spin continues where it left off;
/// starting from `Stopped` begins a new revolution at 0. Advancement is
/// frame-driven through [`Turntable::tick`], so cancelling is as simple as
/// no longer ticking and there is never a dangling callback.
#[derive(Debug, Clone)]
pub struct Turntable {
    state: SpinState,
    angle: f32,
    degrees_per_sec: f32,
}

impl Default for Turntable {
    fn default() -> Self {
        Self::new()
    }
}

impl Turntable {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_TURN_SECS)
    }

    /// A turntable completing one revolution every `turn_secs` seconds,
    /// linear pacing.
    pub fn with_period(turn_secs: f32) -> Self {
        Self {
            state: SpinState::Stopped,
            angle: 0.0,
            degrees_per_sec: 360.0 / turn_secs.max(0.001),
        }
    }

    /// Starts, resumes or pauses the spin. Idempotent: repeating the current
    /// effective state is a no-op and never restarts the revolution.
    pub fn set_spinning(&mut self, on: bool) {
        match (on, self.state) {
            (true, SpinState::Running) | (false, SpinState::Stopped) | (false, SpinState::Paused) => {}
            (true, SpinState::Paused) => self.state = SpinState::Running,
            (true, SpinState::Stopped) => {
                self.angle = 0.0;
                self.state = SpinState::Running;
            }
            (false, SpinState::Running) => self.state = SpinState::Paused,
        }
    }

    /// Cancels the spin outright. The angle is kept; a later
    /// `set_spinning(true)` starts a fresh revolution at 0. Safe to call in
    /// any state.
    pub fn halt(&mut self) {
        self.state = SpinState::Stopped;
    }

    /// Frame advance. Only moves the angle while `Running`.
    pub fn tick(&mut self, dt: Duration) {
        if self.state != SpinState::Running {
            return;
        }
        let dt = dt.as_secs_f32();
        if dt > 0.0 {
            self.angle = (self.angle + self.degrees_per_sec * dt).rem_euclid(360.0);
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.state == SpinState::Running
    }

    pub fn state(&self) -> SpinState {
        self.state
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_retains_angle() {
        let mut spin = Turntable::with_period(36.0); // 10 deg/s
        spin.set_spinning(true);
        spin.tick(Duration::from_secs(2));
        let angle = spin.angle();
        assert!(angle > 0.0);

        spin.set_spinning(false);
        assert_eq!(spin.angle(), angle);
        assert_eq!(spin.state(), SpinState::Paused);

        spin.tick(Duration::from_secs(5));
        assert_eq!(spin.angle(), angle);
    }

    #[test]
    fn resume_continues_from_paused_angle() {
        let mut spin = Turntable::with_period(36.0);
        spin.set_spinning(true);
        spin.tick(Duration::from_secs(3));
        spin.set_spinning(false);
        let paused = spin.angle();

        spin.set_spinning(true);
        assert_eq!(spin.angle(), paused);
        spin.tick(Duration::from_secs(1));
        assert!(spin.angle() > paused);
    }

    #[test]
    fn double_start_does_not_restart() {
        let mut spin = Turntable::with_period(36.0);
        spin.set_spinning(true);
        spin.tick(Duration::from_secs(4));
        let angle = spin.angle();

        spin.set_spinning(true);
        assert_eq!(spin.angle(), angle);
        assert_eq!(spin.state(), SpinState::Running);
    }

    #[test]
    fn start_after_halt_begins_at_zero() {
        let mut spin = Turntable::with_period(36.0);
        spin.set_spinning(true);
        spin.tick(Duration::from_secs(7));
        spin.halt();
        assert_eq!(spin.state(), SpinState::Stopped);

        spin.set_spinning(true);
        assert_eq!(spin.angle(), 0.0);
    }

    #[test]
    fn angle_wraps_at_full_turn() {
        let mut spin = Turntable::with_period(1.0);
        spin.set_spinning(true);
        spin.tick(Duration::from_millis(1500));
        assert!(spin.angle() >= 0.0 && spin.angle() < 360.0);
        assert!((spin.angle() - 180.0).abs() < 0.5);
    }

    #[test]
    fn stopped_turntable_ignores_ticks() {
        let mut spin = Turntable::new();
        spin.tick(Duration::from_secs(10));
        assert_eq!(spin.angle(), 0.0);
    }
}
