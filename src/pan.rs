// pan.rs — continuous directional panning from buttons, touch and keys

use crate::orbit::RotateCamera;
use glam::Vec2;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// One degree per tick.
pub const PAN_INCREMENT: f32 = TAU / 360.0;
pub const PAN_PERIOD: Duration = Duration::from_millis(10);
/// Longest backlog a stalled frame may replay; anything older is dropped.
pub const MAX_CATCH_UP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PanDirection {
    pub const ALL: [PanDirection; 4] = [
        PanDirection::Up,
        PanDirection::Right,
        PanDirection::Down,
        PanDirection::Left,
    ];

    /// WASD mapping.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "w" | "W" => Some(Self::Up),
            "a" | "A" => Some(Self::Left),
            "s" | "S" => Some(Self::Down),
            "d" | "D" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// Localization key of the button label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }

    /// Queues one step of `angle` radians in this direction.
    pub fn apply<C: RotateCamera + ?Sized>(self, camera: &mut C, angle: f32) {
        match self {
            Self::Up => camera.rotate_up(-angle),
            Self::Down => camera.rotate_up(angle),
            Self::Left => camera.rotate_left(-angle),
            Self::Right => camera.rotate_left(angle),
        }
    }
}

/// Picks the pan direction for a pointer on a round control.
///
/// The surface is split into four 90° sectors centred on up, right, down and
/// left (screen coordinates, y down). Sectors are half-open going clockwise,
/// so an exact diagonal belongs to the sector clockwise of it: 45° is right,
/// 135° down, 225° left, 315° up. Returns `None` at the centre.
pub fn direction_at(pointer: Vec2, center: Vec2) -> Option<PanDirection> {
    let d = pointer - center;
    let up = -d.y;
    if d == Vec2::ZERO {
        return None;
    }

    if up > d.x.abs() || (up > 0.0 && up == -d.x) {
        Some(PanDirection::Up)
    } else if d.x > d.y.abs() || (d.x > 0.0 && d.x == up) {
        Some(PanDirection::Right)
    } else if d.y > d.x.abs() || (d.y > 0.0 && d.y == d.x) {
        Some(PanDirection::Down)
    } else {
        Some(PanDirection::Left)
    }
}

/// Clockwise angle from up, in degrees within `[0, 360)`.
pub fn pointer_angle(pointer: Vec2, center: Vec2) -> f32 {
    let d = pointer - center;
    d.x.atan2(-d.y).to_degrees().rem_euclid(360.0)
}

/// Repeating timer owned by whoever started it. Time is supplied by the caller
/// so the schedule can be driven from a frame loop or a test.
#[derive(Debug, Clone)]
pub struct RepeatingTask {
    period: Duration,
    next_due: Instant,
}

impl RepeatingTask {
    pub fn start(now: Instant, period: Duration) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of periods that elapsed up to `now`; moves the schedule past them.
    ///
    /// At most [`MAX_CATCH_UP`] worth of ticks fire at once. After a longer
    /// stall the schedule restarts from `now`.
    pub fn due(&mut self, now: Instant) -> u32 {
        if now < self.next_due {
            return 0;
        }
        let period = self.period.as_nanos().max(1);
        let late = now.duration_since(self.next_due).as_nanos();
        let elapsed = (late / period).saturating_add(1);
        let cap = (MAX_CATCH_UP.as_nanos() / period).max(1);

        if elapsed > cap {
            self.next_due = now + self.period;
            return u32::try_from(cap).unwrap_or(u32::MAX);
        }
        let ticks = u32::try_from(elapsed).unwrap_or(u32::MAX);
        self.next_due += self.period * ticks;
        ticks
    }
}

#[derive(Debug, Clone)]
pub enum PanState {
    Idle,
    Panning {
        direction: PanDirection,
        task: RepeatingTask,
    },
}

/// User intents that drive [`PanController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanInput<'a> {
    Press(PanDirection),
    TouchStart(PanDirection),
    Release,
    TouchEnd,
    /// Pointer left the control surface.
    PointerLeave,
    KeyDown(&'a str),
    KeyUp(&'a str),
}

/// Idle / Panning(direction) machine. At most one direction ticks at a time;
/// starting a new pan always ends the previous one first.
#[derive(Debug)]
pub struct PanController {
    state: PanState,
    increment: f32,
    period: Duration,
}

impl Default for PanController {
    fn default() -> Self {
        Self::new(PAN_INCREMENT, PAN_PERIOD)
    }
}

impl PanController {
    pub fn new(increment: f32, period: Duration) -> Self {
        Self {
            state: PanState::Idle,
            increment,
            period: period.max(Duration::from_micros(100)),
        }
    }

    pub fn state(&self) -> &PanState {
        &self.state
    }

    pub fn direction(&self) -> Option<PanDirection> {
        match &self.state {
            PanState::Idle => None,
            PanState::Panning { direction, .. } => Some(*direction),
        }
    }

    /// Live repeating tasks; never more than one.
    pub fn active_timers(&self) -> usize {
        match self.state {
            PanState::Idle => 0,
            PanState::Panning { .. } => 1,
        }
    }

    pub fn increment(&self) -> f32 {
        self.increment
    }

    pub fn start(&mut self, direction: PanDirection, now: Instant) {
        self.stop();
        log::trace!("pan start {:?}", direction);
        self.state = PanState::Panning {
            direction,
            task: RepeatingTask::start(now, self.period),
        };
    }

    /// Cancels the running pan, returning its direction.
    pub fn stop(&mut self) -> Option<PanDirection> {
        let previous = self.direction();
        self.state = PanState::Idle;
        previous
    }

    /// Feeds one input. Returns true if the input was a pan input.
    pub fn handle(&mut self, input: PanInput<'_>, now: Instant) -> bool {
        match input {
            PanInput::Press(d) | PanInput::TouchStart(d) => {
                self.start(d, now);
                true
            }
            PanInput::Release | PanInput::TouchEnd | PanInput::PointerLeave => {
                self.stop();
                true
            }
            PanInput::KeyDown(key) => match PanDirection::from_key(key) {
                Some(d) => {
                    // key repeat while held: keep the running schedule
                    if self.direction() != Some(d) {
                        self.start(d, now);
                    }
                    true
                }
                None => false,
            },
            // any key release ends the pan, including the release of a key
            // other than the one that started it
            PanInput::KeyUp(_) => self.stop().is_some(),
        }
    }

    /// Fires every tick due by `now` onto `camera`. Returns the tick count.
    pub fn advance<C: RotateCamera + ?Sized>(&mut self, now: Instant, camera: &mut C) -> u32 {
        let PanState::Panning { direction, task } = &mut self.state else {
            return 0;
        };
        let ticks = task.due(now);
        for _ in 0..ticks {
            direction.apply(camera, self.increment);
        }
        ticks
    }
}
