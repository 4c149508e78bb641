// sensor.rs — platform sensor events behind an injectable bus

use std::cell::RefCell;
use std::rc::Rc;

/// One `deviceorientation` sample, in degrees. `None` means the platform did
/// not fill the axis in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceOrientationReading {
    /// Rotation about the device Z axis.
    pub alpha: Option<f32>,
    /// Rotation about the device X axis.
    pub beta: Option<f32>,
    /// Rotation about the device Y axis.
    pub gamma: Option<f32>,
}

impl DeviceOrientationReading {
    pub fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    /// True when every axis is present and non-zero.
    ///
    /// Platforms report all-zero frames before the sensor has warmed up and
    /// some report a lone zero axis while settling; both are dropped.
    pub fn is_usable(&self) -> bool {
        [self.alpha, self.beta, self.gamma]
            .iter()
            .all(|axis| matches!(axis, Some(v) if *v != 0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    DeviceOrientation(DeviceOrientationReading),
    /// Screen rotation in degrees (0, 90, -90, 180).
    ScreenOrientation(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorEventKind {
    DeviceOrientation,
    ScreenOrientation,
}

impl SensorEvent {
    pub fn kind(&self) -> SensorEventKind {
        match self {
            SensorEvent::DeviceOrientation(_) => SensorEventKind::DeviceOrientation,
            SensorEvent::ScreenOrientation(_) => SensorEventKind::ScreenOrientation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub type SensorHandler = Box<dyn FnMut(&SensorEvent)>;

/// Where orientation events come from.
///
/// A platform without motion sensors is simply a bus that never emits.
pub trait SensorBus {
    fn subscribe(&mut self, kind: SensorEventKind, handler: SensorHandler) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
    /// Current screen rotation in degrees.
    fn screen_orientation(&self) -> f32;
}

impl<B: SensorBus + ?Sized> SensorBus for Rc<RefCell<B>> {
    fn subscribe(&mut self, kind: SensorEventKind, handler: SensorHandler) -> Subscription {
        self.borrow_mut().subscribe(kind, handler)
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.borrow_mut().unsubscribe(subscription)
    }

    fn screen_orientation(&self) -> f32 {
        self.borrow().screen_orientation()
    }
}

struct Listener {
    id: Subscription,
    kind: SensorEventKind,
    handler: SensorHandler,
}

/// In-memory bus. Used by tests and by the desktop viewer, which has no
/// gyroscope and feeds simulated samples instead.
#[derive(Default)]
pub struct SyntheticSensorBus {
    listeners: Vec<Listener>,
    next_id: u64,
    screen_orientation: f32,
}

impl SyntheticSensorBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Delivers `event` to every listener of its kind.
    pub fn emit(&mut self, event: SensorEvent) {
        if let SensorEvent::ScreenOrientation(deg) = event {
            self.screen_orientation = deg;
        }
        let kind = event.kind();
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.handler)(&event);
        }
    }

    pub fn emit_orientation(&mut self, alpha: f32, beta: f32, gamma: f32) {
        self.emit(SensorEvent::DeviceOrientation(DeviceOrientationReading::new(
            alpha, beta, gamma,
        )));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl SensorBus for SyntheticSensorBus {
    fn subscribe(&mut self, kind: SensorEventKind, handler: SensorHandler) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, kind, handler });
        id
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.listeners.retain(|l| l.id != subscription);
    }

    fn screen_orientation(&self) -> f32 {
        self.screen_orientation
    }
}
