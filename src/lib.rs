//! Orientation controls for 360° and VR video.
//!
//! A spherical orbit camera owns the view; device-orientation readings and the
//! on-screen navigator both feed it rotation deltas instead of writing the
//! camera directly, so every input source composes.

pub mod angle;
pub mod config;
pub mod controls;
pub mod device_orientation;
pub mod error;
pub mod fusion;
pub mod gate;
pub mod i18n;
pub mod navigator;
pub mod orbit;
pub mod pan;
pub mod projection;
pub mod sensor;

pub use angle::{quat_to_angle, OrientationAngle};
pub use config::ControlsConfig;
pub use controls::VrControls;
pub use device_orientation::{DeviceOrientationSource, OrientationProvider, OrientationUpdate};
pub use error::{ConfigError, ControlsError};
pub use fusion::{OrbitOrientationControls, OrientationFusion};
pub use gate::{ActivationPipeline, VrPlayButton};
pub use navigator::{AnnotationOptions, Navigator};
pub use orbit::{OrbitController, RotateCamera};
pub use pan::{PanController, PanDirection};
pub use projection::Projection;
pub use sensor::{SensorBus, SensorEvent, SyntheticSensorBus};
