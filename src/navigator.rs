// navigator.rs — on-screen navigator: view slice, pan pad and annotations

use crate::i18n;
use crate::orbit::RotateCamera;
use crate::pan::{direction_at, PanController, PanDirection, PanInput};
use glam::Vec2;
use serde::Deserialize;
use std::time::Instant;

/// Layout of the round navigator widget, in overlay pixels.
///
/// The ring radii and angle offset are presentation constants tied to a
/// particular overlay drawing, so they are all configurable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorGeometry {
    pub center: [f32; 2],
    /// Pointer hits further out than this are not on the pan pad.
    pub surface_radius: f32,
    /// Ring radius for annotations at the top row of the video.
    pub radius_min: f32,
    /// Ring radius for annotations at the bottom row of the video.
    pub radius_max: f32,
    /// Added to every annotation angle, degrees clockwise from up.
    pub angle_offset_deg: f32,
    pub video_width: f32,
    pub video_height: f32,
}

impl Default for NavigatorGeometry {
    fn default() -> Self {
        Self {
            center: [51.0, 51.0],
            surface_radius: 51.0,
            radius_min: 18.0,
            radius_max: 40.0,
            angle_offset_deg: 0.0,
            video_width: 4096.0,
            video_height: 2048.0,
        }
    }
}

impl NavigatorGeometry {
    pub fn center(&self) -> Vec2 {
        Vec2::from(self.center)
    }

    /// Maps a source-video pixel to (angle in degrees, ring radius).
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let u = if self.video_width > 0.0 { x / self.video_width } else { 0.0 };
        let v = if self.video_height > 0.0 {
            (y / self.video_height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let angle = (u * 360.0 + self.angle_offset_deg).rem_euclid(360.0);
        let radius = self.radius_min + v * (self.radius_max - self.radius_min);
        (angle, radius)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationOptions {
    /// Any CSS colour; the overlay's default when unset.
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationId(u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Pixel in the source video.
    pub source: Vec2,
    pub angle_deg: f32,
    pub radius: f32,
    /// Marker centre in overlay pixels.
    pub position: Vec2,
    pub background_color: Option<String>,
}

pub struct Navigator {
    geometry: NavigatorGeometry,
    pan: PanController,
    annotations: Vec<Annotation>,
    next_id: u32,
    slice_rotation_deg: f32,
}

impl Navigator {
    pub fn new(geometry: NavigatorGeometry, pan: PanController) -> Self {
        Self {
            geometry,
            pan,
            annotations: Vec::new(),
            next_id: 0,
            slice_rotation_deg: 45.0,
        }
    }

    pub fn geometry(&self) -> &NavigatorGeometry {
        &self.geometry
    }

    pub fn pan(&self) -> &PanController {
        &self.pan
    }

    /// Localized button labels in pad order.
    pub fn labels(&self) -> Vec<(PanDirection, String)> {
        PanDirection::ALL
            .iter()
            .map(|d| (*d, i18n::tr(d.label_key())))
            .collect()
    }

    pub fn pan_start(&mut self, direction: PanDirection, now: Instant) {
        self.pan.start(direction, now);
    }

    pub fn pan_end(&mut self) {
        self.pan.stop();
    }

    /// Press on the pad. Returns true if it started a pan.
    pub fn pointer_down(&mut self, position: Vec2, now: Instant) -> bool {
        let center = self.geometry.center();
        if position.distance(center) > self.geometry.surface_radius {
            return false;
        }
        match direction_at(position, center) {
            Some(d) => self.pan.handle(PanInput::Press(d), now),
            None => false,
        }
    }

    pub fn pointer_up(&mut self, now: Instant) {
        self.pan.handle(PanInput::Release, now);
    }

    pub fn pointer_leave(&mut self, now: Instant) {
        self.pan.handle(PanInput::PointerLeave, now);
    }

    pub fn touch_start(&mut self, direction: PanDirection, now: Instant) {
        self.pan.handle(PanInput::TouchStart(direction), now);
    }

    pub fn touch_end(&mut self, now: Instant) {
        self.pan.handle(PanInput::TouchEnd, now);
    }

    /// WASD on the player. Returns true if the key drives the pad.
    pub fn key_down(&mut self, key: &str, now: Instant) -> bool {
        self.pan.handle(PanInput::KeyDown(key), now)
    }

    pub fn key_up(&mut self, key: &str, now: Instant) -> bool {
        self.pan.handle(PanInput::KeyUp(key), now)
    }

    /// Fires due pan ticks onto `camera`.
    pub fn advance<C: RotateCamera + ?Sized>(&mut self, now: Instant, camera: &mut C) -> u32 {
        self.pan.advance(now, camera)
    }

    /// Points the view slice at the orbit's azimuth (radians).
    pub fn sync_azimuth(&mut self, azimuth: f32) {
        self.slice_rotation_deg = 45.0 - azimuth.to_degrees();
    }

    /// CSS-style rotation of the quarter slice, degrees.
    pub fn slice_rotation_deg(&self) -> f32 {
        self.slice_rotation_deg
    }

    /// Places a marker for source-video pixel (`x`, `y`) on the ring.
    pub fn add_annotation(&mut self, x: f32, y: f32, options: AnnotationOptions) -> &Annotation {
        let (angle_deg, radius) = self.geometry.project(x, y);
        let rad = angle_deg.to_radians();
        let position = self.geometry.center() + Vec2::new(rad.sin(), -rad.cos()) * radius;

        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.annotations.push(Annotation {
            id,
            source: Vec2::new(x, y),
            angle_deg,
            radius,
            position,
            background_color: options.background_color,
        });
        &self.annotations[self.annotations.len() - 1]
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    pub fn dispose(&mut self) {
        self.pan.stop();
        self.annotations.clear();
    }
}
