// main.rs — desktop harness for the orientation controls
//
// Drag to look around, WASD to drive the navigator pad, Shift+arrows for
// orbit key rotation, Enter for the VR play gate, F11 for fullscreen.
// `--simulate-gyro` feeds a slowly swaying synthetic device orientation.

use std::time::Instant;

use glam::Vec2;
use vr_orbit::gate::{NoPlatform, PlayerControl, VrPlayButton};
use vr_orbit::i18n;
use vr_orbit::navigator::AnnotationOptions;
use vr_orbit::{ControlsConfig, ControlsError, SyntheticSensorBus, VrControls};
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

/// Side of the navigator overlay square, anchored top-left.
const PAD_EXTENT: f32 = 102.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ControlsConfig::resolve()?;
    i18n::init(pick_lang(&config));

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(i18n::tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)?;

    let mut vr = VrControls::from_config(&config);
    vr.set_viewport_height(window.inner_size().height as f32);

    let gyro = std::env::args().any(|a| a == "--simulate-gyro").then(|| {
        let bus = SyntheticSensorBus::shared();
        vr.enable_orientation(bus.clone());
        bus
    });

    // seam markers at the quarter turns of a 4096-wide source
    for x in [0.0, 1024.0, 2048.0, 3072.0] {
        vr.add_annotation(x, 1024.0, AnnotationOptions::default());
    }

    let play_button = VrPlayButton::new(&NoPlatform, || log::info!("playback started"));
    log::info!("{} [{}]", play_button.render().label, play_button.render().css_class);

    let started = Instant::now();
    let mut cursor = Vec2::ZERO;
    let mut shift = false;
    let mut is_fullscreen = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    vr.dispose();
                    *control_flow = ControlFlow::Exit;
                }

                WindowEvent::Resized(size) => {
                    vr.set_viewport_height(size.height as f32);
                }

                WindowEvent::ModifiersChanged(m) => {
                    shift = m.shift();
                }

                WindowEvent::KeyboardInput { input, .. } => {
                    let now = Instant::now();
                    let Some(code) = input.virtual_keycode else {
                        return;
                    };
                    match (input.state, code) {
                        (ElementState::Pressed, VirtualKeyCode::Return) => {
                            let report = pollster::block_on(play_button.activate());
                            for (step, outcome) in &report.outcomes {
                                log::debug!("{step}: {outcome:?}");
                            }
                            vr.apply_capabilities(play_button.flags());
                        }
                        (ElementState::Pressed, VirtualKeyCode::F11) => {
                            is_fullscreen = !is_fullscreen;
                            if is_fullscreen {
                                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                            } else {
                                window.set_fullscreen(None);
                            }
                        }
                        (ElementState::Pressed, VirtualKeyCode::Escape) => {
                            vr.dispose();
                            *control_flow = ControlFlow::Exit;
                        }
                        (ElementState::Pressed, code) => {
                            if let Some(key) = key_name(code) {
                                vr.key_down(key, shift, now);
                            }
                        }
                        (ElementState::Released, code) => {
                            if let Some(key) = key_name(code) {
                                vr.key_up(key, now);
                            }
                        }
                    }
                }

                WindowEvent::CursorMoved { position, .. } => {
                    cursor = Vec2::new(position.x as f32, position.y as f32);
                    vr.pointer_move(cursor);
                }

                WindowEvent::CursorLeft { .. } => {
                    vr.pad_pointer_leave(Instant::now());
                    vr.pointer_up();
                }

                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => {
                    let now = Instant::now();
                    match state {
                        ElementState::Pressed => {
                            let on_pad = cursor.x <= PAD_EXTENT && cursor.y <= PAD_EXTENT;
                            if !(on_pad && vr.pad_pointer_down(cursor, now)) {
                                vr.pointer_down(cursor);
                            }
                        }
                        ElementState::Released => {
                            vr.pad_pointer_up(now);
                            vr.pointer_up();
                        }
                    }
                }

                _ => {}
            },

            Event::MainEventsCleared => {
                let now = Instant::now();
                if let Some(bus) = &gyro {
                    let t = now.duration_since(started).as_secs_f32();
                    bus.borrow_mut()
                        .emit_orientation(180.0 + 30.0 * (0.5 * t).sin(), 90.0, 1.0);
                }

                match vr.update(now) {
                    Ok(true) => {
                        let (yaw, pitch) = vr.transform().yaw_pitch_degrees();
                        let mut title = format!(
                            "{} | {}",
                            i18n::tr("app.title"),
                            i18n::tr_with(
                                "status.view",
                                &[
                                    ("yaw", format!("{yaw:.0}")),
                                    ("pitch", format!("{pitch:.0}")),
                                ],
                            )
                        );
                        if let Some(d) = vr.navigator().pan().direction() {
                            title.push_str(" | ");
                            title.push_str(&i18n::tr_with(
                                "status.panning",
                                &[("direction", i18n::tr(d.label_key()))],
                            ));
                        }
                        window.set_title(&title);
                    }
                    Ok(false) => {}
                    Err(ControlsError::Disposed) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("{e}"),
                }
            }

            _ => {}
        }
    });
}

/// CLI/env language wins; the config file's `lang` applies when neither is set.
fn pick_lang(config: &ControlsConfig) -> String {
    let explicit = std::env::args().any(|a| a == "--lang")
        || std::env::var("VR_ORBIT_LANG").map_or(false, |v| !v.trim().is_empty());
    match (&config.lang, explicit) {
        (Some(lang), false) => lang.clone(),
        _ => i18n::resolve_lang_from_args(),
    }
}

fn key_name(code: VirtualKeyCode) -> Option<&'static str> {
    Some(match code {
        VirtualKeyCode::W => "w",
        VirtualKeyCode::A => "a",
        VirtualKeyCode::S => "s",
        VirtualKeyCode::D => "d",
        VirtualKeyCode::Up => "ArrowUp",
        VirtualKeyCode::Down => "ArrowDown",
        VirtualKeyCode::Left => "ArrowLeft",
        VirtualKeyCode::Right => "ArrowRight",
        _ => return None,
    })
}
