mod app_state;
mod config;
mod drawing;
mod stats;

use crate::config::CONFIG;
use geoview::*;
use winit::{
    event::{ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode, WindowEvent},
    event_loop::ControlFlow,
};

fn main() {
    log::set_max_level(CONFIG.general.log_level.to_level_filter());
    pretty_env_logger::init();

    let locations = load_listings(&CONFIG.general.listings)
        .expect("Unable to load the listing file. Please consult the log.");
    log::info!("Loaded {} listings.", locations.len());

    let width = 1280;
    let height = 800;

    let event_loop = winit::event_loop::EventLoop::new();
    let mut painter = drawing::Painter::init(&event_loop, width, height);

    let size = painter.window.inner_size();
    let mut app_state = app_state::AppState::new(
        &locations,
        size.width,
        size.height,
        painter.get_hidpi_factor(),
    );

    let mut mouse_down = false;
    let mut drag_distance = 0.0f32;
    let mut last_pos = (0.0f32, 0.0f32);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Destroyed => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(physical_size) => {
                    app_state.screen.width = physical_size.width;
                    app_state.screen.height = physical_size.height;
                    painter.resize(physical_size.width, physical_size.height);
                }
                WindowEvent::ReceivedCharacter(c) => {
                    if c == '\u{8}' {
                        app_state.search_backspace();
                    } else if !c.is_control() {
                        app_state.search_input(c);
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            virtual_keycode: Some(keycode),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => match keycode {
                    VirtualKeyCode::Escape => {
                        if app_state.autocomplete.is_open() {
                            app_state.autocomplete.dismiss();
                        } else {
                            *control_flow = ControlFlow::Exit;
                        }
                    }
                    VirtualKeyCode::Down => app_state.autocomplete.focus_next(),
                    VirtualKeyCode::Up => app_state.autocomplete.focus_prev(),
                    VirtualKeyCode::Return => app_state.commit_search(),
                    VirtualKeyCode::F1 => app_state.locate_me(),
                    _ => {}
                },
                WindowEvent::MouseInput { state, button, .. } => {
                    if let MouseButton::Left = button {
                        match state {
                            ElementState::Pressed => {
                                mouse_down = true;
                                drag_distance = 0.0;
                            }
                            ElementState::Released => {
                                mouse_down = false;
                                // A short drag is still a click.
                                if drag_distance < 4.0 {
                                    app_state.handle_click(last_pos);
                                }
                            }
                        }
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => match delta {
                    MouseScrollDelta::LineDelta(_, y) => app_state.zoom_by(0.1 * y),
                    MouseScrollDelta::PixelDelta(winit::dpi::LogicalPosition { y, .. }) => {
                        app_state.zoom_by(0.001 * y as f32)
                    }
                },
                WindowEvent::CursorMoved { position, .. } => {
                    let pos = (position.x as f32, position.y as f32);
                    let delta = (pos.0 - last_pos.0, pos.1 - last_pos.1);
                    last_pos = pos;

                    if mouse_down {
                        drag_distance += (delta.0 * delta.0 + delta.1 * delta.1).sqrt();
                        app_state.pan(delta);
                    }
                }
                _ => (),
            },
            Event::MainEventsCleared => {
                app_state.poll_search();
                app_state.theme.update();
                painter.update_shader();
                painter.paint(&mut app_state);

                app_state.stats.capture_frame();
                if CONFIG.general.display_framerate {
                    println!(
                        "Frametime {:.2} at zoom {:.2}",
                        app_state.stats.get_average(),
                        app_state.zoom
                    );
                }
            }
            _ => (),
        }
    });
}
