//! GLFW window with an OpenGL 3.3 core context

use std::time::Instant;

use deferred_engine::prelude::*;
use deferred_engine::render::GlBackend;
use glfw::{Action, Context as _, Key, WindowEvent};
use thiserror::Error;

use super::{build_engine, DemoError};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Window creation failed")]
    CreationFailed,
}

/// Longest frame fed to the simulation, so a stall does not fast-forward it
const MAX_FRAME_TIME: f32 = 0.25;

/// Open the window and run the engine until it quits or the window closes
pub fn run(config: ApplicationConfig, screen: &str) -> Result<(), DemoError> {
    let mut glfw = glfw::init(glfw::fail_on_errors)
        .map_err(|e| WindowError::InitializationFailed(format!("{:?}", e)))?;
    glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
    glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
    glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
    glfw.window_hint(glfw::WindowHint::Resizable(true));

    let (width, height) = (config.renderer.width, config.renderer.height);
    let (mut window, events) = glfw
        .create_window(width, height, "Deferred Engine - Screens Demo", glfw::WindowMode::Windowed)
        .ok_or(WindowError::CreationFailed)?;
    window.make_current();
    window.set_key_polling(true);
    window.set_close_polling(true);
    window.set_framebuffer_size_polling(true);
    window.set_cursor_pos_polling(true);
    window.set_mouse_button_polling(true);
    window.set_scroll_polling(true);
    glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

    // SAFETY: the context was just made current on this thread
    #[allow(unsafe_code)]
    let gl = unsafe { glow::Context::from_loader_function(|name| window.get_proc_address(name) as *const _) };
    let mut engine = build_engine(config, Box::new(GlBackend::new(gl)), screen)?;
    log::info!("Window opened at {}x{}", width, height);

    let mut last_frame = Instant::now();
    while engine.is_running() && !window.should_close() {
        glfw.poll_events();
        for (_, event) in glfw::flush_messages(&events) {
            if let Some(event) = translate_event(event) {
                engine.handle_event(event)?;
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32().min(MAX_FRAME_TIME);
        last_frame = now;

        engine.frame(dt)?;
        window.swap_buffers();
    }

    engine.shutdown();
    Ok(())
}

fn translate_event(event: WindowEvent) -> Option<InputEvent> {
    let event = match event {
        WindowEvent::Close => InputEvent::CloseRequested,
        WindowEvent::FramebufferSize(width, height) => InputEvent::Resized {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        },
        WindowEvent::Key(key, _, action, _) => InputEvent::Key {
            key: translate_key(key),
            pressed: action != Action::Release,
        },
        WindowEvent::MouseButton(button, action, _) => InputEvent::MouseButton {
            button: match button {
                glfw::MouseButtonLeft => MouseButton::Left,
                glfw::MouseButtonRight => MouseButton::Right,
                glfw::MouseButtonMiddle => MouseButton::Middle,
                _ => return None,
            },
            pressed: action != Action::Release,
        },
        WindowEvent::CursorPos(x, y) => InputEvent::MouseMoved { x, y },
        WindowEvent::Scroll(_, y) => InputEvent::Scroll { delta: y as f32 },
        _ => return None,
    };
    Some(event)
}

fn translate_key(key: Key) -> KeyCode {
    match key {
        Key::A => KeyCode::A,
        Key::B => KeyCode::B,
        Key::C => KeyCode::C,
        Key::D => KeyCode::D,
        Key::E => KeyCode::E,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::H => KeyCode::H,
        Key::I => KeyCode::I,
        Key::J => KeyCode::J,
        Key::K => KeyCode::K,
        Key::L => KeyCode::L,
        Key::M => KeyCode::M,
        Key::N => KeyCode::N,
        Key::O => KeyCode::O,
        Key::P => KeyCode::P,
        Key::Q => KeyCode::Q,
        Key::R => KeyCode::R,
        Key::S => KeyCode::S,
        Key::T => KeyCode::T,
        Key::U => KeyCode::U,
        Key::V => KeyCode::V,
        Key::W => KeyCode::W,
        Key::X => KeyCode::X,
        Key::Y => KeyCode::Y,
        Key::Z => KeyCode::Z,
        Key::Num0 => KeyCode::Num0,
        Key::Num1 => KeyCode::Num1,
        Key::Num2 => KeyCode::Num2,
        Key::Num3 => KeyCode::Num3,
        Key::Num4 => KeyCode::Num4,
        Key::Num5 => KeyCode::Num5,
        Key::Num6 => KeyCode::Num6,
        Key::Num7 => KeyCode::Num7,
        Key::Num8 => KeyCode::Num8,
        Key::Num9 => KeyCode::Num9,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::Escape => KeyCode::Escape,
        Key::Tab => KeyCode::Tab,
        Key::Backspace => KeyCode::Backspace,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::LeftShift => KeyCode::LeftShift,
        Key::LeftControl => KeyCode::LeftControl,
        Key::F1 => KeyCode::F1,
        Key::F2 => KeyCode::F2,
        Key::F3 => KeyCode::F3,
        Key::F4 => KeyCode::F4,
        _ => KeyCode::Unknown,
    }
}
