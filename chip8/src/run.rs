use std::error::Error;
use std::time::{Duration, Instant};

use log::info;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;

use crate::keymap::keymap;
use chip8_core::constants::TIMER_HZ;
use chip8_core::Chip8;
use chip8_display::Display;

/// How the frame driver paces the interpreter
pub struct Settings {
    /// Size multiplier for each Chip-8 pixel
    pub scale: u32,
    /// CPU cycles run between each 60Hz timer tick
    pub cycles_per_frame: u32,
}

/// Runs `chip8` in an SDL2 window until it halts, errors or the window is closed.
///
/// Each frame:
/// - forwards keyboard events to the keypad
/// - runs `cycles_per_frame` cycles
/// - ticks the timers once
/// - renders the frame buffer if it changed
/// - sleeps off whatever is left of the frame
pub fn run(chip8: &mut Chip8, settings: &Settings) -> Result<(), Box<dyn Error>> {
    // Get SDL2 context
    let sdl: sdl2::Sdl = sdl2::init()?;
    let mut display: Display = Display::new(&sdl, settings.scale)?;
    let mut events = sdl.event_pump()?;
    let keypad = chip8.keypad().clone();

    let frame_time = Duration::from_secs(1) / TIMER_HZ;

    'event: loop {
        let frame_start = Instant::now();

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = keymap(key) {
                        keypad.press(kc);
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(kc) = keymap(key) {
                        keypad.release(kc);
                    }
                }
                // Key ups are not delivered to an unfocused window
                Event::Window {
                    win_event: WindowEvent::FocusLost,
                    ..
                } => keypad.release_all(),
                _ => continue,
            };
        }

        // Update state
        for _ in 0..settings.cycles_per_frame {
            chip8.run_cycle()?;
            if chip8.is_halted() {
                info!("program finished");
                break 'event;
            }
        }
        chip8.tick_timers();

        // If the draw flag is set, unset it and render the current frame
        if let Some(frame) = chip8.take_frame() {
            display.render(&frame)?;
        }

        // Handle timing
        let elapsed = frame_start.elapsed();
        if frame_time > elapsed {
            std::thread::sleep(frame_time - elapsed);
        }
    }

    Ok(())
}
