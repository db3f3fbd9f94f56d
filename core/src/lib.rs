pub use crate::chip8::Chip8;
pub use crate::error::{Chip8Error, Result};
pub use crate::keypad::Keypad;
pub use crate::quirks::Quirks;
pub use crate::state::{FrameBuffer, State, Status};

mod chip8;
pub mod constants;
mod error;
mod instruction;
mod keypad;
mod opcode;
mod operations;
mod quirks;
pub mod state;
