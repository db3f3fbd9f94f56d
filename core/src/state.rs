use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, MEMORY_SIZE, SPRITE_SHEET, STACK_SIZE};

/// The FrameBuffer is indexed as [y][x]; `true` is a lit pixel
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// What the CPU does with its next cycle
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// Fetching and executing opcodes
    Running,
    /// Blocked on `Fx0A` until some key is pressed, which is then written to `register`
    AwaitingKey { register: u8 },
    /// Hit the `0x0000` end of program marker; no further cycles may run
    Halted,
}

/// A snapshot of the Chip8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the number of return addresses on the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented at 60Hz while above 0
///
/// ## Memory
/// - 16 entry stack
///     - stores return addresses when subroutines are called
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet
///     - ROMs are loaded from 0x200
/// - 32x64 frame buffer
///     - stores the contents of the next frame to be drawn
///     - `draw_flag` is set whenever it changes
#[derive(Copy, Clone, Debug)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub status: Status,
}

impl State {
    pub fn new() -> Self {
        // 0x000 - 0x050 is reserved for the sprite sheet
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: 0,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            status: Status::Running,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
