use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START};
use crate::error::{Chip8Error, Result};
use crate::instruction;
use crate::keypad::Keypad;
use crate::opcode::Opcode;
use crate::operations::Context;
use crate::quirks::Quirks;
use crate::state::{FrameBuffer, State, Status};

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the `keypad` shared with whatever produces input
///  - the last loaded `rom` so that `reset` can restart it
///
/// Supplies interfaces for:
/// - loading roms
/// - advancing the CPU and its timers
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8 {
    state: State,
    keypad: Keypad,
    quirks: Quirks,
    rom: Option<Vec<u8>>,
    rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A Chip8 whose `Cxkk` results are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8 {
            state: State::new(),
            keypad: Keypad::new(),
            quirks: Quirks::default(),
            rom: None,
            rng,
        }
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Load a rom into freshly reset memory at `PROGRAM_START` and point the pc at it
    ///
    /// Nothing is written if the rom doesn't fit.
    ///
    /// # Arguments
    /// * `rom` the raw bytes of a Chip-8 program
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }
        self.state = State::new();
        self.copy_rom(rom);
        self.rom = Some(rom.to_vec());
        info!("loaded {} byte ROM", rom.len());
        Ok(())
    }

    fn copy_rom(&mut self, rom: &[u8]) {
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        self.state.pc = PROGRAM_START;
    }

    /// Restore the state the Chip8 had when it was created, then reload the last rom if any
    ///
    /// The keypad and quirks are left as they are.
    pub fn reset(&mut self) {
        self.state = State::new();
        if let Some(rom) = self.rom.take() {
            self.copy_rom(&rom);
            self.rom = Some(rom);
        }
        debug!("reset to pc {:#05X}", self.state.pc);
    }

    /// A handle onto the keys this Chip8 reads; clone it to press and release keys
    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Returns the FrameBuffer if it changed since it was last taken, clearing the draw flag
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    pub fn frame_dirty(&self) -> bool {
        self.state.draw_flag
    }

    pub fn clear_frame_dirty(&mut self) {
        self.state.draw_flag = false;
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn is_halted(&self) -> bool {
        self.state.status == Status::Halted
    }

    /// Whether a front end should currently be beeping
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// The full machine state, for inspection
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Advances the CPU by a single cycle
    /// - fails if the program has halted
    /// - polls the keypad instead if awaiting a keypress
    /// - otherwise gets and executes the next opcode
    ///
    /// On error the state is left as it was before the cycle.
    pub fn run_cycle(&mut self) -> Result<()> {
        let keys = self.keypad.snapshot();
        match self.state.status {
            Status::Halted => Err(Chip8Error::Halted { pc: self.state.pc }),
            Status::AwaitingKey { register } => {
                if let Some(key) = keys.iter().position(|&pressed| pressed) {
                    debug!("key {:X} pressed into V{:X}", key, register);
                    self.state.v[register as usize] = key as u8;
                    self.state.status = Status::Running;
                }
                Ok(())
            }
            Status::Running => {
                let op = self.get_op()?;
                trace!(
                    "{:04X} v{:02X?} i{:04X} pc{:04X}",
                    op,
                    self.state.v,
                    self.state.i,
                    self.state.pc
                );
                let mut ctx = Context {
                    keys,
                    quirks: self.quirks,
                    rng: &mut self.rng,
                };
                self.state = instruction::execute(op, &self.state, &mut ctx)?;
                Ok(())
            }
        }
    }

    /// Decrements the delay and sound timers, stopping at 0
    /// Meant to be called at 60Hz regardless of how many cycles ran in between
    pub fn tick_timers(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    fn get_op(&self) -> Result<u16> {
        let pc = self.state.pc as usize;
        if pc + 1 >= MEMORY_SIZE {
            return Err(Chip8Error::MemoryOutOfBounds {
                address: (pc + 1).max(MEMORY_SIZE),
            });
        }
        Ok(u16::from_bytes(
            self.state.memory[pc],
            self.state.memory[pc + 1],
        ))
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
