use thiserror::Error;

/// Everything that can abort loading a ROM or executing a cycle.
///
/// None of these are recoverable from inside the interpreter; the state is left as it was
/// before the failing call and the caller decides whether to stop or carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("unknown opcode {opcode:#06X} at {pc:#05X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("stack overflow: call at {pc:#05X} with a full call stack")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("interpreter halted at {pc:#05X}")]
    Halted { pc: u16 },
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
