use std::ops::Range;

use log::debug;
use rand::RngCore;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, GLYPH_SIZE, KEY_COUNT, MEMORY_SIZE, STACK_SIZE,
};
use crate::error::{Chip8Error, Result};
use crate::instruction::Decoded;
use crate::opcode::Opcode;
use crate::quirks::Quirks;
use crate::state::{State, Status};

/// Everything an operation may read besides the CPU state itself
pub struct Context<'a> {
    /// Pressed status of keys 0..F, captured at the start of the cycle
    pub keys: [bool; KEY_COUNT],
    pub quirks: Quirks,
    pub rng: &'a mut dyn RngCore,
}

/// The signature shared by every instruction.
///
/// Operations never advance the pc past themselves; the dispatcher adds 2 after each one.
/// Skips add a further 2 and jumps store `target - 2`.
pub type Operation = fn(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State>;

/// The pc value that lands on `target` once the dispatcher steps past the current opcode
fn jump_target(target: u16) -> u16 {
    target.wrapping_sub(0x2)
}

fn skip_if(cond: bool, state: &State) -> u16 {
    if cond {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    }
}

/// The span of memory `start..start + len`, or the first address that falls outside of it
fn mem_range(start: u16, len: usize) -> Result<Range<usize>> {
    let start = start as usize;
    if start + len > MEMORY_SIZE {
        return Err(Chip8Error::MemoryOutOfBounds {
            address: start.max(MEMORY_SIZE),
        });
    }
    Ok(start..start + len)
}

/// end of program
pub fn halt(_op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    debug!("reached end of program at {:#05X}", state.pc);
    Ok(State {
        status: Status::Halted,
        ..*state
    })
}

/// clear
pub fn clr(_op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*state
    })
}

/// PC = STACK.pop()
pub fn rts(_op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    if state.sp == 0 {
        return Err(Chip8Error::StackUnderflow { pc: state.pc });
    }
    let sp = state.sp - 0x1;
    // The popped address is the call itself, which the dispatcher then steps over
    Ok(State {
        pc: state.stack[sp as usize],
        sp,
        ..*state
    })
}

/// PC = addr
pub fn jump(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        pc: jump_target(op.opcode.addr()),
        ..*state
    })
}

/// STACK.push(PC); PC = addr
pub fn call(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    if state.sp as usize >= STACK_SIZE {
        return Err(Chip8Error::StackOverflow { pc: state.pc });
    }
    let mut stack = state.stack;
    stack[state.sp as usize] = state.pc;
    Ok(State {
        pc: jump_target(op.opcode.addr()),
        sp: state.sp + 0x1,
        stack,
        ..*state
    })
}

/// if Vx == kk then pc += 2
pub fn ske(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let pc = skip_if(state.v[op.x] == op.opcode.kk(), state);
    Ok(State { pc, ..*state })
}

/// if Vx != kk then pc += 2
pub fn skne(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let pc = skip_if(state.v[op.x] != op.opcode.kk(), state);
    Ok(State { pc, ..*state })
}

/// if Vx == Vy then pc += 2
pub fn skre(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let pc = skip_if(state.v[op.x] == state.v[op.y], state);
    Ok(State { pc, ..*state })
}

/// Vx = kk
pub fn load(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] = op.opcode.kk();
    Ok(State { v, ..*state })
}

/// Vx += kk
/// Add kk to Vx; allow for overflow but implicitly drop it
pub fn add(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] = v[op.x].wrapping_add(op.opcode.kk());
    Ok(State { v, ..*state })
}

/// Vx = Vy
pub fn mv(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] = v[op.y];
    Ok(State { v, ..*state })
}

/// Vx |= Vy
pub fn or(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] |= v[op.y];
    Ok(State { v, ..*state })
}

/// Vx &= Vy
pub fn and(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] &= v[op.y];
    Ok(State { v, ..*state })
}

/// Vx ^= Vy
pub fn xor(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] ^= v[op.y];
    Ok(State { v, ..*state })
}

// The flag producing operations below write VF after the result so that VF wins when it is
// also the destination.

/// Vx += Vy; VF = overflow
pub fn addr(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let (res, over) = state.v[op.x].overflowing_add(state.v[op.y]);
    let mut v = state.v;
    v[op.x] = res;
    v[0xF] = u8::from(over);
    Ok(State { v, ..*state })
}

/// Vx -= Vy; VF = !underflow
pub fn sub(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let (res, under) = state.v[op.x].overflowing_sub(state.v[op.y]);
    let mut v = state.v;
    v[op.x] = res;
    v[0xF] = u8::from(!under);
    Ok(State { v, ..*state })
}

/// The register the shift operations read from
fn shift_source(op: &Decoded, quirks: Quirks) -> usize {
    if quirks.shift_uses_vy {
        op.y
    } else {
        op.x
    }
}

/// Vx = Vy >> 1; VF = lsb
pub fn shr(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let src = state.v[shift_source(op, ctx.quirks)];
    let mut v = state.v;
    v[op.x] = src >> 1;
    v[0xF] = src & 0x1;
    Ok(State { v, ..*state })
}

/// Vx = Vy - Vx; VF = !underflow
pub fn subn(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let (res, under) = state.v[op.y].overflowing_sub(state.v[op.x]);
    let mut v = state.v;
    v[op.x] = res;
    v[0xF] = u8::from(!under);
    Ok(State { v, ..*state })
}

/// Vx = Vy << 1; VF = msb
pub fn shl(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let src = state.v[shift_source(op, ctx.quirks)];
    let mut v = state.v;
    v[op.x] = src << 1;
    v[0xF] = src >> 7;
    Ok(State { v, ..*state })
}

/// if Vx != Vy then pc +=2
pub fn skrne(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let pc = skip_if(state.v[op.x] != state.v[op.y], state);
    Ok(State { pc, ..*state })
}

/// I = addr
pub fn loadi(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        i: op.opcode.addr(),
        ..*state
    })
}

/// PC = V0 + addr
pub fn jumpi(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        pc: jump_target(u16::from(state.v[0x0]) + op.opcode.addr()),
        ..*state
    })
}

/// Vx = rand_byte & kk
pub fn rand(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let mut rand_byte = [0u8; 1];
    ctx.rng.fill_bytes(&mut rand_byte);
    let mut v = state.v;
    v[op.x] = rand_byte[0] & op.opcode.kk();
    Ok(State { v, ..*state })
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n onto the FrameBuffer at Vx, Vy.
/// The starting position wraps around the screen but the sprite itself is clipped at the edges.
/// Sets VF if any pixels are erased
pub fn draw(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let sprite = &state.memory[mem_range(state.i, op.opcode.n() as usize)?];
    let x0 = state.v[op.x] as usize % DISPLAY_WIDTH;
    let y0 = state.v[op.y] as usize % DISPLAY_HEIGHT;

    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;

    // Reset the carry flag (used for collision detection)
    v[0xF] = 0x0;

    for (row, byte) in sprite.iter().enumerate() {
        let y = y0 + row;
        if y >= DISPLAY_HEIGHT {
            break;
        }
        for bit in 0..8 {
            let x = x0 + bit;
            if x >= DISPLAY_WIDTH {
                break;
            }
            if (byte >> (7 - bit)) & 0x1 == 0x1 {
                let pixel = &mut frame_buffer[y][x];
                if *pixel {
                    v[0xF] = 0x1;
                }
                *pixel = !*pixel;
            }
        }
    }

    Ok(State {
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    })
}

fn key_in(keys: &[bool; KEY_COUNT], key: u8) -> bool {
    keys.get(key as usize).copied().unwrap_or(false)
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let pc = skip_if(key_in(&ctx.keys, state.v[op.x]), state);
    Ok(State { pc, ..*state })
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let pc = skip_if(!key_in(&ctx.keys, state.v[op.x]), state);
    Ok(State { pc, ..*state })
}

/// Vx = DT
pub fn moved(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[op.x] = state.delay_timer;
    Ok(State { v, ..*state })
}

/// await keypress for Vx
/// Takes the lowest pressed key straight away, otherwise parks the CPU until one is pressed
pub fn keyd(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    match ctx.keys.iter().position(|&pressed| pressed) {
        Some(key) => {
            let mut v = state.v;
            v[op.x] = key as u8;
            Ok(State { v, ..*state })
        }
        None => {
            debug!("waiting on a key press for V{:X}", op.x);
            Ok(State {
                status: Status::AwaitingKey {
                    register: op.x as u8,
                },
                ..*state
            })
        }
    }
}

/// DT = Vx
pub fn loads(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        delay_timer: state.v[op.x],
        ..*state
    })
}

/// ST = Vx
pub fn ld(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        sound_timer: state.v[op.x],
        ..*state
    })
}

/// I += Vx
pub fn addi(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        i: state.i.wrapping_add(u16::from(state.v[op.x])),
        ..*state
    })
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    Ok(State {
        i: u16::from(state.v[op.x]) * GLYPH_SIZE,
        ..*state
    })
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(op: &Decoded, state: &State, _ctx: &mut Context) -> Result<State> {
    let vx = state.v[op.x];
    let bcd = [vx / 100, vx / 10 % 10, vx % 10];
    let mut memory = state.memory;
    memory[mem_range(state.i, bcd.len())?].copy_from_slice(&bcd);
    Ok(State { memory, ..*state })
}

/// The value of I after V0..=Vx has been moved to or from memory
fn index_after_transfer(op: &Decoded, state: &State, quirks: Quirks) -> u16 {
    if quirks.load_store_advances_index {
        state.i.wrapping_add(op.x as u16 + 1)
    } else {
        state.i
    }
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
pub fn stor(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let mut memory = state.memory;
    memory[mem_range(state.i, op.x + 1)?].copy_from_slice(&state.v[..=op.x]);
    Ok(State {
        i: index_after_transfer(op, state, ctx.quirks),
        memory,
        ..*state
    })
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
pub fn read(op: &Decoded, state: &State, ctx: &mut Context) -> Result<State> {
    let mut v = state.v;
    v[..=op.x].copy_from_slice(&state.memory[mem_range(state.i, op.x + 1)?]);
    Ok(State {
        i: index_after_transfer(op, state, ctx.quirks),
        v,
        ..*state
    })
}
