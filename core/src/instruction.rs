use crate::error::{Chip8Error, Result};
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// An opcode along with the fields every instruction family needs, pulled out once per cycle
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub opcode: u16,
    /// Address the opcode was fetched from
    pub pc: u16,
    pub selector: u8,
    /// Index of Vx
    pub x: usize,
    /// Index of Vy
    pub y: usize,
}

impl Decoded {
    pub fn new(opcode: u16, pc: u16) -> Self {
        Decoded {
            opcode,
            pc,
            selector: opcode.selector(),
            x: opcode.x() as usize,
            y: opcode.y() as usize,
        }
    }

    fn unknown(&self) -> Chip8Error {
        Chip8Error::UnknownOpcode {
            opcode: self.opcode,
            pc: self.pc,
        }
    }
}

/// Selects the correct Operation for a decoded opcode.
///
/// Families 0x0, 0xE and 0xF are told apart by their low byte and family 0x8 by its low
/// nibble; every other family maps to a single operation.
pub fn from_op(op: &Decoded) -> Result<Operation> {
    let operation: Operation = match op.selector {
        0x0 => match op.opcode.kk() {
            0x00 => halt,
            0xE0 => clr,
            0xEE => rts,
            _ => return Err(op.unknown()),
        },
        0x1 => jump,
        0x2 => call,
        0x3 => ske,
        0x4 => skne,
        0x5 => skre,
        0x6 => load,
        0x7 => add,
        0x8 => match op.opcode.n() {
            0x0 => mv,
            0x1 => or,
            0x2 => and,
            0x3 => xor,
            0x4 => addr,
            0x5 => sub,
            0x6 => shr,
            0x7 => subn,
            0xE => shl,
            _ => return Err(op.unknown()),
        },
        0x9 => skrne,
        0xA => loadi,
        0xB => jumpi,
        0xC => rand,
        0xD => draw,
        0xE => match op.opcode.kk() {
            0x9E => skpr,
            0xA1 => skup,
            _ => return Err(op.unknown()),
        },
        0xF => match op.opcode.kk() {
            0x07 => moved,
            0x0A => keyd,
            0x15 => loads,
            0x18 => ld,
            0x1E => addi,
            0x29 => ldspr,
            0x33 => bcd,
            0x55 => stor,
            0x65 => read,
            _ => return Err(op.unknown()),
        },
        _ => return Err(op.unknown()),
    };
    Ok(operation)
}

/// Decodes and executes one opcode as if it had been fetched from `state.pc`, then steps past it.
pub fn execute(opcode: u16, state: &State, ctx: &mut Context) -> Result<State> {
    let op = Decoded::new(opcode, state.pc);
    let operation = from_op(&op)?;
    let mut next = operation(&op, state, ctx)?;
    next.pc = next.pc.wrapping_add(0x2);
    Ok(next)
}

#[cfg(test)]
mod test_instruction {
    use super::*;
    use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, SPRITE_SHEET};
    use crate::quirks::Quirks;
    use crate::state::Status;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Runs a single opcode against `state` as though it sat at `state.pc`
    fn run_with(op: u16, state: &State, keys: [bool; 16], quirks: Quirks) -> Result<State> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = Context {
            keys,
            quirks,
            rng: &mut rng,
        };
        execute(op, state, &mut ctx)
    }

    fn run(op: u16, state: &State) -> State {
        run_with(op, state, [false; 16], Quirks::default()).unwrap()
    }

    fn program_state() -> State {
        State {
            pc: 0x200,
            ..State::new()
        }
    }

    #[test]
    fn test_unmapped_opcodes_are_errors() {
        let state = program_state();
        for op in [0x00E1, 0x8128, 0x800F, 0xE1FF, 0xF1FF, 0xF100] {
            let res = run_with(op, &state, [false; 16], Quirks::default());
            assert_eq!(
                res.unwrap_err(),
                Chip8Error::UnknownOpcode { opcode: op, pc: 0x200 }
            );
        }
    }

    #[test]
    fn test_0000_halts() {
        let state = program_state();
        let state = run(0x0000, &state);
        assert_eq!(state.status, Status::Halted);
    }

    #[test]
    fn test_00e0_cls() {
        let mut state = program_state();
        state.frame_buffer[0][0] = true;
        state.frame_buffer[31][63] = true;
        let state = run(0x00E0, &state);
        assert!(state.frame_buffer.iter().flatten().all(|&p| !p));
        assert!(state.draw_flag);
        assert_eq!(state.pc, 0x202);
    }

    #[test]
    fn test_00ee_ret() {
        let mut state = program_state();
        state.sp = 0x1;
        state.stack[0] = 0x0ABC;
        let state = run(0x00EE, &state);
        assert_eq!(state.sp, 0x0);
        // The popped address is the call itself, so execution resumes just after it
        assert_eq!(state.pc, 0x0ABC + 0x2);
    }

    #[test]
    fn test_00ee_ret_underflows() {
        let state = program_state();
        let res = run_with(0x00EE, &state, [false; 16], Quirks::default());
        assert_eq!(res.unwrap_err(), Chip8Error::StackUnderflow { pc: 0x200 });
    }

    #[test]
    fn test_1nnn_jp() {
        let state = program_state();
        let state = run(0x1ABC, &state);
        assert_eq!(state.pc, 0x0ABC);
    }

    #[test]
    fn test_1nnn_jp_to_zero() {
        let state = program_state();
        let state = run(0x1000, &state);
        assert_eq!(state.pc, 0x0000);
    }

    #[test]
    fn test_2nnn_call() {
        let mut state = program_state();
        state.pc = 0x0ABC;
        let state = run(0x2123, &state);
        assert_eq!(state.sp, 0x1);
        assert_eq!(state.stack[0], 0x0ABC);
        assert_eq!(state.pc, 0x0123);
    }

    #[test]
    fn test_2nnn_call_overflows() {
        let mut state = program_state();
        state.sp = 16;
        let res = run_with(0x2123, &state, [false; 16], Quirks::default());
        assert_eq!(res.unwrap_err(), Chip8Error::StackOverflow { pc: 0x200 });
    }

    #[test]
    fn test_3xkk_se_skips() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        let state = run(0x3111, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_3xkk_se_doesntskip() {
        let state = program_state();
        let state = run(0x3111, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_4xkk_sne_skips() {
        let state = program_state();
        let state = run(0x4111, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_4xkk_sne_doesntskip() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        let state = run(0x4111, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_5xy0_se_skips() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = run(0x5120, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_5xy0_se_doesntskip() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        let state = run(0x5120, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_6xkk_ld() {
        let state = program_state();
        let state = run(0x6122, &state);
        assert_eq!(state.v[0x1], 0x22);
    }

    #[test]
    fn test_7xkk_add_wraps_without_flag() {
        let mut state = program_state();
        state.v[0x1] = 0xFF;
        state.v[0xF] = 0x7;
        let state = run(0x7102, &state);
        assert_eq!(state.v[0x1], 0x01);
        assert_eq!(state.v[0xF], 0x7);
    }

    #[test]
    fn test_8xy0_ld() {
        let mut state = program_state();
        state.v[0x2] = 0x1;
        let state = run(0x8120, &state);
        assert_eq!(state.v[0x1], 0x1);
    }

    #[test]
    fn test_8xy1_or() {
        let mut state = program_state();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        let state = run(0x8121, &state);
        assert_eq!(state.v[0x1], 0x7);
    }

    #[test]
    fn test_8xy2_and() {
        let mut state = program_state();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        let state = run(0x8122, &state);
        assert_eq!(state.v[0x1], 0x2);
    }

    #[test]
    fn test_8xy3_xor() {
        let mut state = program_state();
        state.v[0x1] = 0x6;
        state.v[0x2] = 0x3;
        let state = run(0x8123, &state);
        assert_eq!(state.v[0x1], 0x5);
    }

    #[test]
    fn test_8xy4_add_sets_carry_for_all_values() {
        let mut state = program_state();
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                state.v[0x1] = a;
                state.v[0x2] = b;
                let next = run(0x8124, &state);
                assert_eq!(next.v[0x1], a.wrapping_add(b));
                assert_eq!(next.v[0xF], u8::from(a as u16 + b as u16 > 255));
            }
        }
    }

    #[test]
    fn test_8xy5_sub_sets_no_borrow_for_all_values() {
        let mut state = program_state();
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                state.v[0x1] = a;
                state.v[0x2] = b;
                let next = run(0x8125, &state);
                assert_eq!(next.v[0x1], a.wrapping_sub(b));
                assert_eq!(next.v[0xF], u8::from(a >= b));
            }
        }
    }

    #[test]
    fn test_8xy4_flag_wins_over_result_in_vf() {
        let mut state = program_state();
        state.v[0xF] = 0xFF;
        state.v[0x1] = 0x01;
        let state = run(0x8F14, &state);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy6_shr_reads_vy() {
        let mut state = program_state();
        state.v[0x1] = 0xF0;
        state.v[0x2] = 0x5;
        let state = run(0x8126, &state);
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0x2], 0x5);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy6_shr_nolsb() {
        let mut state = program_state();
        state.v[0x2] = 0x4;
        let state = run(0x8126, &state);
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy6_shr_in_place_quirk() {
        let mut state = program_state();
        state.v[0x1] = 0x5;
        state.v[0x2] = 0xF0;
        let quirks = Quirks {
            shift_uses_vy: false,
            ..Quirks::default()
        };
        let state = run_with(0x8126, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_nocarry() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x33;
        let state = run(0x8127, &state);
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xy7_subn_carry() {
        let mut state = program_state();
        state.v[0x1] = 0x12;
        state.v[0x2] = 0x11;
        let state = run(0x8127, &state);
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_msb() {
        let mut state = program_state();
        state.v[0x2] = 0xFF;
        let state = run(0x812E, &state);
        // 0xFF * 2 = 0x01FE
        assert_eq!(state.v[0x1], 0xFE);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_8xye_shl_nomsb() {
        let mut state = program_state();
        state.v[0x2] = 0x4;
        let state = run(0x812E, &state);
        assert_eq!(state.v[0x1], 0x8);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl_in_place_quirk() {
        let mut state = program_state();
        state.v[0x1] = 0x81;
        state.v[0x2] = 0x01;
        let quirks = Quirks {
            shift_uses_vy: false,
            ..Quirks::default()
        };
        let state = run_with(0x812E, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.v[0x1], 0x02);
        assert_eq!(state.v[0x2], 0x01);
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_9xy0_sne_skips() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        let state = run(0x9120, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_9xy0_sne_doesntskip() {
        let mut state = program_state();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        let state = run(0x9120, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_annn_ld() {
        let state = program_state();
        let state = run(0xAABC, &state);
        assert_eq!(state.i, 0xABC);
    }

    #[test]
    fn test_bnnn_jp() {
        let mut state = program_state();
        state.v[0x0] = 0x2;
        let state = run(0xBABC, &state);
        assert_eq!(state.pc, 0xABE);
    }

    #[test]
    fn test_cxkk_rnd_masks() {
        let state = program_state();
        let state = run(0xC10F, &state);
        assert_eq!(state.v[0x1] & 0xF0, 0x0);
        let zeroed = run(0xC200, &state);
        assert_eq!(zeroed.v[0x2], 0x0);
    }

    #[test]
    fn test_dxyn_drw_draws() {
        let mut state = program_state();
        state.v[0x0] = 0x1;
        // Draw the 0x0 sprite with a 1x 1y offset
        let state = run(0xD005, &state);
        let mut expected = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        expected[1][1..5].copy_from_slice(&[true, true, true, true]);
        expected[2][1..5].copy_from_slice(&[true, false, false, true]);
        expected[3][1..5].copy_from_slice(&[true, false, false, true]);
        expected[4][1..5].copy_from_slice(&[true, false, false, true]);
        expected[5][1..5].copy_from_slice(&[true, true, true, true]);
        assert_eq!(state.frame_buffer, expected);
        assert_eq!(state.v[0xF], 0x0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_dxyn_drw_twice_erases() {
        let state = program_state();
        let drawn = run(0xD005, &state);
        assert_eq!(drawn.v[0xF], 0x0);
        for (row, byte) in SPRITE_SHEET[..5].iter().enumerate() {
            for bit in 0..8 {
                let lit = (byte >> (7 - bit)) & 0x1 == 0x1;
                assert_eq!(drawn.frame_buffer[row][bit], lit);
            }
        }
        let erased = run(0xD005, &State { pc: 0x200, ..drawn });
        assert_eq!(erased.v[0xF], 0x1);
        assert!(erased.frame_buffer.iter().flatten().all(|&p| !p));
    }

    #[test]
    fn test_dxyn_drw_collides() {
        let mut state = program_state();
        state.frame_buffer[0][0] = true;
        let state = run(0xD001, &state);
        assert_eq!(state.v[0xF], 0x1)
    }

    #[test]
    fn test_dxy0_drw_marks_frame_dirty() {
        let mut state = program_state();
        state.frame_buffer[3][3] = true;
        state.v[0xF] = 0x1;
        let before = state.frame_buffer;
        let state = run(0xD000, &state);
        assert_eq!(state.frame_buffer, before);
        assert_eq!(state.v[0xF], 0x0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_dxyn_drw_xors() {
        let mut state = program_state();
        state.frame_buffer[0][2..6].copy_from_slice(&[false, true, false, true]);
        // 1 1 1 1 -> Draw xor
        state.v[0x0] = 0x2;
        state.v[0x1] = 0x0;
        let state = run(0xD011, &state);
        assert_eq!(state.frame_buffer[0][2..6], [true, false, true, false]);
    }

    #[test]
    fn test_dxyn_drw_clips_at_edges() {
        let mut state = program_state();
        state.v[0x0] = 62;
        state.v[0x1] = 30;
        // The 0x0 sprite is 4 wide and 5 tall; only its top left 2x2 corner fits
        let state = run(0xD015, &state);
        assert!(state.frame_buffer[30][62]);
        assert!(state.frame_buffer[30][63]);
        assert!(state.frame_buffer[31][62]);
        assert!(!state.frame_buffer[31][63]);
        // Nothing wraps around to the opposite edges
        assert!(state.frame_buffer[0].iter().all(|&p| !p));
        assert!(state.frame_buffer.iter().all(|row| !row[0] && !row[1]));
    }

    #[test]
    fn test_dxyn_drw_wraps_start_position() {
        let mut state = program_state();
        state.v[0x0] = 64 + 1;
        state.v[0x1] = 32 + 2;
        let state = run(0xD011, &state);
        assert!(state.frame_buffer[2][1..5].iter().all(|&p| p));
    }

    #[test]
    fn test_dxyn_drw_out_of_memory() {
        let mut state = program_state();
        state.i = 0xFFE;
        let res = run_with(0xD005, &state, [false; 16], Quirks::default());
        assert_eq!(
            res.unwrap_err(),
            Chip8Error::MemoryOutOfBounds { address: 0x1000 }
        );
    }

    #[test]
    fn test_ex9e_skp_skips() {
        let mut state = program_state();
        let mut keys = [false; 16];
        keys[0xE] = true;
        state.v[0x1] = 0xE;
        let state = run_with(0xE19E, &state, keys, Quirks::default()).unwrap();
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_ex9e_skp_doesntskip() {
        let state = program_state();
        let state = run(0xE19E, &state);
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_exa1_sknp_skips() {
        let state = program_state();
        let state = run(0xE1A1, &state);
        assert_eq!(state.pc, 0x0204);
    }

    #[test]
    fn test_exa1_sknp_doesntskip() {
        let mut state = program_state();
        let mut keys = [false; 16];
        keys[0xE] = true;
        state.v[0x1] = 0xE;
        let state = run_with(0xE1A1, &state, keys, Quirks::default()).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx07_ld() {
        let mut state = program_state();
        state.delay_timer = 0xF;
        let state = run(0xF107, &state);
        assert_eq!(state.v[0x1], 0xF);
    }

    #[test]
    fn test_fx0a_ld_awaits_key() {
        let state = program_state();
        let state = run(0xF10A, &state);
        assert_eq!(state.status, Status::AwaitingKey { register: 0x1 });
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx0a_ld_takes_pressed_key() {
        let state = program_state();
        let mut keys = [false; 16];
        keys[0x9] = true;
        keys[0xC] = true;
        let state = run_with(0xF10A, &state, keys, Quirks::default()).unwrap();
        assert_eq!(state.status, Status::Running);
        assert_eq!(state.v[0x1], 0x9);
    }

    #[test]
    fn test_fx15_ld() {
        let mut state = program_state();
        state.v[0x1] = 0xF;
        let state = run(0xF115, &state);
        assert_eq!(state.delay_timer, 0xF);
    }

    #[test]
    fn test_fx18_ld() {
        let mut state = program_state();
        state.v[0x1] = 0xF;
        let state = run(0xF118, &state);
        assert_eq!(state.sound_timer, 0xF);
    }

    #[test]
    fn test_fx1e_add() {
        let mut state = program_state();
        state.i = 0x1;
        state.v[0x1] = 0x1;
        let state = run(0xF11E, &state);
        assert_eq!(state.i, 0x2);
    }

    #[test]
    fn test_fx29_ld() {
        let mut state = program_state();
        state.v[0x1] = 0x2;
        let state = run(0xF129, &state);
        assert_eq!(state.i, 0xA);
    }

    #[test]
    fn test_fx33_ld() {
        let mut state = program_state();
        state.v[0x1] = 157;
        state.i = 0x300;
        let state = run(0xF133, &state);
        assert_eq!(state.memory[0x300..0x303], [0x1, 0x5, 0x7]);
    }

    #[test]
    fn test_fx55_ld() {
        let mut state = program_state();
        state.i = 0x300;
        state.v[0x0..0x5].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5]);
        let state = run(0xF455, &state);
        assert_eq!(state.memory[0x300..0x305], [0x1, 0x2, 0x3, 0x4, 0x5]);
        assert_eq!(state.memory[0x305], 0x0);
        assert_eq!(state.i, 0x305);
    }

    #[test]
    fn test_fx65_ld() {
        let mut state = program_state();
        state.i = 0x300;
        state.memory[0x300..0x305].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5]);
        let state = run(0xF465, &state);
        assert_eq!(state.v[0x0..0x5], [0x1, 0x2, 0x3, 0x4, 0x5]);
        assert_eq!(state.i, 0x305);
    }

    #[test]
    fn test_fx55_fx65_static_index_quirk() {
        let mut state = program_state();
        state.i = 0x300;
        let quirks = Quirks {
            load_store_advances_index: false,
            ..Quirks::default()
        };
        let state = run_with(0xF455, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.i, 0x300);
        let state = run_with(0xF465, &state, [false; 16], quirks).unwrap();
        assert_eq!(state.i, 0x300);
    }

    #[test]
    fn test_fx55_out_of_memory() {
        let mut state = program_state();
        state.i = 0xFFE;
        let res = run_with(0xF255, &state, [false; 16], Quirks::default());
        assert_eq!(
            res.unwrap_err(),
            Chip8Error::MemoryOutOfBounds { address: 0x1000 }
        );
    }
}
