/// # Quirks
/// Behaviours that differ between Chip-8 interpreters and that ROMs come to rely on.
///
/// The defaults follow the original COSMAC VIP interpreter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// `8xy6`/`8xyE` shift Vy into Vx; when unset Vx is shifted in place and Vy is ignored.
    pub shift_uses_vy: bool,
    /// `Fx55`/`Fx65` leave I pointing just past the last register transferred (`I += x + 1`);
    /// when unset I is left untouched.
    pub load_store_advances_index: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            shift_uses_vy: true,
            load_store_advances_index: true,
        }
    }
}
