use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::constants::KEY_COUNT;

/// # Keypad
/// The pressed status of the 16 hexadecimal keys 0..F.
///
/// Cloning a `Keypad` yields another handle onto the same keys: the input side holds one and
/// writes, the interpreter holds the other and only reads. Each key is an atomic so the
/// writer may live on another thread without tearing a read mid-update.
#[derive(Clone, Debug, Default)]
pub struct Keypad {
    keys: Arc<[AtomicBool; KEY_COUNT]>,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the hexadecimal value of the key that was pressed
    pub fn press(&self, key: u8) {
        self.set(key, true);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the hexadecimal value of the key that was released
    pub fn release(&self, key: u8) {
        self.set(key, false);
    }

    /// Keys outside 0..F are ignored
    pub fn set(&self, key: u8, pressed: bool) {
        if let Some(k) = self.keys.get(key as usize) {
            k.store(pressed, Ordering::Relaxed);
        }
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys
            .get(key as usize)
            .map_or(false, |k| k.load(Ordering::Relaxed))
    }

    pub fn release_all(&self) {
        for k in self.keys.iter() {
            k.store(false, Ordering::Relaxed);
        }
    }

    /// A copy of every key's status as of now, indexed by key value.
    pub fn snapshot(&self) -> [bool; KEY_COUNT] {
        let mut pressed = [false; KEY_COUNT];
        for (p, k) in pressed.iter_mut().zip(self.keys.iter()) {
            *p = k.load(Ordering::Relaxed);
        }
        pressed
    }
}
