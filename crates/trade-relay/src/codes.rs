//! Friend code generation and reservation.
//!
//! Codes are 8 lowercase alphanumeric characters, unique among all codes
//! currently reserved. Check-and-reserve happens inside one critical
//! section, so no two concurrent calls can hand out the same code.

use std::collections::HashSet;

use parking_lot::Mutex;
use rand::Rng;
use trade_types::{code_from_generator, FriendCode, FRIEND_CODE_LENGTH};

const CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Issues rendezvous codes and tracks which are currently in use.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    in_use: Mutex<HashSet<FriendCode>>,
}

impl CodeGenerator {
    /// Create a generator with no codes reserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh code and reserve it.
    ///
    /// Retries until an unused code comes up; with 36^8 possible codes
    /// and a small in-use set this terminates immediately in practice.
    pub fn generate(&self) -> FriendCode {
        let mut in_use = self.in_use.lock();
        loop {
            let code = random_code();
            if !in_use.contains(&code) {
                in_use.insert(code.clone());
                return code;
            }
        }
    }

    /// Whether a code is currently reserved.
    pub fn is_reserved(&self, code: &FriendCode) -> bool {
        self.in_use.lock().contains(code)
    }

    /// Release a code so it may be handed out again. Releasing a code
    /// that is not reserved is a no-op.
    pub fn release(&self, code: &FriendCode) {
        self.in_use.lock().remove(code);
    }

    /// Number of codes currently reserved.
    pub fn reserved_count(&self) -> usize {
        self.in_use.lock().len()
    }
}

fn random_code() -> FriendCode {
    let mut rng = rand::thread_rng();
    let raw: String = (0..FRIEND_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect();
    code_from_generator(raw)
}
