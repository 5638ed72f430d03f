use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_LEN: usize = 6;

// Shared by every generator in the process.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Produces human-readable booking references such as `TRV-MF3K2QZ1-001A-7QH2XD`.
///
/// Layout: prefix, base36 wall-clock millis, base36 process-wide sequence,
/// random base36 suffix. The sequence makes references from one process
/// distinct even within the same millisecond; the suffix separates processes.
#[derive(Debug, Clone)]
pub struct ReferenceGenerator {
    prefix: String,
}

impl ReferenceGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn next_reference(&self) -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let mut rng = rand::thread_rng();
        let suffix: String = (0..RANDOM_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        format!(
            "{}-{}-{:0>4}-{}",
            self.prefix,
            to_base36(millis),
            to_base36(seq),
            suffix
        )
    }
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self::new("TRV")
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
