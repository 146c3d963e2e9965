//! Deterministic type names for queries.
//!
//! The formatted query text is hashed with SHA-256; the digest seeds a
//! splitmix64 generator which picks an adjective and a noun. Identical text
//! always yields the same name, on every machine and every run.

mod words;

use heck::ToUpperCamelCase;
use sha2::{Digest, Sha256};

pub use words::{ADJECTIVES, NOUNS};

/// Seeded word picker.
pub struct NameGenerator {
    state: u64,
}

impl NameGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from arbitrary text.
    pub fn for_text(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        Self::seeded(u64::from_be_bytes(seed))
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn pick(&mut self, words: &'static [&'static str]) -> &'static str {
        words[(self.next_u64() % words.len() as u64) as usize]
    }

    pub fn adjective(&mut self) -> &'static str {
        self.pick(ADJECTIVES)
    }

    pub fn noun(&mut self) -> &'static str {
        self.pick(NOUNS)
    }
}

/// The synthesized type name for a formatted query, e.g. `braveOtter`.
pub fn name_query(formatted: &str) -> String {
    let mut generator = NameGenerator::for_text(formatted);
    let adjective = generator.adjective().to_lowercase();
    let noun = generator.noun().to_upper_camel_case();
    format!("{}{}", adjective, noun).replace(' ', "")
}
