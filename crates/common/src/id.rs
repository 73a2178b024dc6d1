//! ID and code generation utilities.

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

/// Alphabet for emailed verification codes.
const CODE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%&*?";

/// Length of an emailed verification code.
pub const VERIFICATION_CODE_LEN: usize = 6;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a user ID (random UUID v4, hyphenated).
    #[must_use]
    pub fn generate_user_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate a ULID-based token id, used as the JWT `jti`.
    #[must_use]
    pub fn generate_token_id(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a verification code from letters, digits and `!@#$%&*?`.
    #[must_use]
    pub fn generate_verification_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..VERIFICATION_CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_user_id() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate_user_id();
        let id2 = id_gen.generate_user_id();

        assert_eq!(id1.len(), 36);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_token_id() {
        let id_gen = IdGenerator::new();
        assert_eq!(id_gen.generate_token_id().len(), 26);
    }

    #[test]
    fn test_verification_code_alphabet() {
        let id_gen = IdGenerator::new();
        for _ in 0..50 {
            let code = id_gen.generate_verification_code();
            assert_eq!(code.len(), VERIFICATION_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
