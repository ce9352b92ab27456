//! Password hashing, verification, and generation.
//!
//! New credentials are hashed with Argon2id. Rows created before hashing
//! was introduced store the raw password; verification falls back to a
//! plain equality check for those until they are rehashed.

use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordVerifier, Version};
use rand::seq::SliceRandom;
use rand::Rng;

/// Default Argon2id work factor: memory cost in KiB, iterations, lanes.
const DEFAULT_M_COST: u32 = 19_456;
const DEFAULT_T_COST: u32 = 2;
const DEFAULT_P_COST: u32 = 1;

/// Minimum accepted password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password with the default work factor.
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with(password, DEFAULT_M_COST, DEFAULT_T_COST, DEFAULT_P_COST)
}

/// Hash a password with an explicit work factor.
pub fn hash_password_with(password: &str, m_cost: u32, t_cost: u32, p_cost: u32) -> Result<String> {
    let params = Params::new(m_cost, t_cost, p_cost, None)
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {}", e))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// True when `stored` is a PHC-formatted hash rather than a legacy
/// plaintext credential.
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

/// Verify a password against a stored credential, hashed or legacy.
/// The work factor is read from the hash itself.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if is_hashed(stored) {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    } else {
        // Legacy row: the column holds the raw password.
        stored == password
    }
}

/// Validate password strength. Returns the list of unmet rules; empty
/// means the password is acceptable.
pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }

    errors
}

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*";

/// Generate a random password of at least `MIN_PASSWORD_LENGTH` characters
/// containing one character from each required category.
pub fn generate_password(length: usize) -> String {
    let length = length.max(MIN_PASSWORD_LENGTH);
    let mut rng = rand::thread_rng();

    let pick = |set: &[u8], rng: &mut rand::rngs::ThreadRng| -> char {
        set[rng.gen_range(0..set.len())] as char
    };

    let mut chars = vec![
        pick(UPPERCASE, &mut rng),
        pick(LOWERCASE, &mut rng),
        pick(DIGITS, &mut rng),
        pick(SPECIAL, &mut rng),
    ];

    let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SPECIAL].concat();
    while chars.len() < length {
        chars.push(pick(&all, &mut rng));
    }

    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}
