//! One-time passcodes for the second login step.

use rand::Rng;
use sha2::{Digest, Sha256};

pub const CODE_LENGTH: usize = 6;

/// Random six-digit passcode, zero padded.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{:06}", n)
}

/// Hex SHA-256 digest stored in place of the passcode.
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// True when `code` is exactly six ASCII digits.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

/// Mask the local part of an email: `jane.doe@college.edu` becomes `ja***@college.edu`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".into(),
    }
}
