//! Random value generation for stores that generate passwords locally.

use rand::Rng;

/// Characters a generated password is drawn from.
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%^&*-_=+";

/// Shortest password the generator will produce.
const MIN_LENGTH: usize = 8;

/// Generate a random password of `length` characters (at least 8).
pub fn generate_password(length: usize) -> String {
    let length = length.max(MIN_LENGTH);
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..PASSWORD_ALPHABET.len());
            char::from(PASSWORD_ALPHABET[idx])
        })
        .collect()
}
