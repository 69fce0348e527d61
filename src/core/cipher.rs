//! Caesar substitution over the uppercase Latin alphabet.
//!
//! Only `A`-`Z` are shifted; every other character passes through.

/// Shift each uppercase letter forward by `shift` (taken mod 26).
pub fn caesar_encrypt(message: &str, shift: u8) -> String {
    rotate(message, shift % 26)
}

/// Inverse of [`caesar_encrypt`] for the same shift.
pub fn caesar_decrypt(message: &str, shift: u8) -> String {
    rotate(message, (26 - shift % 26) % 26)
}

fn rotate(message: &str, shift: u8) -> String {
    message
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                (((c as u8 - b'A' + shift) % 26) + b'A') as char
            } else {
                c
            }
        })
        .collect()
}
