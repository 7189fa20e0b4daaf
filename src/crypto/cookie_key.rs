use rand::RngCore;
use rand::rngs::OsRng;
use tower_cookies::Key;

/// The size of the cookie signing key in bytes.
const COOKIE_KEY_SIZE: usize = 64;

/// Generates a fresh key for signing session cookies.
///
/// The key lives only in memory, so every restart invalidates all
/// outstanding session cookies.
pub fn generate_cookie_key() -> Key {
    let mut bytes = [0u8; COOKIE_KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    Key::from(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_between_calls() {
        let a = generate_cookie_key();
        let b = generate_cookie_key();
        assert_ne!(a.master(), b.master());
    }
}
