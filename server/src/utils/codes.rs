use rand::distributions::{Alphanumeric, Uniform};
use rand::Rng;

// Digits and capitals without the look-alikes 0/O and 1/I.
const BOOKING_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const BOOKING_CODE_LEN: usize = 8;
const QR_TOKEN_LEN: usize = 32;

/// Short code a buyer can read out at the door, e.g. `BK-7QF3K9TZ`.
pub fn booking_code() -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..BOOKING_CODE_ALPHABET.len());
    let code: String = (0..BOOKING_CODE_LEN)
        .map(|_| BOOKING_CODE_ALPHABET[rng.sample(dist)] as char)
        .collect();
    format!("BK-{code}")
}

/// Opaque token embedded in the ticket's QR code.
pub fn qr_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(QR_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_booking_code_shape() {
        let code = booking_code();
        assert!(code.starts_with("BK-"));
        assert_eq!(code.len(), 3 + BOOKING_CODE_LEN);
        assert!(code[3..]
            .bytes()
            .all(|b| BOOKING_CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_qr_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..200).map(|_| qr_token()).collect();
        assert_eq!(tokens.len(), 200);
        assert!(tokens.iter().all(|t| t.len() == QR_TOKEN_LEN));
    }
}
