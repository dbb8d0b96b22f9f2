//! Opaque pagination cursors
//!
//! A cursor wraps the last-seen row id so clients cannot treat it as a
//! number. Decoding is lenient: anything malformed parses as 0, which means
//! "start from the newest".

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

const RADIX: u32 = 36;

/// Encode a row id into an opaque cursor string
pub fn from_i64(id: i64) -> String {
    URL_SAFE_NO_PAD.encode(to_base36(id))
}

/// Decode a cursor back into a row id; malformed input yields 0
pub fn parse_i64(cursor: &str) -> i64 {
    if cursor.is_empty() {
        return 0;
    }
    let Ok(raw) = URL_SAFE_NO_PAD.decode(cursor) else {
        return 0;
    };
    let Ok(digits) = String::from_utf8(raw) else {
        return 0;
    };
    i64::from_str_radix(&digits, RADIX).unwrap_or(0)
}

fn to_base36(id: i64) -> String {
    if id == 0 {
        return "0".to_string();
    }
    let negative = id < 0;
    let mut n = id.unsigned_abs();
    let mut digits = Vec::new();
    while n > 0 {
        let d = (n % u64::from(RADIX)) as u32;
        digits.push(char::from_digit(d, RADIX).unwrap_or('0'));
        n /= u64::from(RADIX);
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod cursor_test {
    include!("cursor_test.rs");
}
