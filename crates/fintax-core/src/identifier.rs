//! Local ISIN checks. Network enrichment lives outside the engine; lines
//! whose identifier is missing or malformed are still priced on amount and fee.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsinStatus {
    Valid,
    /// Not two letters, nine alphanumerics and a digit.
    Malformed,
    /// Well formed but the Luhn check digit does not match.
    BadChecksum,
}

/// Classify an identifier as a valid ISIN, a malformed code or a checksum
/// mismatch. Surrounding whitespace is ignored; case is not.
pub fn check_isin(code: &str) -> IsinStatus {
    let code = code.trim();
    let bytes = code.as_bytes();
    let well_formed = bytes.len() == 12
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..11]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && bytes[11].is_ascii_digit();
    if !well_formed {
        return IsinStatus::Malformed;
    }

    let expected = u32::from(bytes[11] - b'0');
    if isin_check_digit(&bytes[..11]) == expected {
        IsinStatus::Valid
    } else {
        IsinStatus::BadChecksum
    }
}

pub fn is_valid_isin(code: &str) -> bool {
    check_isin(code) == IsinStatus::Valid
}

/// Luhn over the body with letters expanded to two digits (A=10 .. Z=35).
fn isin_check_digit(body: &[u8]) -> u32 {
    let mut digits: Vec<u32> = Vec::with_capacity(22);
    for &b in body {
        if b.is_ascii_digit() {
            digits.push(u32::from(b - b'0'));
        } else {
            let value = u32::from(b - b'A') + 10;
            digits.push(value / 10);
            digits.push(value % 10);
        }
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    (10 - sum % 10) % 10
}
