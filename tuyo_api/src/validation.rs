//! Input checks applied before any network call.

use std::sync::OnceLock;

use regex::Regex;

/// Number of boxes in the code input.
pub const OTP_LEN: usize = 6;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
}

fn card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4} \d{4} \d{4} \d{4}$").expect("static regex"))
}

pub fn is_valid_email(correo: &str) -> bool {
    email_re().is_match(correo)
}

/// Card numbers are entered as four space-separated groups of four digits.
pub fn is_valid_card_number(numero: &str) -> bool {
    card_re().is_match(numero)
}

/// Group raw digits into the `XXXX XXXX XXXX XXXX` display form, dropping
/// anything that is not a digit and anything beyond sixteen digits.
pub fn format_card_number(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).take(16).collect();
    digits
        .chunks(4)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exactly [`OTP_LEN`] ASCII digits.
pub fn is_complete_otp(otp: &str) -> bool {
    otp.len() == OTP_LEN && otp.chars().all(|c| c.is_ascii_digit())
}
