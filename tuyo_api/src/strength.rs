//! Password strength scoring.
//!
//! The score is a plain count of satisfied rules, not an entropy estimate:
//! length of at least [`MIN_PASSWORD_LEN`], an uppercase letter, a lowercase
//! letter, a digit and a symbol. Each rule adds one point.

/// Minimum length, enforced as a hard gate on top of the score.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Score at which a password counts as "good".
pub const GOOD_SCORE: u8 = 3;

/// Score a password in `0..=5`.
pub fn evaluate_strength(password: &str) -> u8 {
    let rules = [
        password.chars().count() >= MIN_PASSWORD_LEN,
        password.chars().any(char::is_uppercase),
        password.chars().any(char::is_lowercase),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(is_symbol),
    ];
    rules.iter().filter(|ok| **ok).count() as u8
}

fn is_symbol(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Human label for a score, as shown under the password field.
pub fn strength_label(score: u8) -> &'static str {
    match score {
        0..=1 => "Muy débil",
        2 => "Débil",
        3 => "Aceptable",
        4 => "Fuerte",
        _ => "Muy fuerte",
    }
}

/// Checks the new-password step: both entries match, the length gate holds
/// and the score is at least [`GOOD_SCORE`].
pub fn check_new_password(nueva: &str, confirmar: &str) -> Result<(), String> {
    if nueva.is_empty() {
        return Err("Ingresa la nueva contraseña".to_string());
    }
    if nueva != confirmar {
        return Err("Las contraseñas no coinciden".to_string());
    }
    if nueva.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LEN} caracteres"
        ));
    }
    if evaluate_strength(nueva) < GOOD_SCORE {
        return Err("La contraseña es demasiado débil".to_string());
    }
    Ok(())
}
