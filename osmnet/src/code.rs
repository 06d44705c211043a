//! Codes de municipalité IBGE
//!
//! Un code valide ne contient que des chiffres et fait 6 ou 7 caractères
//! (le 7e chiffre étant le dígito verificador, omis par certains services).

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::PipelineError;

/// Longueurs acceptées pour un code IBGE
pub const VALID_LENGTHS: [usize; 2] = [6, 7];

/// Code de municipalité validé
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AdministrativeCode(String);

impl AdministrativeCode {
    /// Valide une saisie brute
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidCodeFormat` si la saisie contient autre chose que
    /// des chiffres ASCII ou si sa longueur n'est pas 6 ou 7.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        if raw.is_empty() {
            return Err(PipelineError::invalid_code(raw, "empty code"));
        }
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(PipelineError::invalid_code(
                raw,
                "only digits are allowed",
            ));
        }
        if !VALID_LENGTHS.contains(&raw.len()) {
            return Err(PipelineError::invalid_code(
                raw,
                format!("expected 6 or 7 digits, got {}", raw.len()),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdministrativeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Découpe une saisie multi-codes
///
/// Séparateurs : virgule, point-virgule et tout blanc (espace, tabulation,
/// retour ligne). Les jetons vides sont ignorés, l'ordre et les doublons sont
/// conservés. Aucune validation n'est faite ici.
pub fn parse_batch(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Supprime les doublons en gardant la première occurrence
pub fn dedupe(codes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|code| seen.insert(code.clone()))
        .collect()
}
