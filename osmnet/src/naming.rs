//! Nommage des couches
//!
//! - identifiant dans l'archive : `osm_segments_<code>` (stable, réécrit à
//!   chaque run pour un même code)
//! - nom d'affichage : `OSMnx_<nom>_<UF>_<réseau>_segments[_buf<N>m]`

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::types::AreaIdentity;

/// Préfixe des identifiants de couche dans l'archive
pub const LAYER_PREFIX: &str = "osm_segments_";

/// Préfixe des noms d'affichage
pub const DISPLAY_PREFIX: &str = "OSMnx";

/// Séparateur des noms d'affichage
pub const SEPARATOR: char = '_';

/// Noms dérivés pour une municipalité
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerNames {
    pub archive_layer_id: String,
    pub display_name: String,
}

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").expect("static regex is valid"))
}

/// Remplace chaque suite de caractères non alphanumériques par un seul `_`
pub fn normalize_name(name: &str) -> String {
    non_alphanumeric()
        .replace_all(name, "_")
        .trim_matches(SEPARATOR)
        .to_string()
}

/// Identifiant de couche dans l'archive
pub fn archive_layer_id(code: &str) -> String {
    format!("{}{}", LAYER_PREFIX, code)
}

/// Dérive l'identifiant de couche et le nom d'affichage
pub fn derive_names(identity: &AreaIdentity, network_type: &str, buffer_meters: f64) -> LayerNames {
    let mut parts = vec![
        DISPLAY_PREFIX.to_string(),
        normalize_name(&identity.name),
        normalize_name(&identity.uf),
        network_type.to_string(),
        "segments".to_string(),
    ];
    if buffer_meters > 0.0 {
        parts.push(format!("buf{}m", buffer_meters.trunc() as i64));
    }
    parts.retain(|part| !part.is_empty());
    let display_name = parts.join(&SEPARATOR.to_string());

    LayerNames {
        archive_layer_id: archive_layer_id(identity.code.as_str()),
        display_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::AdministrativeCode;

    fn porto_alegre() -> AreaIdentity {
        AreaIdentity {
            code: AdministrativeCode::parse("4314902").unwrap(),
            name: "Porto Alegre".to_string(),
            uf: "RS".to_string(),
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Porto Alegre"), "Porto_Alegre");
        assert_eq!(normalize_name("Santana do Livramento"), "Santana_do_Livramento");
        assert_eq!(normalize_name("Pau D'Arco"), "Pau_D_Arco");
        assert_eq!(normalize_name("Embu-Guaçu"), "Embu_Guaçu");
        assert_eq!(normalize_name("  São  Paulo -- (SP) "), "São_Paulo_SP");
        assert!(!normalize_name("a -/ b").contains("__"));
    }

    #[test]
    fn test_derive_names_without_buffer() {
        let names = derive_names(&porto_alegre(), "drive", 0.0);
        assert_eq!(names.archive_layer_id, "osm_segments_4314902");
        assert_eq!(names.display_name, "OSMnx_Porto_Alegre_RS_drive_segments");
    }

    #[test]
    fn test_derive_names_with_buffer() {
        let names = derive_names(&porto_alegre(), "all", 1000.0);
        assert_eq!(names.archive_layer_id, "osm_segments_4314902");
        assert_eq!(names.display_name, "OSMnx_Porto_Alegre_RS_all_segments_buf1000m");

        let fractional = derive_names(&porto_alegre(), "walk", 250.75);
        assert!(fractional.display_name.ends_with("_buf250m"));
    }

    #[test]
    fn test_derive_names_skips_empty_parts() {
        let identity = AreaIdentity {
            name: "--".to_string(),
            ..porto_alegre()
        };
        let names = derive_names(&identity, "drive", 0.0);
        assert_eq!(names.display_name, "OSMnx_RS_drive_segments");

        let buffered = derive_names(&identity, "walk", 300.0);
        assert_eq!(buffered.display_name, "OSMnx_RS_walk_segments_buf300m");
        assert!(!buffered.display_name.contains("__"));
    }

    #[test]
    fn test_derive_names_is_deterministic() {
        let a = derive_names(&porto_alegre(), "bike", 500.0);
        let b = derive_names(&porto_alegre(), "bike", 500.0);
        assert_eq!(a, b);
        assert!(!derive_names(&porto_alegre(), "bike", -5.0).display_name.contains("_buf"));
    }
}
