//! Configuration du système
//!
//! Ordre de priorité : valeurs par défaut, fichier JSON (`--config`),
//! variables d'environnement `OSMNET_*`, puis options de la ligne de commande.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Service de localités de l'IBGE
pub const DEFAULT_IBGE_URL: &str = "https://servicodados.ibge.gov.br";

/// Instance publique de Nominatim
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Instance publique d'Overpass
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// URL de base du service de localités
    pub ibge_url: String,

    /// URL de base du géocodeur
    pub nominatim_url: String,

    /// Endpoint de l'interpréteur Overpass
    pub overpass_url: String,

    /// User-Agent des requêtes HTTP (exigé par Nominatim)
    pub user_agent: String,

    /// Timeout des requêtes HTTP, en secondes
    pub timeout_secs: u64,

    /// Timeout transmis au serveur Overpass (`[timeout:N]`)
    pub overpass_timeout_secs: u64,

    /// Écrire les géométries sans Crs (srs_id -1)
    pub strip_crs: bool,

    /// Ne traiter qu'une fois chaque code répété
    pub dedupe_codes: bool,

    /// Refaire le buffer en Web Mercator si la route UTM échoue
    pub buffer_mercator_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ibge_url: DEFAULT_IBGE_URL.into(),
            nominatim_url: DEFAULT_NOMINATIM_URL.into(),
            overpass_url: DEFAULT_OVERPASS_URL.into(),
            user_agent: concat!("municipio-segments/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 180,
            overpass_timeout_secs: 180,
            strip_crs: true,
            dedupe_codes: false,
            buffer_mercator_fallback: false,
        }
    }
}

impl Settings {
    /// Charge une configuration depuis un fichier JSON
    ///
    /// Les champs absents gardent leur valeur par défaut.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Applique les variables `OSMNET_*` du processus
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Applique des variables lues par `var`; les valeurs invalides sont ignorées
    pub fn with_vars<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("OSMNET_IBGE_URL") {
            self.ibge_url = url;
        }
        if let Some(url) = var("OSMNET_NOMINATIM_URL") {
            self.nominatim_url = url;
        }
        if let Some(url) = var("OSMNET_OVERPASS_URL") {
            self.overpass_url = url;
        }
        if let Some(agent) = var("OSMNET_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(secs) = var("OSMNET_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.timeout_secs = secs;
        }
        if let Some(strip) = var("OSMNET_STRIP_CRS").and_then(|s| parse_bool(&s)) {
            self.strip_crs = strip;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
