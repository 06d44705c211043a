//! Types d'erreurs du pipeline par municipalité

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Erreurs pouvant survenir lors du traitement d'une municipalité
///
/// Chaque variante correspond à une étape du pipeline. Aucune n'est fatale
/// pour le run : l'orchestrateur les enregistre et passe au code suivant.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Code IBGE mal formé (caractères non numériques ou longueur hors {6, 7})
    #[error("Invalid administrative code '{raw}': {reason}")]
    InvalidCodeFormat { raw: String, reason: String },

    /// Service de lookup injoignable ou réponse inexploitable
    #[error("Area lookup failed for {code}: {reason}")]
    AreaLookupFailed { code: String, reason: String },

    /// Le géocodeur n'a retourné aucune géométrie exploitable
    #[error("Boundary not found for '{query}': {reason}")]
    BoundaryNotFound { query: String, reason: String },

    /// Échec de la détermination de zone UTM ou d'une reprojection du buffer
    #[error("Buffer projection failed: {0}")]
    BufferProjection(String),

    /// Erreur du fournisseur de réseau, timeout ou graphe vide
    #[error("Network fetch failed for '{query}': {reason}")]
    NetworkFetchFailed { query: String, reason: String },

    /// Reprojection du graphe impossible
    #[error("Graph projection failed: {0}")]
    Projection(String),

    /// Écriture de la couche dans l'archive impossible
    #[error("Archive write failed for layer {layer}: {reason}")]
    ArchiveWrite { layer: String, reason: String },
}

/// Catégorie d'erreur, reportée dans le résumé du run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidCodeFormat,
    AreaLookupFailed,
    BoundaryNotFound,
    BufferProjectionError,
    NetworkFetchFailed,
    ProjectionError,
    ArchiveWriteError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidCodeFormat => "InvalidCodeFormat",
            Self::AreaLookupFailed => "AreaLookupFailed",
            Self::BoundaryNotFound => "BoundaryNotFound",
            Self::BufferProjectionError => "BufferProjectionError",
            Self::NetworkFetchFailed => "NetworkFetchFailed",
            Self::ProjectionError => "ProjectionError",
            Self::ArchiveWriteError => "ArchiveWriteError",
        };
        f.write_str(name)
    }
}

impl PipelineError {
    /// Retourne la catégorie de l'erreur
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCodeFormat { .. } => ErrorKind::InvalidCodeFormat,
            Self::AreaLookupFailed { .. } => ErrorKind::AreaLookupFailed,
            Self::BoundaryNotFound { .. } => ErrorKind::BoundaryNotFound,
            Self::BufferProjection(_) => ErrorKind::BufferProjectionError,
            Self::NetworkFetchFailed { .. } => ErrorKind::NetworkFetchFailed,
            Self::Projection(_) => ErrorKind::ProjectionError,
            Self::ArchiveWrite { .. } => ErrorKind::ArchiveWriteError,
        }
    }

    /// Crée une erreur de code invalide
    pub fn invalid_code(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCodeFormat {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de lookup
    pub fn lookup_failed(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AreaLookupFailed {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de limite introuvable
    pub fn boundary_not_found(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BoundaryNotFound {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de téléchargement du réseau
    pub fn network_failed(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NetworkFetchFailed {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur d'écriture d'archive
    pub fn archive_write(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArchiveWrite {
            layer: layer.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            PipelineError::invalid_code("123", "too short").kind(),
            ErrorKind::InvalidCodeFormat
        );
        assert_eq!(
            PipelineError::boundary_not_found("X, RS, Brasil", "no polygon").kind(),
            ErrorKind::BoundaryNotFound
        );
        assert_eq!(
            PipelineError::archive_write("osm_segments_1", "disk full").kind(),
            ErrorKind::ArchiveWriteError
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let err = PipelineError::lookup_failed("4314902", "HTTP 503");
        assert_eq!(err.to_string(), "Area lookup failed for 4314902: HTTP 503");

        let err = PipelineError::boundary_not_found("Porto Alegre, RS, Brasil", "no polygon");
        assert!(err.to_string().contains("Porto Alegre, RS, Brasil"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::BufferProjectionError.to_string(), "BufferProjectionError");
        assert_eq!(ErrorKind::NetworkFetchFailed.to_string(), "NetworkFetchFailed");
    }
}
