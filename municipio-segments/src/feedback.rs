//! Retour de progression vers l'hôte

use tracing::{error, info};

/// Puits de messages de progression
///
/// Le pipeline ne dépend d'aucune interface : l'hôte décide de l'affichage.
pub trait Feedback: Send + Sync {
    fn push_info(&self, message: &str);
    fn report_error(&self, message: &str);
}

/// Transmet les messages à `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn push_info(&self, message: &str) {
        info!(target: "municipio_segments::feedback", "{}", message);
    }

    fn report_error(&self, message: &str) {
        error!(target: "municipio_segments::feedback", "{}", message);
    }
}
