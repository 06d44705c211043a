//! Éléments OSM bruts (format JSON d'Overpass)

use std::collections::HashMap;

use serde::Deserialize;

/// Réponse Overpass `[out:json]`
#[derive(Debug, Default, Deserialize)]
pub struct OsmResponse {
    #[serde(default)]
    pub elements: Vec<OsmElement>,

    /// Message de l'API quand la requête a été interrompue (timeout, mémoire)
    #[serde(default)]
    pub remark: Option<String>,
}

/// Élément OSM
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OsmElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    Relation {
        id: i64,
    },
}

impl OsmResponse {
    /// Nombre de ways dans la réponse
    pub fn way_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, OsmElement::Way { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_overpass() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": -30.03, "lon": -51.23},
                {"type": "node", "id": 2, "lat": -30.04, "lon": -51.22, "tags": {"highway": "traffic_signals"}},
                {"type": "way", "id": 10, "nodes": [1, 2], "tags": {"highway": "primary", "name": "Av. Ipiranga"}},
                {"type": "relation", "id": 99, "members": []}
            ]
        }"#;

        let response: OsmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 4);
        assert_eq!(response.way_count(), 1);
        assert!(response.remark.is_none());
        match &response.elements[2] {
            OsmElement::Way { id, nodes, tags } => {
                assert_eq!(*id, 10);
                assert_eq!(nodes, &vec![1, 2]);
                assert_eq!(tags.get("name").map(String::as_str), Some("Av. Ipiranga"));
            }
            other => panic!("Expected way, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_remark() {
        let json = r#"{"elements": [], "remark": "runtime error: Query timed out"}"#;
        let response: OsmResponse = serde_json::from_str(json).unwrap();
        assert!(response.elements.is_empty());
        assert!(response.remark.unwrap().contains("timed out"));
    }
}
