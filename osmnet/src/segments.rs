//! Conversion du graphe en table de segments

use std::collections::BTreeMap;

use geo::LineString;

use crate::graph::NetworkGraph;
use crate::types::Crs;

/// Un tronçon de rue exporté comme feature linéaire
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub u: i64,
    pub v: i64,
    pub key: u32,
    pub osmid: Vec<i64>,
    pub oneway: bool,
    pub reversed: bool,
    /// Longueur en mètres
    pub length: f64,
    pub tags: BTreeMap<String, String>,
    pub geometry: LineString<f64>,
}

impl Segment {
    /// `osmid` au format texte : identifiant seul ou liste entre crochets
    pub fn osmid_text(&self) -> String {
        match self.osmid.as_slice() {
            [single] => single.to_string(),
            ids => format!(
                "[{}]",
                ids.iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Table de segments, dans l'ordre des arêtes du graphe
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTable {
    /// `None` une fois le tag de Crs retiré
    pub crs: Option<Crs>,
    pub segments: Vec<Segment>,
}

impl SegmentTable {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Emprise `(min_x, min_y, max_x, max_y)` des géométries
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.segments
            .iter()
            .flat_map(|s| s.geometry.0.iter())
            .fold(None, |acc, c| match acc {
                None => Some((c.x, c.y, c.x, c.y)),
                Some((min_x, min_y, max_x, max_y)) => Some((
                    min_x.min(c.x),
                    min_y.min(c.y),
                    max_x.max(c.x),
                    max_y.max(c.y),
                )),
            })
    }
}

/// Une ligne par arête, dans l'ordre ; les noeuds ne sont pas exportés
pub fn extract_segments(graph: NetworkGraph) -> SegmentTable {
    let segments = graph
        .edges
        .into_iter()
        .map(|edge| Segment {
            u: edge.u,
            v: edge.v,
            key: edge.key,
            osmid: edge.attributes.osmid,
            oneway: edge.attributes.oneway,
            reversed: edge.attributes.reversed,
            length: edge.attributes.length,
            tags: edge.attributes.tags,
            geometry: edge.geometry,
        })
        .collect();

    SegmentTable {
        crs: Some(graph.crs),
        segments,
    }
}

/// Retire le tag de Crs sans toucher aux coordonnées
///
/// Le consommateur devra réassigner le Crs (zone UTM) après chargement.
pub fn strip_crs(mut table: SegmentTable) -> SegmentTable {
    table.crs = None;
    table
}
