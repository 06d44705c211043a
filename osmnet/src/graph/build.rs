//! Construction du graphe depuis une réponse Overpass

use std::collections::{BTreeMap, HashMap};

use geo::{Coord, Haversine, Length, LineString, MultiPolygon};
use tracing::{debug, warn};

use super::component::{retain_largest_component, truncate_to_polygon};
use super::simplify::simplify_graph;
use super::{Edge, EdgeAttributes, NetworkGraph, Node, EDGE_TAGS};
use crate::osm::{OsmElement, OsmResponse};
use crate::profile::NetworkType;
use crate::types::Crs;

/// Valeurs de `oneway` signifiant un sens unique
const ONEWAY_VALUES: [&str; 5] = ["yes", "true", "1", "-1", "reverse"];

/// Valeurs de `oneway` signifiant un sens unique inversé
const REVERSED_VALUES: [&str; 2] = ["-1", "reverse"];

/// Construit un graphe routier à partir des éléments OSM
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder {
    network_type: NetworkType,
}

impl GraphBuilder {
    pub fn new(network_type: NetworkType) -> Self {
        Self { network_type }
    }

    /// Construit le graphe et le découpe selon `clip`
    ///
    /// Étapes : graphe brut, composante principale, simplification, découpage,
    /// composante principale, comptage des rues. Le graphe peut être vide.
    pub fn build(&self, response: &OsmResponse, clip: &MultiPolygon<f64>) -> NetworkGraph {
        let mut graph = self.raw_graph(response);
        debug!(
            network_type = %self.network_type,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Raw graph built"
        );

        retain_largest_component(&mut graph);
        simplify_graph(&mut graph);
        graph.count_streets();

        // street_count est calculé avant découpage : un noeud en bordure
        // garde le compte des rues qui sortent du polygone
        let street_counts: HashMap<i64, usize> = graph
            .nodes
            .values()
            .map(|n| (n.id, n.street_count))
            .collect();

        truncate_to_polygon(&mut graph, clip);
        retain_largest_component(&mut graph);
        graph.prune_isolated_nodes();

        for node in graph.nodes.values_mut() {
            node.street_count = street_counts.get(&node.id).copied().unwrap_or(0);
        }

        graph
    }

    /// Graphe non simplifié : une arête par paire de noeuds consécutifs d'une way
    fn raw_graph(&self, response: &OsmResponse) -> NetworkGraph {
        let mut coords: HashMap<i64, Coord<f64>> = HashMap::new();
        for element in &response.elements {
            if let OsmElement::Node { id, lat, lon, .. } = element {
                coords.insert(*id, Coord { x: *lon, y: *lat });
            }
        }

        let mut graph = NetworkGraph::new(Crs::WGS84);
        let mut missing_nodes = 0usize;

        for element in &response.elements {
            let OsmElement::Way { id, nodes, tags } = element else {
                continue;
            };

            let mut path: Vec<i64> = Vec::with_capacity(nodes.len());
            for node_id in nodes {
                if !coords.contains_key(node_id) {
                    missing_nodes += 1;
                    continue;
                }
                if path.last() != Some(node_id) {
                    path.push(*node_id);
                }
            }
            if path.len() < 2 {
                continue;
            }

            let oneway = self.is_one_way(tags);
            if oneway && is_reversed(tags) {
                path.reverse();
            }

            let kept_tags: BTreeMap<String, String> = EDGE_TAGS
                .iter()
                .filter_map(|key| tags.get(*key).map(|v| ((*key).to_string(), v.clone())))
                .collect();

            for pair in path.windows(2) {
                let (u, v) = (pair[0], pair[1]);
                let segment = LineString::new(vec![coords[&u], coords[&v]]);
                let attributes = EdgeAttributes {
                    osmid: vec![*id],
                    oneway,
                    reversed: false,
                    length: Haversine.length(&segment),
                    tags: kept_tags.clone(),
                };

                if !oneway {
                    let mut back = LineString::new(segment.0.clone());
                    back.0.reverse();
                    graph.edges.push(Edge {
                        u: v,
                        v: u,
                        key: 0,
                        attributes: EdgeAttributes {
                            reversed: true,
                            ..attributes.clone()
                        },
                        geometry: back,
                    });
                }
                graph.edges.push(Edge {
                    u,
                    v,
                    key: 0,
                    attributes,
                    geometry: segment,
                });
            }

            for node_id in &path {
                let c = coords[node_id];
                graph.nodes.entry(*node_id).or_insert(Node {
                    id: *node_id,
                    x: c.x,
                    y: c.y,
                    street_count: 0,
                });
            }
        }

        if missing_nodes > 0 {
            warn!(
                missing_nodes,
                "Ways reference nodes absent from the response; references skipped"
            );
        }

        // Arêtes aller avant retour, dans l'ordre des ways
        graph.edges.sort_by_key(|e| e.attributes.reversed);
        graph.assign_keys();
        graph
    }

    fn is_one_way(&self, tags: &HashMap<String, String>) -> bool {
        if self.network_type.is_bidirectional() {
            return false;
        }
        if let Some(value) = tags.get("oneway") {
            if ONEWAY_VALUES.contains(&value.as_str()) {
                return true;
            }
        }
        tags.get("junction").map(String::as_str) == Some("roundabout")
    }
}

fn is_reversed(tags: &HashMap<String, String>) -> bool {
    tags.get("oneway")
        .is_some_and(|v| REVERSED_VALUES.contains(&v.as_str()))
}
