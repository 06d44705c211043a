//! Simplification topologique
//!
//! Fusionne les chaînes de noeuds interstitiels (ni intersection, ni
//! extrémité) en une seule arête dont la géométrie suit le tracé complet.

use std::collections::{BTreeMap, HashMap, HashSet};

use geo::{Coord, LineString};
use tracing::debug;

use super::{Edge, EdgeAttributes, NetworkGraph};

/// Adjacence entrante/sortante par noeud (indices dans `graph.edges`)
struct Adjacency {
    outgoing: HashMap<i64, Vec<usize>>,
    incoming: HashMap<i64, Vec<usize>>,
}

impl Adjacency {
    fn new(graph: &NetworkGraph) -> Self {
        let mut outgoing: HashMap<i64, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<i64, Vec<usize>> = HashMap::new();
        for (idx, edge) in graph.edges.iter().enumerate() {
            outgoing.entry(edge.u).or_default().push(idx);
            incoming.entry(edge.v).or_default().push(idx);
        }
        Self { outgoing, incoming }
    }

    fn out_edges(&self, node: i64) -> &[usize] {
        self.outgoing.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn in_edges(&self, node: i64) -> &[usize] {
        self.incoming.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Vrai si le noeud doit être conservé
///
/// Un noeud est une extrémité s'il porte une boucle, s'il n'a pas d'arête
/// entrante ou sortante, ou s'il n'a pas exactement deux voisins distincts
/// avec un degré total de 2 (sens unique) ou 4 (double sens).
fn is_endpoint(graph: &NetworkGraph, adjacency: &Adjacency, node: i64) -> bool {
    let outgoing = adjacency.out_edges(node);
    let incoming = adjacency.in_edges(node);

    if outgoing.is_empty() || incoming.is_empty() {
        return true;
    }

    let neighbors: HashSet<i64> = outgoing
        .iter()
        .map(|&i| graph.edges[i].v)
        .chain(incoming.iter().map(|&i| graph.edges[i].u))
        .collect();

    if neighbors.contains(&node) {
        return true;
    }

    let degree = outgoing.len() + incoming.len();
    !(neighbors.len() == 2 && (degree == 2 || degree == 4))
}

/// Fusionne les attributs d'une suite d'arêtes
fn merge_attributes(parts: &[&Edge]) -> EdgeAttributes {
    let mut osmid: Vec<i64> = Vec::new();
    let mut length = 0.0;
    let mut tag_values: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for edge in parts {
        for id in &edge.attributes.osmid {
            if !osmid.contains(id) {
                osmid.push(*id);
            }
        }
        length += edge.attributes.length;
        for (key, value) in &edge.attributes.tags {
            let values = tag_values.entry(key.clone()).or_default();
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
    }

    let first = parts.first().map(|e| &e.attributes);
    EdgeAttributes {
        osmid,
        oneway: first.is_some_and(|a| a.oneway),
        reversed: first.is_some_and(|a| a.reversed),
        length,
        tags: tag_values
            .into_iter()
            .map(|(key, values)| (key, values.join(";")))
            .collect(),
    }
}

/// Concatène les géométries en supprimant les sommets partagés
fn merge_geometry(parts: &[&Edge]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = Vec::new();
    for edge in parts {
        for coord in &edge.geometry.0 {
            if coords.last() != Some(coord) {
                coords.push(*coord);
            }
        }
    }
    LineString::new(coords)
}

/// Simplifie le graphe en place
pub fn simplify_graph(graph: &mut NetworkGraph) {
    let adjacency = Adjacency::new(graph);
    let endpoints: HashSet<i64> = graph
        .nodes
        .keys()
        .copied()
        .filter(|&id| is_endpoint(graph, &adjacency, id))
        .collect();

    let mut used = vec![false; graph.edges.len()];
    let mut simplified: Vec<Edge> = Vec::with_capacity(graph.edges.len());

    // BTreeMap: parcours des extrémités dans l'ordre des identifiants
    let ordered_endpoints: Vec<i64> = graph
        .nodes
        .keys()
        .copied()
        .filter(|id| endpoints.contains(id))
        .collect();

    for start in ordered_endpoints {
        for &first in adjacency.out_edges(start) {
            if used[first] {
                continue;
            }
            used[first] = true;

            let mut path = vec![first];
            let mut previous = start;
            let mut current = graph.edges[first].v;

            while !endpoints.contains(&current) {
                let next = adjacency
                    .out_edges(current)
                    .iter()
                    .copied()
                    .find(|&i| !used[i] && graph.edges[i].v != previous);
                let Some(next) = next else {
                    break;
                };
                used[next] = true;
                path.push(next);
                previous = current;
                current = graph.edges[next].v;
            }

            if path.len() == 1 || !endpoints.contains(&current) {
                // Chemin non fermé sur une extrémité : arêtes conservées telles quelles
                simplified.extend(path.iter().map(|&i| graph.edges[i].clone()));
                continue;
            }

            let parts: Vec<&Edge> = path.iter().map(|&i| &graph.edges[i]).collect();
            simplified.push(Edge {
                u: start,
                v: current,
                key: 0,
                attributes: merge_attributes(&parts),
                geometry: merge_geometry(&parts),
            });
        }
    }

    // Boucles isolées sans extrémité : inchangées
    let untouched = used.iter().filter(|u| !**u).count();
    simplified.extend(
        graph
            .edges
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(edge, _)| edge.clone()),
    );

    let before_nodes = graph.node_count();
    let before_edges = graph.edge_count();
    graph.edges = simplified;
    graph.prune_isolated_nodes();
    graph.assign_keys();

    debug!(
        nodes_before = before_nodes,
        nodes_after = graph.node_count(),
        edges_before = before_edges,
        edges_after = graph.edge_count(),
        untouched_edges = untouched,
        "Graph simplified"
    );
}
