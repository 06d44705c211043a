//! Graphe routier orienté (multigraphe) construit depuis les ways OSM
//!
//! Les noeuds sont les intersections et extrémités, les arêtes les tronçons
//! entre deux noeuds. Deux arêtes parallèles entre `u` et `v` sont
//! distinguées par leur `key`.

pub mod build;
pub mod component;
pub mod simplify;

use std::collections::{BTreeMap, HashMap};

use geo::{Coord, LineString};

use crate::types::Crs;

pub use build::GraphBuilder;

/// Tags OSM conservés sur les arêtes (`oneway` est porté par un booléen dédié)
pub const EDGE_TAGS: [&str; 14] = [
    "access", "area", "bridge", "est_width", "highway", "junction", "landuse", "lanes", "maxspeed",
    "name", "ref", "service", "tunnel", "width",
];

/// Noeud du graphe
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identifiant OSM du noeud
    pub id: i64,
    pub x: f64,
    pub y: f64,
    /// Nombre de rues physiques incidentes (arêtes réciproques comptées une fois)
    pub street_count: usize,
}

impl Node {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Attributs non géométriques d'une arête
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeAttributes {
    /// Ways OSM fusionnées dans l'arête (dans l'ordre de parcours)
    pub osmid: Vec<i64>,
    pub oneway: bool,
    /// Vrai pour la copie inverse d'une voie à double sens
    pub reversed: bool,
    /// Longueur en mètres
    pub length: f64,
    /// Tags retenus (voir [`EDGE_TAGS`]); valeurs multiples jointes par `;`
    pub tags: BTreeMap<String, String>,
}

/// Arête orientée `u -> v`
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub u: i64,
    pub v: i64,
    pub key: u32,
    pub attributes: EdgeAttributes,
    pub geometry: LineString<f64>,
}

/// Multigraphe orienté
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkGraph {
    /// Crs des coordonnées des noeuds et géométries
    pub crs: Crs,
    pub nodes: BTreeMap<i64, Node>,
    pub edges: Vec<Edge>,
}

impl NetworkGraph {
    pub fn new(crs: Crs) -> Self {
        Self {
            crs,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Moyenne des coordonnées des noeuds
    pub fn node_centroid(&self) -> Option<Coord<f64>> {
        if self.nodes.is_empty() {
            return None;
        }
        let n = self.nodes.len() as f64;
        let (sx, sy) = self
            .nodes
            .values()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
        Some(Coord {
            x: sx / n,
            y: sy / n,
        })
    }

    /// Renumérote les clés des arêtes parallèles (0, 1, ...) dans l'ordre des arêtes
    pub fn assign_keys(&mut self) {
        let mut next_key: HashMap<(i64, i64), u32> = HashMap::new();
        for edge in &mut self.edges {
            let key = next_key.entry((edge.u, edge.v)).or_insert(0);
            edge.key = *key;
            *key += 1;
        }
    }

    /// Supprime les noeuds qui ne portent plus aucune arête
    pub fn prune_isolated_nodes(&mut self) {
        let mut used = std::collections::HashSet::with_capacity(self.nodes.len());
        for edge in &self.edges {
            used.insert(edge.u);
            used.insert(edge.v);
        }
        self.nodes.retain(|id, _| used.contains(id));
    }

    /// Calcule `street_count` pour chaque noeud
    ///
    /// Les arêtes réciproques d'une même voie (`u -> v` et `v -> u`) comptent
    /// pour une seule rue, une boucle compte deux fois.
    pub fn count_streets(&mut self) {
        let mut seen = std::collections::HashSet::new();
        let mut counts: HashMap<i64, usize> = HashMap::new();

        for edge in &self.edges {
            let (a, b) = if edge.u <= edge.v {
                (edge.u, edge.v)
            } else {
                (edge.v, edge.u)
            };
            let mut osmid = edge.attributes.osmid.clone();
            osmid.sort_unstable();
            if !seen.insert((a, b, osmid)) {
                continue;
            }
            *counts.entry(a).or_default() += 1;
            *counts.entry(b).or_default() += 1;
        }

        for node in self.nodes.values_mut() {
            node.street_count = counts.get(&node.id).copied().unwrap_or(0);
        }
    }
}
