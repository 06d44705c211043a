//! Composante connexe principale et découpage par polygone

use std::collections::{HashMap, HashSet};

use geo::{Intersects, MultiPolygon, Point};
use tracing::debug;

use super::NetworkGraph;

/// Union-find sur les identifiants de noeuds
struct DisjointSet {
    parent: HashMap<i64, i64>,
}

impl DisjointSet {
    fn new(ids: impl Iterator<Item = i64>) -> Self {
        Self {
            parent: ids.map(|id| (id, id)).collect(),
        }
    }

    fn find(&mut self, id: i64) -> i64 {
        let mut root = id;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        // Compression de chemin
        let mut current = id;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: i64, b: i64) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Racine = plus petit identifiant, pour un résultat déterministe
            let (keep, merge) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent.insert(merge, keep);
        }
    }
}

/// Ne garde que la plus grande composante faiblement connexe
///
/// En cas d'égalité, la composante contenant le plus petit identifiant de
/// noeud l'emporte.
pub fn retain_largest_component(graph: &mut NetworkGraph) {
    if graph.nodes.is_empty() {
        return;
    }

    let mut sets = DisjointSet::new(graph.nodes.keys().copied());
    for edge in &graph.edges {
        sets.union(edge.u, edge.v);
    }

    let mut sizes: HashMap<i64, usize> = HashMap::new();
    let ids: Vec<i64> = graph.nodes.keys().copied().collect();
    for &id in &ids {
        *sizes.entry(sets.find(id)).or_default() += 1;
    }

    let Some((&largest, _)) = sizes
        .iter()
        .max_by(|(ra, sa), (rb, sb)| sa.cmp(sb).then(rb.cmp(ra)))
    else {
        return;
    };

    let keep: HashSet<i64> = ids
        .into_iter()
        .filter(|&id| sets.find(id) == largest)
        .collect();

    let before = graph.node_count();
    graph.nodes.retain(|id, _| keep.contains(id));
    graph
        .edges
        .retain(|e| keep.contains(&e.u) && keep.contains(&e.v));

    debug!(
        components = sizes.len(),
        kept = graph.node_count(),
        dropped = before - graph.node_count(),
        "Largest weakly connected component retained"
    );
}

/// Supprime les noeuds hors du polygone et les arêtes qui y sont rattachées
///
/// Un noeud sur le bord du polygone est conservé.
pub fn truncate_to_polygon(graph: &mut NetworkGraph, polygon: &MultiPolygon<f64>) {
    let before = graph.node_count();
    graph
        .nodes
        .retain(|_, node| polygon.intersects(&Point::new(node.x, node.y)));
    let nodes = &graph.nodes;
    graph
        .edges
        .retain(|e| nodes.contains_key(&e.u) && nodes.contains_key(&e.v));

    debug!(
        removed = before - graph.node_count(),
        remaining = graph.node_count(),
        "Graph truncated to clipping polygon"
    );
}
