//! Projection du graphe dans la zone UTM locale

use geo::Coord;
use tracing::debug;

use osmnet::{Crs, NetworkGraph, PipelineError};

use crate::reproject_lite::{utm_crs_for, SmartReprojector};

/// Crs métrique retenu pour un graphe WGS84 : zone UTM du centroïde des nœuds
pub fn target_crs(graph: &NetworkGraph) -> Result<Crs, PipelineError> {
    if !graph.crs.is_geographic() {
        return Err(PipelineError::Projection(format!(
            "graph must be in {}, got {}",
            Crs::WGS84,
            graph.crs
        )));
    }
    let centroid = graph
        .node_centroid()
        .ok_or_else(|| PipelineError::Projection("graph has no nodes".to_string()))?;

    utm_crs_for(centroid.x, centroid.y).map_err(|e| PipelineError::Projection(format!("{:#}", e)))
}

/// Reprojette nœuds et géométries des arêtes
///
/// Les longueurs, déjà en mètres, ne sont pas modifiées.
pub fn project_graph(mut graph: NetworkGraph) -> Result<NetworkGraph, PipelineError> {
    let target = target_crs(&graph)?;
    let reprojector = SmartReprojector::new(graph.crs, target)
        .map_err(|e| PipelineError::Projection(format!("{:#}", e)))?;
    debug!(crs = %target, backend = reprojector.description(), "Projecting graph");

    let failed = |e: anyhow::Error| PipelineError::Projection(format!("{:#}", e));

    for node in graph.nodes.values_mut() {
        let Coord { x, y } = reprojector.transform_coord(node.coord()).map_err(failed)?;
        node.x = x;
        node.y = y;
    }
    for edge in &mut graph.edges {
        edge.geometry = reprojector.transform_geometry(&edge.geometry).map_err(failed)?;
    }

    graph.crs = target;
    Ok(graph)
}
