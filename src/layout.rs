//! Layered auto-layout for workflow graphs.
//!
//! Positions are computed with the Sugiyama algorithm (rank assignment,
//! crossing reduction, coordinate assignment) over a graph built purely from
//! node ids and edge endpoints. Every node occupies a fixed logical box of
//! 200x80; ranks flow top to bottom with a 100 unit rank gap and an 80 unit
//! sibling gap. The algorithm works on box centers; stored positions are the
//! corresponding top-left corners.

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use log::{debug, warn};
use rust_sugiyama::configure::Config;

use crate::flow::{FlowEdge, FlowNode, Position};

/// Logical node box width.
pub const NODE_WIDTH: f64 = 200.0;
/// Logical node box height.
pub const NODE_HEIGHT: f64 = 80.0;
/// Minimum horizontal gap between sibling boxes.
pub const SIBLING_GAP: f64 = 80.0;
/// Minimum vertical gap between rank boxes.
pub const RANK_GAP: f64 = 100.0;

const COLUMN_PITCH: f64 = NODE_WIDTH + SIBLING_GAP;
const RANK_PITCH: f64 = NODE_HEIGHT + RANK_GAP;

/// Assigns a position to every node and returns the repositioned nodes.
///
/// Edges whose endpoints are not in the node set are ignored. Cycles are
/// tolerated: back edges are dropped before ranking. Nodes the algorithm does
/// not place keep their prior position; an empty node set is returned
/// unchanged.
pub fn auto_layout(nodes: Vec<FlowNode>, edges: &[FlowEdge]) -> Vec<FlowNode> {
    if nodes.is_empty() {
        return nodes;
    }

    let pairs = {
        let ids: AHashMap<&str, u32> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index as u32))
            .collect();

        let mut seen = AHashSet::new();
        let mut pairs = Vec::new();
        for edge in edges {
            let (Some(&source), Some(&target)) =
                (ids.get(edge.source.as_str()), ids.get(edge.target.as_str()))
            else {
                continue;
            };
            if source == target {
                continue;
            }
            if seen.insert((source, target)) {
                pairs.push((source, target));
            }
        }
        break_cycles(pairs)
    };

    let incident: AHashSet<u32> = pairs.iter().flat_map(|&(s, t)| [s, t]).collect();

    let mut centers: AHashMap<u32, (f64, f64)> = AHashMap::new();
    let mut x_cursor = 0.0_f64;

    if !pairs.is_empty() {
        debug!(
            "laying out {} nodes over {} edges",
            incident.len(),
            pairs.len()
        );
        match layered_components(&pairs) {
            Some(components) => {
                for component in components {
                    place_component(&component, &pairs, &mut centers, &mut x_cursor);
                }
            }
            None => {
                warn!("layered layout failed; keeping prior node positions");
                return nodes;
            }
        }
    }

    // Nodes with no usable edge land on a row of their own beneath the
    // connected layout.
    let lowest = centers
        .values()
        .map(|&(_, cy)| cy)
        .fold(f64::NEG_INFINITY, f64::max);
    let row_y = if lowest.is_finite() {
        lowest + RANK_PITCH
    } else {
        NODE_HEIGHT / 2.0
    };
    let mut row_x = NODE_WIDTH / 2.0;

    nodes
        .into_iter()
        .enumerate()
        .map(|(index, mut node)| {
            let index = index as u32;
            let center = match centers.get(&index) {
                Some(&center) => center,
                None if !incident.contains(&index) => {
                    let center = (row_x, row_y);
                    row_x += COLUMN_PITCH;
                    center
                }
                // Incident to an edge but missing from the algorithm's
                // output: keep the prior position.
                None => return node,
            };
            node.position = Position {
                x: center.0 - NODE_WIDTH / 2.0,
                y: center.1 - NODE_HEIGHT / 2.0,
            };
            node
        })
        .collect()
}

/// Runs the Sugiyama crate over the edge pairs, one layout per weakly
/// connected component. Returns `None` if the algorithm panics.
fn layered_components(pairs: &[(u32, u32)]) -> Option<Vec<Vec<(u32, (f64, f64))>>> {
    let edges = pairs.to_vec();
    let layouts = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: COLUMN_PITCH,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
    })
    .ok()?;

    let mut components = Vec::new();
    for (coords, _, _) in &layouts {
        let mut component = Vec::new();
        for &(id, (x, y)) in coords {
            if (id as u64) > u32::MAX as u64 {
                continue;
            }
            component.push((id as u32, (x as f64, y as f64)));
        }
        if !component.is_empty() {
            components.push(component);
        }
    }
    Some(components)
}

/// Maps one component's raw coordinates onto the logical grid, appending it
/// to the right of everything placed so far.
fn place_component(
    component: &[(u32, (f64, f64))],
    pairs: &[(u32, u32)],
    centers: &mut AHashMap<u32, (f64, f64)>,
    x_cursor: &mut f64,
) {
    // Re-derive ranks from the distinct layer coordinates so the vertical
    // pitch is ours, not the algorithm's.
    let layer_ys: Vec<f64> = component
        .iter()
        .map(|&(_, (_, y))| y)
        .sorted_by(f64::total_cmp)
        .dedup_by(|a, b| (a - b).abs() < 1e-6)
        .collect();
    let rank_of = |y: f64| {
        layer_ys
            .iter()
            .position(|&layer| (layer - y).abs() < 1e-6)
            .unwrap_or(0)
    };
    let max_rank = layer_ys.len().saturating_sub(1);

    // Orient the component so edges point downward on balance.
    let members: AHashSet<u32> = component.iter().map(|&(id, _)| id).collect();
    let ranks: AHashMap<u32, usize> = component
        .iter()
        .map(|&(id, (_, y))| (id, rank_of(y)))
        .collect();
    let mut downward = 0_i64;
    for &(source, target) in pairs {
        if !members.contains(&source) || !members.contains(&target) {
            continue;
        }
        match (ranks.get(&source), ranks.get(&target)) {
            (Some(&s), Some(&t)) if t > s => downward += 1,
            (Some(&s), Some(&t)) if t < s => downward -= 1,
            _ => {}
        }
    }
    let flip = downward < 0;

    let min_x = component
        .iter()
        .map(|&(_, (x, _))| x)
        .fold(f64::INFINITY, f64::min);
    let max_x = component
        .iter()
        .map(|&(_, (x, _))| x)
        .fold(f64::NEG_INFINITY, f64::max);

    for &(id, (x, y)) in component {
        let mut rank = rank_of(y);
        if flip {
            rank = max_rank - rank;
        }
        let cx = *x_cursor + (x - min_x) + NODE_WIDTH / 2.0;
        let cy = NODE_HEIGHT / 2.0 + rank as f64 * RANK_PITCH;
        centers.insert(id, (cx, cy));
    }

    *x_cursor += (max_x - min_x) + NODE_WIDTH + SIBLING_GAP;
}

/// Drops DFS back edges so the remaining pairs form a DAG.
fn break_cycles(pairs: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    const WHITE: u8 = 0;
    const GRAY: u8 = 1;
    const BLACK: u8 = 2;

    let mut adjacency: AHashMap<u32, Vec<(usize, u32)>> = AHashMap::new();
    let mut order: Vec<u32> = Vec::new();
    let mut known = AHashSet::new();
    for (index, &(source, target)) in pairs.iter().enumerate() {
        adjacency.entry(source).or_default().push((index, target));
        for endpoint in [source, target] {
            if known.insert(endpoint) {
                order.push(endpoint);
            }
        }
    }

    let mut state: AHashMap<u32, u8> = AHashMap::new();
    let mut dropped: AHashSet<usize> = AHashSet::new();

    for &root in &order {
        if state.get(&root).copied().unwrap_or(WHITE) != WHITE {
            continue;
        }
        state.insert(root, GRAY);
        let mut stack: Vec<(u32, usize)> = vec![(root, 0)];
        while let Some((node, cursor)) = stack.pop() {
            let next = adjacency
                .get(&node)
                .and_then(|targets| targets.get(cursor))
                .copied();
            match next {
                Some((edge_index, target)) => {
                    stack.push((node, cursor + 1));
                    match state.get(&target).copied().unwrap_or(WHITE) {
                        GRAY => {
                            dropped.insert(edge_index);
                        }
                        WHITE => {
                            state.insert(target, GRAY);
                            stack.push((target, 0));
                        }
                        _ => {}
                    }
                }
                None => {
                    state.insert(node, BLACK);
                }
            }
        }
    }

    if !dropped.is_empty() {
        debug!("dropped {} back edges before ranking", dropped.len());
    }

    pairs
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !dropped.contains(index))
        .map(|(_, pair)| pair)
        .collect()
}
