use crate::agent::Agent;
use rstar::{RTree, RTreeObject, AABB};

/// Agent id and position, the only data the proximity index needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentLocation {
    pub id: u32,
    pub position: [f64; 2],
}

impl RTreeObject for AgentLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Build an R*-tree over agent positions via bulk_load (O(n log n)).
pub fn build_index(agents: &[Agent]) -> RTree<AgentLocation> {
    RTree::bulk_load(
        agents
            .iter()
            .map(|a| AgentLocation {
                id: a.id,
                position: a.position,
            })
            .collect(),
    )
}

/// Ids of agents within Euclidean `radius` of `center`, sorted ascending.
/// Uses an AABB envelope query, then filters by distance.
pub fn query_neighbors(tree: &RTree<AgentLocation>, center: [f64; 2], radius: f64) -> Vec<u32> {
    let envelope = AABB::from_corners(
        [center[0] - radius, center[1] - radius],
        [center[0] + radius, center[1] + radius],
    );
    let r_sq = radius * radius;

    let mut ids: Vec<u32> = tree
        .locate_in_envelope(&envelope)
        .filter(|loc| {
            let dx = loc.position[0] - center[0];
            let dy = loc.position[1] - center[1];
            dx * dx + dy * dy <= r_sq
        })
        .map(|loc| loc.id)
        .collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Emotion;

    #[test]
    fn finds_only_agents_inside_radius() {
        let agents = vec![
            Agent::new(0, [1.0, 1.0], Emotion::Joy),
            Agent::new(1, [2.5, 1.0], Emotion::Sorrow),
            Agent::new(2, [6.0, 6.0], Emotion::Joy),
        ];
        let tree = build_index(&agents);
        assert_eq!(query_neighbors(&tree, [1.0, 1.0], 2.0), vec![0, 1]);
        assert_eq!(query_neighbors(&tree, [6.0, 5.5], 1.0), vec![2]);
        assert!(query_neighbors(&tree, [4.0, 4.0], 0.5).is_empty());
    }

    #[test]
    fn empty_index_returns_nothing() {
        let tree = build_index(&[]);
        assert!(query_neighbors(&tree, [0.0, 0.0], 10.0).is_empty());
    }
}
