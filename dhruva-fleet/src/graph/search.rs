//! Dijkstra's shortest path over a unit-cost adjacency list.
//!
//! Every lane costs one hop regardless of its geometric length or speed
//! limit.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::types::VertexIdx;

/// State for Dijkstra's algorithm priority queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DijkstraState {
    /// Hops from the source.
    pub cost: u32,
    /// Current node index.
    pub node: usize,
}

impl Ord for DijkstraState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for DijkstraState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the fewest-hop path from `start` to `goal`, both inclusive.
///
/// Returns `[start]` when `start == goal` and an empty vector when the goal
/// is unreachable or either index is out of range.
pub fn shortest_path(
    adjacency: &[Vec<VertexIdx>],
    start: VertexIdx,
    goal: VertexIdx,
) -> Vec<VertexIdx> {
    let n = adjacency.len();
    let (start_i, goal_i) = (start.index(), goal.index());

    if start_i >= n || goal_i >= n {
        return Vec::new();
    }

    if start == goal {
        return vec![start];
    }

    let mut dist: Vec<u32> = vec![u32::MAX; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    dist[start_i] = 0;

    let mut heap = BinaryHeap::new();
    heap.push(DijkstraState {
        cost: 0,
        node: start_i,
    });

    while let Some(DijkstraState { cost, node }) = heap.pop() {
        // Stale entry
        if cost > dist[node] {
            continue;
        }

        if node == goal_i {
            break;
        }

        for neighbor in &adjacency[node] {
            let next = neighbor.index();
            let new_dist = cost + 1;
            if new_dist < dist[next] {
                dist[next] = new_dist;
                prev[next] = Some(node);
                heap.push(DijkstraState {
                    cost: new_dist,
                    node: next,
                });
            }
        }
    }

    if dist[goal_i] == u32::MAX {
        return Vec::new();
    }

    let mut path = Vec::with_capacity(dist[goal_i] as usize + 1);
    let mut current = goal_i;
    while current != start_i {
        path.push(VertexIdx::new(current));
        match prev[current] {
            Some(p) => current = p,
            None => return Vec::new(),
        }
    }
    path.push(start);
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> VertexIdx {
        VertexIdx::new(i)
    }

    fn adjacency(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<VertexIdx>> {
        let mut adj = vec![Vec::new(); n];
        for &(a, b) in edges {
            adj[a].push(v(b));
            adj[b].push(v(a));
        }
        adj
    }

    fn make_simple_graph() -> Vec<Vec<VertexIdx>> {
        // 0 --- 1 --- 2
        // |     |
        // 3 --- 4 --- 5
        adjacency(6, &[(0, 1), (1, 2), (0, 3), (1, 4), (3, 4), (4, 5)])
    }

    #[test]
    fn test_shortest_path_simple() {
        let adj = make_simple_graph();
        assert_eq!(shortest_path(&adj, v(0), v(1)), vec![v(0), v(1)]);
        assert_eq!(shortest_path(&adj, v(0), v(2)), vec![v(0), v(1), v(2)]);
    }

    #[test]
    fn test_shortest_path_same_node() {
        let adj = make_simple_graph();
        assert_eq!(shortest_path(&adj, v(3), v(3)), vec![v(3)]);
    }

    #[test]
    fn test_shortest_path_hop_count() {
        let adj = make_simple_graph();
        // 2 -> 5 is three hops either way round
        let path = shortest_path(&adj, v(2), v(5));
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), Some(&v(2)));
        assert_eq!(path.last(), Some(&v(5)));
    }

    #[test]
    fn test_shortest_path_no_path() {
        let adj = adjacency(3, &[(0, 1)]);
        assert!(shortest_path(&adj, v(0), v(2)).is_empty());
    }

    #[test]
    fn test_shortest_path_out_of_range() {
        let adj = make_simple_graph();
        assert!(shortest_path(&adj, v(0), v(42)).is_empty());
        assert!(shortest_path(&adj, v(42), v(0)).is_empty());
        assert!(shortest_path(&[], v(0), v(0)).is_empty());
    }

    #[test]
    fn test_dijkstra_state_ordering() {
        // Lower cost has higher priority
        let near = DijkstraState { cost: 1, node: 0 };
        let far = DijkstraState { cost: 2, node: 1 };
        assert!(near > far);
    }
}
