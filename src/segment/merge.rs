//! Merging fragments of multi-part sprites.

use crate::types::Rect;

/// Union-find over component indices. Roots are always the smallest
/// index in their set.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = i;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        let (keep, absorb) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[absorb] = keep;
        true
    }
}

/// Union components whose centers are within `distance` or whose boxes
/// overlap once grown by `padding`; each group becomes its enclosing box.
///
/// Grouping is transitive. Output is ordered by each group's first member.
pub fn merge_components(rects: &[Rect], distance: f64, padding: u32) -> Vec<Rect> {
    let mut sets = DisjointSet::new(rects.len());

    for i in 0..rects.len() {
        for j in i + 1..rects.len() {
            let (a, b) = (&rects[i], &rects[j]);
            if a.center_distance(b) <= distance || a.overlaps_padded(b, padding) {
                sets.union(i, j);
            }
        }
    }

    let mut merged: Vec<Option<Rect>> = vec![None; rects.len()];
    for (i, rect) in rects.iter().enumerate() {
        let root = sets.find(i);
        merged[root] = Some(match merged[root] {
            None => *rect,
            Some(group) => group.union(rect),
        });
    }

    merged.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_close_centers_merge() {
        let head = Rect::new(10, 10, 10, 10);
        let body = Rect::new(12, 22, 10, 10);
        let far = Rect::new(80, 80, 10, 10);

        let merged = merge_components(&[head, body, far], 15.0, 1);
        assert_eq!(merged, vec![Rect::new(10, 10, 12, 22), far]);
    }

    #[test]
    fn test_padded_overlap_merges_distant_centers() {
        // Centers 40px apart, but the boxes are separated by a 1px gap.
        let left = Rect::new(0, 0, 40, 10);
        let right = Rect::new(41, 0, 40, 10);
        assert_eq!(merge_components(&[left, right], 15.0, 1).len(), 1);
        assert_eq!(merge_components(&[left, right], 15.0, 0).len(), 2);
    }

    #[test]
    fn test_merging_is_transitive() {
        // a-b and b-c are close, a-c are not.
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(12, 0, 10, 10);
        let c = Rect::new(24, 0, 10, 10);
        assert_eq!(a.center_distance(&c), 24.0);

        let merged = merge_components(&[a, b, c], 15.0, 0);
        assert_eq!(merged, vec![Rect::new(0, 0, 34, 10)]);
    }

    #[test]
    fn test_separated_tiles_untouched() {
        let tiles: Vec<Rect> = (0..4).map(|i| Rect::new(i * 32 + 2, 2, 28, 28)).collect();
        assert_eq!(merge_components(&tiles, 15.0, 1), tiles);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_components(&[], 15.0, 1).is_empty());
    }
}
