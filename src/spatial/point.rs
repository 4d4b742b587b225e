use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use super::{Rect, SpatialError};

pub const DEFAULT_LEAF_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
struct PointNode<K> {
    rect: Rect,
    points: Vec<(K, i32, i32)>,
    children: Vec<PointNode<K>>,
}

impl<K: Copy + Eq> PointNode<K> {
    fn leaf(rect: Rect) -> Self {
        Self {
            rect,
            points: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn count(&self) -> usize {
        self.points.len() + self.children.iter().map(PointNode::count).sum::<usize>()
    }

    fn insert(&mut self, id: K, x: i32, y: i32, capacity: usize) {
        if !self.is_leaf() {
            if let Some(child) = self.children.iter_mut().find(|c| c.rect.contains(x, y)) {
                child.insert(id, x, y, capacity);
            }
            return;
        }

        self.points.push((id, x, y));
        if self.points.len() > capacity {
            self.subdivide(capacity);
        }
    }

    fn subdivide(&mut self, capacity: usize) {
        let quads = self.rect.quadrants();
        if quads.is_empty() {
            // Single cell: stacked points stay here.
            return;
        }
        self.children = quads.into_iter().map(PointNode::leaf).collect();
        for (id, x, y) in std::mem::take(&mut self.points) {
            self.insert(id, x, y, capacity);
        }
    }

    fn remove(&mut self, id: K, x: i32, y: i32, capacity: usize) -> bool {
        if self.is_leaf() {
            let before = self.points.len();
            self.points.retain(|(pid, _, _)| *pid != id);
            return self.points.len() != before;
        }

        let removed = self
            .children
            .iter_mut()
            .find(|c| c.rect.contains(x, y))
            .map(|child| child.remove(id, x, y, capacity))
            .unwrap_or(false);

        if removed && self.count() <= capacity {
            let mut gathered = Vec::new();
            self.drain_into(&mut gathered);
            self.children.clear();
            self.points = gathered;
        }
        removed
    }

    fn drain_into(&mut self, out: &mut Vec<(K, i32, i32)>) {
        out.append(&mut self.points);
        for child in self.children.iter_mut() {
            child.drain_into(out);
        }
    }

    fn query(&self, area: &Rect, out: &mut Vec<K>) {
        if !self.rect.intersects(area) {
            return;
        }
        out.extend(
            self.points
                .iter()
                .filter(|(_, x, y)| area.contains(*x, *y))
                .map(|(id, _, _)| *id),
        );
        for child in &self.children {
            child.query(area, out);
        }
    }

    fn depth(&self) -> usize {
        1 + self.children.iter().map(PointNode::depth).max().unwrap_or(0)
    }
}

/// Point-valued quad-tree over `width x height` cells.
///
/// A node splits once it holds more than `leaf_capacity` points and merges
/// back when a removal drops its subtree to capacity. The split state only
/// changes mutation cost; queries always see every indexed point.
#[derive(Debug, Clone)]
pub struct PointIndex<K> {
    root: PointNode<K>,
    positions: HashMap<K, (i32, i32)>,
    leaf_capacity: usize,
}

impl<K> PointIndex<K>
where
    K: Copy + Eq + Hash + Ord + Debug,
{
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_capacity(width, height, DEFAULT_LEAF_CAPACITY)
    }

    pub fn with_capacity(width: i32, height: i32, leaf_capacity: usize) -> Self {
        Self {
            root: PointNode::leaf(Rect::new(0, 0, width.max(1), height.max(1))),
            positions: HashMap::new(),
            leaf_capacity: leaf_capacity.max(1),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.root.rect
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, id: K) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn position(&self, id: K) -> Option<(i32, i32)> {
        self.positions.get(&id).copied()
    }

    pub fn insert(&mut self, id: K, x: i32, y: i32) -> Result<(), SpatialError> {
        self.check_bounds(x, y)?;
        if self.positions.contains_key(&id) {
            return Err(SpatialError::AlreadyIndexed(format!("{:?}", id)));
        }
        self.root.insert(id, x, y, self.leaf_capacity);
        self.positions.insert(id, (x, y));
        Ok(())
    }

    /// Relocate an indexed id. Fails without touching the tree when the id is
    /// absent or the target is out of bounds.
    pub fn move_to(&mut self, id: K, x: i32, y: i32) -> Result<(), SpatialError> {
        self.check_bounds(x, y)?;
        let Some(&(old_x, old_y)) = self.positions.get(&id) else {
            return Err(SpatialError::NotIndexed(format!("{:?}", id)));
        };
        self.root.remove(id, old_x, old_y, self.leaf_capacity);
        self.root.insert(id, x, y, self.leaf_capacity);
        self.positions.insert(id, (x, y));
        Ok(())
    }

    pub fn remove(&mut self, id: K) -> Result<(i32, i32), SpatialError> {
        let Some((x, y)) = self.positions.remove(&id) else {
            return Err(SpatialError::NotIndexed(format!("{:?}", id)));
        };
        self.root.remove(id, x, y, self.leaf_capacity);
        Ok((x, y))
    }

    pub fn get(&self, x: i32, y: i32) -> BTreeSet<K> {
        self.get_in(x, y, 1, 1)
    }

    pub fn get_in(&self, x: i32, y: i32, w: i32, h: i32) -> BTreeSet<K> {
        let area = Rect::new(x, y, w, h);
        let mut found = Vec::new();
        if !area.is_empty() {
            self.root.query(&area, &mut found);
        }
        found.into_iter().collect()
    }

    pub fn all(&self) -> BTreeSet<K> {
        self.positions.keys().copied().collect()
    }

    /// Current tree depth; a single leaf is depth 1.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    fn check_bounds(&self, x: i32, y: i32) -> Result<(), SpatialError> {
        if self.root.rect.contains(x, y) {
            Ok(())
        } else {
            Err(SpatialError::OutOfBounds {
                x,
                y,
                width: self.root.rect.w,
                height: self.root.rect.h,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_move_remove_cycle() {
        let mut index: PointIndex<u64> = PointIndex::new(100, 100);
        index.insert(7, 10, 10).unwrap();
        assert!(index.get(10, 10).contains(&7));

        index.move_to(7, 12, 40).unwrap();
        assert!(!index.get(10, 10).contains(&7));
        assert!(index.get(12, 40).contains(&7));
        assert_eq!(index.position(7), Some((12, 40)));

        index.remove(7).unwrap();
        assert!(!index.all().contains(&7));
        assert!(index.get(12, 40).is_empty());
    }

    #[test]
    fn absent_ids_fail_explicitly() {
        let mut index: PointIndex<u64> = PointIndex::new(10, 10);
        assert!(matches!(index.move_to(1, 2, 2), Err(SpatialError::NotIndexed(_))));
        assert!(matches!(index.remove(1), Err(SpatialError::NotIndexed(_))));
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut index: PointIndex<u64> = PointIndex::new(10, 10);
        assert!(matches!(
            index.insert(1, 10, 0),
            Err(SpatialError::OutOfBounds { .. })
        ));
        index.insert(1, 0, 0).unwrap();
        assert!(index.move_to(1, -1, 0).is_err());
        assert_eq!(index.position(1), Some((0, 0)));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut index: PointIndex<u64> = PointIndex::new(10, 10);
        index.insert(1, 0, 0).unwrap();
        assert!(matches!(index.insert(1, 5, 5), Err(SpatialError::AlreadyIndexed(_))));
    }

    #[test]
    fn subdivision_does_not_change_queries() {
        let mut small: PointIndex<u64> = PointIndex::with_capacity(64, 64, 2);
        let mut flat: PointIndex<u64> = PointIndex::with_capacity(64, 64, 10_000);
        let mut seed = 17u64;
        for id in 0..200u64 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            let x = ((seed >> 33) % 64) as i32;
            let y = ((seed >> 13) % 64) as i32;
            small.insert(id, x, y).unwrap();
            flat.insert(id, x, y).unwrap();
        }
        assert!(small.depth() > 1);
        assert_eq!(flat.depth(), 1);

        for id in (0..200u64).step_by(3) {
            small.remove(id).unwrap();
            flat.remove(id).unwrap();
        }

        assert_eq!(small.all(), flat.all());
        assert_eq!(small.get_in(8, 8, 30, 20), flat.get_in(8, 8, 30, 20));
        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(small.get(x, y), flat.get(x, y));
            }
        }
    }

    #[test]
    fn stacked_points_share_a_cell() {
        let mut index: PointIndex<u64> = PointIndex::with_capacity(4, 4, 1);
        for id in 0..5 {
            index.insert(id, 3, 3).unwrap();
        }
        assert_eq!(index.get(3, 3).len(), 5);
        index.remove(2).unwrap();
        assert_eq!(index.get(3, 3).len(), 4);
    }

    #[test]
    fn removal_collapses_the_tree() {
        let mut index: PointIndex<u64> = PointIndex::with_capacity(32, 32, 2);
        for id in 0..6 {
            index.insert(id, id as i32 * 5, id as i32 * 5).unwrap();
        }
        assert!(index.depth() > 1);
        for id in 0..5 {
            index.remove(id).unwrap();
        }
        assert_eq!(index.depth(), 1);
        assert_eq!(index.all().into_iter().collect::<Vec<_>>(), vec![5]);
    }
}
