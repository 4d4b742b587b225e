use super::{Rect, SpatialError};

#[derive(Debug, Clone)]
struct RegionNode<T> {
    rect: Rect,
    kind: NodeKind<T>,
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    /// Uniform coverage; `None` means "never written", which reads as the default.
    Leaf(Option<T>),
    Branch(Vec<RegionNode<T>>),
}

/// Rectangle-valued overlay over a fixed `width x height` area.
///
/// The most recent insert wins inside any overlap. Cells that were never
/// written resolve to the configured default, so there are no coverage gaps.
#[derive(Debug, Clone)]
pub struct RegionIndex<T> {
    default: T,
    root: RegionNode<T>,
}

impl<T: Clone + PartialEq> RegionIndex<T> {
    pub fn new(width: i32, height: i32, default: T) -> Self {
        Self {
            default,
            root: RegionNode {
                rect: Rect::new(0, 0, width.max(1), height.max(1)),
                kind: NodeKind::Leaf(None),
            },
        }
    }

    pub fn bounds(&self) -> Rect {
        self.root.rect
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Overwrite the rectangle with `value`. The rectangle is clamped to the
    /// index bounds; one with no overlap at all is rejected.
    pub fn insert(&mut self, value: T, x: i32, y: i32, w: i32, h: i32) -> Result<(), SpatialError> {
        let requested = Rect::new(x, y, w, h);
        let Some(clamped) = self.root.rect.intersection(&requested) else {
            return Err(SpatialError::EmptyRegion(requested));
        };
        insert_into(&mut self.root, &clamped, &value);
        Ok(())
    }

    pub fn get(&self, x: i32, y: i32) -> T {
        if !self.root.rect.contains(x, y) {
            return self.default.clone();
        }
        let mut node = &self.root;
        loop {
            match &node.kind {
                NodeKind::Leaf(value) => {
                    return value.clone().unwrap_or_else(|| self.default.clone());
                }
                NodeKind::Branch(children) => {
                    match children.iter().find(|child| child.rect.contains(x, y)) {
                        Some(child) => node = child,
                        None => return self.default.clone(),
                    }
                }
            }
        }
    }

    /// Disjoint rectangles carrying an explicitly written value. Re-inserting
    /// them into a fresh index with the same default reproduces this one.
    pub fn regions(&self) -> Vec<(Rect, T)> {
        let mut out = Vec::new();
        collect_regions(&self.root, &mut out);
        out
    }
}

fn insert_into<T: Clone + PartialEq>(node: &mut RegionNode<T>, region: &Rect, value: &T) {
    if !node.rect.intersects(region) {
        return;
    }
    if region.covers(&node.rect) {
        node.kind = NodeKind::Leaf(Some(value.clone()));
        return;
    }

    if let NodeKind::Leaf(current) = &node.kind {
        let children = node
            .rect
            .quadrants()
            .into_iter()
            .map(|rect| RegionNode {
                rect,
                kind: NodeKind::Leaf(current.clone()),
            })
            .collect();
        node.kind = NodeKind::Branch(children);
    }

    if let NodeKind::Branch(children) = &mut node.kind {
        for child in children.iter_mut() {
            insert_into(child, region, value);
        }
        if let Some(merged) = uniform_value(children) {
            node.kind = NodeKind::Leaf(merged);
        }
    }
}

/// `Some(value)` when every child is a leaf holding the same value.
fn uniform_value<T: Clone + PartialEq>(children: &[RegionNode<T>]) -> Option<Option<T>> {
    let mut first: Option<&Option<T>> = None;
    for child in children {
        let NodeKind::Leaf(value) = &child.kind else {
            return None;
        };
        match first {
            None => first = Some(value),
            Some(seen) if seen == value => {}
            Some(_) => return None,
        }
    }
    first.cloned()
}

fn collect_regions<T: Clone>(node: &RegionNode<T>, out: &mut Vec<(Rect, T)>) {
    match &node.kind {
        NodeKind::Leaf(Some(value)) => out.push((node.rect, value.clone())),
        NodeKind::Leaf(None) => {}
        NodeKind::Branch(children) => {
            for child in children {
                collect_regions(child, out);
            }
        }
    }
}
