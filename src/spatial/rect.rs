use serde::{Deserialize, Serialize};

/// Axis-aligned integer rectangle. `w` and `h` are cell counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// True when `other` lies entirely inside `self`.
    pub fn covers(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Rect::new(x, y, right - x, bottom - y);
        if rect.is_empty() {
            None
        } else {
            Some(rect)
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Split into up to four non-empty quadrants. A 1-wide or 1-tall rect
    /// yields two halves; a single cell yields nothing.
    pub fn quadrants(&self) -> Vec<Rect> {
        let left_w = self.w / 2;
        let top_h = self.h / 2;
        [
            Rect::new(self.x, self.y, left_w, top_h),
            Rect::new(self.x + left_w, self.y, self.w - left_w, top_h),
            Rect::new(self.x, self.y + top_h, left_w, self.h - top_h),
            Rect::new(self.x + left_w, self.y + top_h, self.w - left_w, self.h - top_h),
        ]
        .into_iter()
        .filter(|quad| !quad.is_empty() && quad != self)
        .collect()
    }
}
