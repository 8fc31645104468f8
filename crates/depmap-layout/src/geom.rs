use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Smallest box containing every rect, or `None` for an empty input.
    pub fn from_rects(rects: impl IntoIterator<Item = BoundingBox>) -> Option<Self> {
        let mut it = rects.into_iter();
        let first = it.next()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.right(), first.bottom());
        for r in it {
            min_x = min_x.min(r.x);
            min_y = min_y.min(r.y);
            max_x = max_x.max(r.right());
            max_y = max_y.max(r.bottom());
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True when a horizontal segment at `y` spanning `[x0, x1]` crosses the box interior.
    pub fn blocks_horizontal(&self, y: f64, x0: f64, x1: f64) -> bool {
        let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        y > self.y && y < self.bottom() && hi > self.x && lo < self.right()
    }
}

/// Drops repeated points and interior points inside a straight axis-aligned run. A run that
/// doubles back keeps its turning point.
pub fn simplify_polyline(points: Vec<Point>) -> Vec<Point> {
    let between = |a: f64, b: f64, c: f64| (a <= b && b <= c) || (c <= b && b <= a);
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let vertical = a.x == b.x && b.x == p.x && between(a.y, b.y, p.y);
            let horizontal = a.y == b.y && b.y == p.y && between(a.x, b.x, p.x);
            if vertical || horizontal {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_rects() {
        let bb = BoundingBox::from_rects([
            BoundingBox::new(10.0, 10.0, 5.0, 5.0),
            BoundingBox::new(-5.0, 12.0, 1.0, 20.0),
        ])
        .unwrap();
        assert_eq!(bb, BoundingBox::new(-5.0, 10.0, 20.0, 22.0));
        assert!(BoundingBox::from_rects(Vec::new()).is_none());
    }

    #[test]
    fn polyline_simplification() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(8.0, 3.0),
        ];
        assert_eq!(
            simplify_polyline(pts),
            vec![Point::new(0.0, 0.0), Point::new(8.0, 0.0), Point::new(8.0, 3.0)]
        );
    }
}
