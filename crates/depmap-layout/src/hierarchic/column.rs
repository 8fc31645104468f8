use crate::config::LayoutConfig;
use crate::geom::Point;

/// Arranges unconnected group members in columns of at most `max_rows`, filled top to bottom
/// and then left to right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleColumnLayouter {
    pub max_rows: usize,
    pub row_spacing: f64,
    pub column_spacing: f64,
}

impl SimpleColumnLayouter {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            max_rows: config.column_max_rows.max(1),
            row_spacing: config.child_spacing,
            column_spacing: config.column_spacing,
        }
    }

    /// Top-left positions for footprints of the given sizes, plus the extent of the block.
    pub fn arrange(&self, sizes: &[(f64, f64)]) -> (Vec<Point>, f64, f64) {
        let mut positions = Vec::with_capacity(sizes.len());
        let mut x = 0.0;
        let mut width: f64 = 0.0;
        let mut height: f64 = 0.0;
        for column in sizes.chunks(self.max_rows) {
            let mut y = 0.0;
            let mut col_width: f64 = 0.0;
            for &(w, h) in column {
                positions.push(Point::new(x, y));
                y += h + self.row_spacing;
                col_width = col_width.max(w);
            }
            height = height.max(y - self.row_spacing);
            width = x + col_width;
            x += col_width + self.column_spacing;
        }
        (positions, width, height)
    }
}
