//! Mapping between pixel positions of a square canvas and grid cells, for hosts that draw the
//! grid and place cells with a pointer.

use grid_util::point::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    /// Side length of the canvas in pixels.
    pub extent: u32,
    /// Number of cells along each side.
    pub rows: usize,
}

impl GridLayout {
    pub fn new(extent: u32, rows: usize) -> GridLayout {
        GridLayout { extent, rows }
    }

    /// Side length of one cell; 0 when the canvas is smaller than the number of rows.
    pub fn cell_size(&self) -> u32 {
        if self.rows == 0 {
            0
        } else {
            self.extent / self.rows as u32
        }
    }

    /// The cell under pixel `(u, v)`, where `u` runs along the cell's `x` axis.
    pub fn cell_at(&self, u: u32, v: u32) -> Option<Point> {
        let size = self.cell_size();
        if size == 0 {
            return None;
        }
        let (x, y) = ((u / size) as usize, (v / size) as usize);
        (x < self.rows && y < self.rows).then(|| Point::new(x as i32, y as i32))
    }

    /// Pixel coordinates of the top-left corner of a cell.
    pub fn cell_origin(&self, point: Point) -> (u32, u32) {
        let size = self.cell_size();
        (point.x.max(0) as u32 * size, point.y.max(0) as u32 * size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_pixels_to_cells() {
        let layout = GridLayout::new(800, 50);
        assert_eq!(layout.cell_size(), 16);
        assert_eq!(layout.cell_at(0, 0), Some(Point::new(0, 0)));
        assert_eq!(layout.cell_at(17, 799), Some(Point::new(1, 49)));
        assert_eq!(layout.cell_at(800, 0), None);
        assert_eq!(layout.cell_origin(Point::new(3, 2)), (48, 32));
    }

    #[test]
    fn degenerate_layouts() {
        assert_eq!(GridLayout::new(10, 20).cell_at(1, 1), None);
        assert_eq!(GridLayout::new(10, 0).cell_size(), 0);
    }
}
