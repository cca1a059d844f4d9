#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Area shared by both rectangles, zero when they do not overlap.
    pub fn intersection_area(&self, other: &Rect) -> i32 {
        let overlap_w = 0.max(self.right().min(other.right()) - self.x.max(other.x));
        let overlap_h = 0.max(self.bottom().min(other.bottom()) - self.y.max(other.y));
        overlap_w * overlap_h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_of_overlapping_rects() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert_eq!(a.intersection_area(&b), 2500);
        assert_eq!(b.intersection_area(&a), 2500);
    }

    #[test]
    fn disjoint_rects_have_no_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(100, 0, 100, 100);
        assert_eq!(a.intersection_area(&b), 0);
        assert_eq!(a.intersection_area(&Rect::new(-500, -500, 10, 10)), 0);
    }
}
