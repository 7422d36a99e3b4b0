// centre-based, pixel units
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RectF32 {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl From<RectF32> for Rect {
    fn from(r: RectF32) -> Rect {
        let left = (r.x - r.w / 2.).max(0.);
        let top = (r.y - r.h / 2.).max(0.);
        let right = (r.x + r.w / 2.).max(0.);
        let bottom = (r.y + r.h / 2.).max(0.);

        Rect::from_tl(
            left.round() as u32,
            top.round() as u32,
            (right - left).round() as u32,
            (bottom - top).round() as u32,
        )
    }
}

impl From<Rect> for imageproc::rect::Rect {
    fn from(r: Rect) -> imageproc::rect::Rect {
        imageproc::rect::Rect::at(r.left() as i32, r.top() as i32).of_size(r.w.max(1), r.h.max(1))
    }
}

impl RectF32 {
    pub fn from_center(xc: f32, yc: f32, w: f32, h: f32) -> RectF32 {
        RectF32 { x: xc, y: yc, w, h }
    }

    pub fn scale(&mut self, scale_x: f32, scale_y: f32) -> RectF32 {
        self.x *= scale_x;
        self.y *= scale_y;
        self.w *= scale_x;
        self.h *= scale_y;

        *self
    }
}

impl Rect {
    pub fn left(&self) -> u32 {
        self.x.saturating_sub(self.w / 2)
    }
    pub fn right(&self) -> u32 {
        self.left() + self.w
    }
    pub fn top(&self) -> u32 {
        self.y.saturating_sub(self.h / 2)
    }
    pub fn bottom(&self) -> u32 {
        self.top() + self.h
    }
    pub fn area(&self) -> u32 {
        self.w * self.h
    }

    pub fn from_tl(x: u32, y: u32, w: u32, h: u32) -> Rect {
        Rect {
            x: x + w / 2,
            y: y + h / 2,
            w,
            h,
        }
    }

    pub fn scale_x(&mut self, mag: f32, max: u32) -> Rect {
        // Ensure we don't go <0 on x axis
        let new_w = self.w as f32 * mag;
        let new_l = (self.x as f32 - new_w / 2.).round().max(0.) as u32;
        let new_r = ((self.x as f32 + new_w / 2.).round() as u32).min(max);

        self.w = new_r.saturating_sub(new_l);
        self.x = new_l + self.w / 2;

        *self
    }

    pub fn scale_y(&mut self, mag: f32, max: u32) -> Rect {
        let new_h = self.h as f32 * mag;
        let new_t = (self.y as f32 - new_h / 2.).round().max(0.) as u32;
        let new_b = ((self.y as f32 + new_h / 2.).round() as u32).min(max);

        self.h = new_b.saturating_sub(new_t);
        self.y = new_t + self.h / 2;

        *self
    }

    /// Grow (or shrink) around the centre by `mag`, staying inside
    /// `[0, max_x] x [0, max_y]`.
    pub fn scale(&mut self, mag: f32, max_x: u32, max_y: u32) -> Rect {
        self.scale_x(mag, max_x);
        self.scale_y(mag, max_y);

        *self
    }

    pub fn overlap_pct(&self, other: &Rect) -> f32 {
        let x_min = self.left().max(other.left());
        let x_max = self.right().min(other.right());
        let y_min = self.top().max(other.top());
        let y_max = self.bottom().min(other.bottom());

        let overlap_area = if x_min < x_max && y_min < y_max {
            (x_max - x_min) * (y_max - y_min)
        } else {
            0
        };

        let area_delta = self.area() + other.area() - overlap_area;

        if area_delta > 0 {
            overlap_area as f32 / area_delta as f32 * 100.
        } else {
            0.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::from_tl(10, 20, 30, 40);
        assert_eq!(r.left(), 10);
        assert_eq!(r.right(), 40);
        assert_eq!(r.top(), 20);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.area(), 1200);
    }

    #[test]
    fn test_overlap_pct() {
        let a = Rect::from_tl(0, 0, 10, 10);
        let b = Rect::from_tl(5, 0, 10, 10);
        let c = Rect::from_tl(50, 50, 10, 10);

        // 50 overlap / 150 union
        assert!((a.overlap_pct(&b) - 33.333).abs() < 0.01);
        assert_eq!(a.overlap_pct(&c), 0.);
        assert_eq!(a.overlap_pct(&a), 100.);
    }

    #[test]
    fn test_scale_clamps_to_image() {
        let mut r = Rect::from_tl(0, 10, 20, 20);
        r.scale(2., 30, 100);

        assert_eq!(r.left(), 0);
        assert_eq!(r.right(), 30);
        assert_eq!(r.top(), 0);
        assert_eq!(r.bottom(), 40);
    }

    #[test]
    fn test_from_rect_f32() {
        let r: Rect = RectF32::from_center(50., 50., 20., 10.).into();
        assert_eq!(r.left(), 40);
        assert_eq!(r.top(), 45);
        assert_eq!(r.w, 20);
        assert_eq!(r.h, 10);
    }
}
