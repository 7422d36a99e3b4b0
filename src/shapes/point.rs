#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointF32 {
    pub x: f32,
    pub y: f32,
}

impl PointF32 {
    pub fn new(x: f32, y: f32) -> PointF32 {
        PointF32 { x, y }
    }

    pub fn rotate(&mut self, origin: PointF32, theta: f32) -> PointF32 {
        let x = self.x - origin.x;
        let y = self.y - origin.y;

        self.x = x * theta.cos() - y * theta.sin() + origin.x;
        self.y = x * theta.sin() + y * theta.cos() + origin.y;

        *self
    }

    pub fn dist_sq(&self, other: &PointF32) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}
