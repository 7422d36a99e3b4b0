use super::point::PointF32;

const EPSILON: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct Polygon {
    pub points: Vec<PointF32>,
}

impl Polygon {
    pub fn new(points: Vec<PointF32>) -> Self {
        Self { points }
    }

    pub fn min_x(&self) -> f32 {
        self.points.iter().fold(f32::INFINITY, |min, p| min.min(p.x))
    }

    pub fn max_x(&self) -> f32 {
        self.points
            .iter()
            .fold(f32::NEG_INFINITY, |max, p| max.max(p.x))
    }

    pub fn min_y(&self) -> f32 {
        self.points.iter().fold(f32::INFINITY, |min, p| min.min(p.y))
    }

    pub fn max_y(&self) -> f32 {
        self.points
            .iter()
            .fold(f32::NEG_INFINITY, |max, p| max.max(p.y))
    }

    /// Points on an edge or vertex count as inside.
    pub fn contains_point(&self, point: PointF32) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }

        if point.x < self.min_x() - EPSILON
            || point.x > self.max_x() + EPSILON
            || point.y < self.min_y() - EPSILON
            || point.y > self.max_y() + EPSILON
        {
            return false;
        }

        if self.point_on_boundary(point) {
            return true;
        }

        // Ray casting for interior points
        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let vi = self.points[i];
            let vj = self.points[j];

            if (vi.y > point.y) != (vj.y > point.y) {
                let x_cross = vi.x + (point.y - vi.y) * (vj.x - vi.x) / (vj.y - vi.y);
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }

        inside
    }

    fn point_on_boundary(&self, point: PointF32) -> bool {
        let n = self.points.len();

        (0..n).any(|i| point_on_edge(point, self.points[i], self.points[(i + 1) % n]))
    }
}

fn point_on_edge(point: PointF32, p1: PointF32, p2: PointF32) -> bool {
    let cross = (point.y - p1.y) * (p2.x - p1.x) - (point.x - p1.x) * (p2.y - p1.y);
    let len = ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt().max(1.);

    if (cross / len).abs() > EPSILON {
        return false;
    }

    point.x >= p1.x.min(p2.x) - EPSILON
        && point.x <= p1.x.max(p2.x) + EPSILON
        && point.y >= p1.y.min(p2.y) - EPSILON
        && point.y <= p1.y.max(p2.y) + EPSILON
}
