use crate::mesh::{ObjMesh, TexCoord};
use crate::pipeline::Landmarks;
use crate::shapes::point::PointF32;
use crate::shapes::polygon::Polygon;
use anyhow::{Context, Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Named mesh landmarks reported in the keypoints file. Sides are the
/// subject's, so `right_*` sits on the left of the image.
pub const KEYPOINTS: [(&str, usize); 7] = [
    ("forehead", 10),
    ("chin", 152),
    ("nose_tip", 1),
    ("right_eye_outer", 33),
    ("left_eye_outer", 263),
    ("right_mouth", 61),
    ("left_mouth", 291),
];

/// Maps texture coordinates onto the pixels of the source image.
#[derive(Debug, Clone, Copy)]
pub struct TextureProjection {
    pub width: u32,
    pub height: u32,
    /// OBJ texture space has v pointing up, images have y pointing down.
    pub flip_v: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keypoint {
    pub name: &'static str,
    pub xyz: [f64; 3],
}

impl TextureProjection {
    pub fn to_pixel(&self, t: &TexCoord) -> PointF32 {
        let v = if self.flip_v { 1. - t.v } else { t.v };
        PointF32::new(
            (t.u * self.width as f64) as f32,
            (v * self.height as f64) as f32,
        )
    }
}

fn textured_vertices(mesh: &ObjMesh) -> Result<usize> {
    if mesh.tex_coords.is_empty() {
        return Err(Error::msg("object has no texture coordinates"));
    }
    if mesh.tex_coords.len() != mesh.vertices.len() {
        warn!(
            "{} vertices but {} texture coordinates, ignoring the excess",
            mesh.vertices.len(),
            mesh.tex_coords.len()
        );
    }

    Ok(mesh.vertices.len().min(mesh.tex_coords.len()))
}

/// 0-based indices of the vertices whose texture pixel falls inside `oval`,
/// in vertex order.
pub fn select_boundary(
    mesh: &ObjMesh,
    oval: &Polygon,
    projection: TextureProjection,
) -> Result<Vec<usize>> {
    let count = textured_vertices(mesh)?;

    let index: Vec<usize> = mesh.tex_coords[..count]
        .iter()
        .enumerate()
        .filter(|(_, t)| oval.contains_point(projection.to_pixel(t)))
        .map(|(i, _)| i)
        .collect();

    if index.is_empty() {
        return Err(Error::msg("no vertices inside face boundary"));
    }

    debug!("{} of {count} vertices inside face boundary", index.len());
    Ok(index)
}

/// For each named landmark, the vertex whose texture pixel is closest to it.
pub fn keypoints(
    mesh: &ObjMesh,
    landmarks: &Landmarks,
    projection: TextureProjection,
) -> Result<Vec<Keypoint>> {
    let count = textured_vertices(mesh)?;
    let pixels: Vec<PointF32> = mesh.tex_coords[..count]
        .iter()
        .map(|t| projection.to_pixel(t))
        .collect();

    KEYPOINTS
        .iter()
        .map(|(name, lm_idx)| {
            let target = landmarks.point(*lm_idx);
            let index = nearest(&pixels, target)
                .ok_or_else(|| Error::msg(format!("no vertex found for {name}")))?;

            Ok(Keypoint {
                name: *name,
                xyz: mesh.vertices[index].pos,
            })
        })
        .collect()
}

fn nearest(pixels: &[PointF32], target: PointF32) -> Option<usize> {
    pixels
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.dist_sq(&target).total_cmp(&b.dist_sq(&target)))
        .map(|(i, _)| i)
}

/// `name x y z`, one keypoint per line.
pub fn write_keypoints(path: &Path, keypoints: &[Keypoint]) -> Result<()> {
    let f = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut out = BufWriter::new(f);

    for kp in keypoints {
        let [x, y, z] = kp.xyz;
        writeln!(out, "{} {x} {y} {z}", kp.name)?;
    }
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::landmarks::NUM_LANDMARKS;

    // 3x3 grid of vertices, texture coords on a 0, 0.5, 1 lattice
    fn grid_mesh() -> ObjMesh {
        let mut obj = String::new();
        for row in 0..3 {
            for col in 0..3 {
                obj.push_str(&format!("v {col} {row} {}\n", row * 3 + col));
            }
        }
        for row in 0..3 {
            for col in 0..3 {
                obj.push_str(&format!("vt {} {}\n", col as f32 / 2., row as f32 / 2.));
            }
        }
        obj.push_str("f 1/1 2/2 5/5\nf 5/5 6/6 9/9\n");
        ObjMesh::parse(&obj).unwrap()
    }

    fn projection() -> TextureProjection {
        TextureProjection {
            width: 100,
            height: 100,
            flip_v: true,
        }
    }

    fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Polygon {
        Polygon::new(Vec::from([
            PointF32::new(x0, y0),
            PointF32::new(x1, y0),
            PointF32::new(x1, y1),
            PointF32::new(x0, y1),
        ]))
    }

    #[test]
    fn test_to_pixel_flips_v() {
        let t = TexCoord { u: 0.25, v: 0.25 };
        assert_eq!(projection().to_pixel(&t), PointF32::new(25., 75.));

        let unflipped = TextureProjection {
            flip_v: false,
            ..projection()
        };
        assert_eq!(unflipped.to_pixel(&t), PointF32::new(25., 25.));
    }

    #[test]
    fn test_select_boundary() {
        let mesh = grid_mesh();

        // bottom-left quadrant of the image is v in [0, 0.5] after the flip
        let index = select_boundary(&mesh, &square(-1., 40., 60., 101.), projection()).unwrap();
        assert_eq!(index, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_select_boundary_empty_is_error() {
        let mesh = grid_mesh();
        let err = select_boundary(&mesh, &square(10., 10., 20., 20.), projection()).unwrap_err();
        assert!(err.to_string().contains("no vertices"));
    }

    #[test]
    fn test_select_boundary_needs_texture() {
        let mesh = ObjMesh::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\n").unwrap();
        assert!(select_boundary(&mesh, &square(0., 0., 1., 1.), projection()).is_err());
    }

    #[test]
    fn test_keypoints_snap_to_nearest_vertex() {
        let mesh = grid_mesh();
        let mut points = vec![[50f32, 50., 0.]; NUM_LANDMARKS];
        // chin near the pixel of vertex 1 (u 0.5, v 0 -> 50, 100)
        points[152] = [48., 97., 0.];
        let landmarks = Landmarks { points };

        let kps = keypoints(&mesh, &landmarks, projection()).unwrap();
        assert_eq!(kps.len(), KEYPOINTS.len());

        // vertex 1
        let chin = kps.iter().find(|k| k.name == "chin").unwrap();
        assert_eq!(chin.xyz, [1., 0., 1.]);

        // vertex 4, the middle of the grid
        let nose = kps.iter().find(|k| k.name == "nose_tip").unwrap();
        assert_eq!(nose.xyz, [1., 1., 4.]);
    }

    #[test]
    fn test_keypoint_sides_follow_the_subject() {
        let mut points = vec![[50f32, 50., 0.]; NUM_LANDMARKS];
        // subject's right eye corner is on the image left
        points[33] = [5., 50., 0.];
        points[263] = [95., 50., 0.];
        let landmarks = Landmarks { points };

        let mesh = grid_mesh();
        let kps = keypoints(&mesh, &landmarks, projection()).unwrap();
        let right_eye = kps.iter().find(|k| k.name == "right_eye_outer").unwrap();
        let left_eye = kps.iter().find(|k| k.name == "left_eye_outer").unwrap();

        // u 0 / u 1 on the middle row
        assert_eq!(right_eye.xyz, [0., 1., 3.]);
        assert_eq!(left_eye.xyz, [2., 1., 5.]);
    }

    #[test]
    fn test_write_keypoints() {
        let dir = std::env::temp_dir().join(format!("fbd-keypoints-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("face.txt");

        let kps = vec![Keypoint {
            name: "chin",
            xyz: [1., 0.5, -2.],
        }];
        write_keypoints(&out, &kps).unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "chin 1 0.5 -2\n");
    }
}
