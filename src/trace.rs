use crate::boundary::{KEYPOINTS, TextureProjection};
use crate::mesh::ObjMesh;
use crate::pipeline::FaceMesh;
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing;
use imageproc::point::Point as DrawPoint;
use std::path::Path;
use tracing::info;

const FACE_BOX: Rgb<u8> = Rgb([255, 0, 0]);
const OVAL: Rgb<u8> = Rgb([0, 255, 0]);
const LANDMARK: Rgb<u8> = Rgb([255, 255, 0]);
const VERTEX: Rgb<u8> = Rgb([0, 128, 255]);

/// Overlay the detection and the selected vertices on a copy of `img`.
pub fn draw_overlay(
    img: &RgbImage,
    face: &FaceMesh,
    mesh: &ObjMesh,
    boundary: &[usize],
    projection: TextureProjection,
) -> RgbImage {
    let mut canvas = img.clone();

    for idx in boundary {
        if let Some(t) = mesh.tex_coords.get(*idx) {
            let p = projection.to_pixel(t);
            drawing::draw_cross_mut(&mut canvas, VERTEX, p.x.round() as i32, p.y.round() as i32);
        }
    }

    drawing::draw_hollow_rect_mut(&mut canvas, face.face.bounds.into(), FACE_BOX);

    let oval: Vec<DrawPoint<f32>> = face
        .landmarks
        .oval()
        .points
        .iter()
        .map(|p| DrawPoint::new(p.x, p.y))
        .collect();
    drawing::draw_hollow_polygon_mut(&mut canvas, &oval, OVAL);

    for (_, lm_idx) in KEYPOINTS {
        let p = face.landmarks.point(lm_idx);
        drawing::draw_filled_circle_mut(
            &mut canvas,
            (p.x.round() as i32, p.y.round() as i32),
            3,
            LANDMARK,
        );
    }

    canvas
}

pub fn save_overlay(canvas: &RgbImage, path: &Path) -> Result<()> {
    canvas
        .save(path)
        .with_context(|| format!("failed to write debug image {path:?}"))?;
    info!("Debug overlay at {path:?}");

    Ok(())
}
