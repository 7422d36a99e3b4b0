use super::detection;
use super::model::{Session, initialize_model};
use crate::shapes::point::PointF32;
use crate::shapes::polygon::Polygon;
use crate::shapes::rect::Rect;
use anyhow::{Error, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use ndarray::Array;
use ort::value::Tensor;
use std::path::Path;
use tracing::{Level, debug, span};

const MODEL_FILE: &str = "mediapipe_face_landmark.onnx";
const HEIGHT: u32 = 192;
const WIDTH: u32 = 192;
pub const NUM_LANDMARKS: usize = 468;

/// Face oval, clockwise from the top of the forehead.
pub const FACE_OVAL_IDXS: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

pub struct FaceLandmarker {
    model: Session,
    padding: f32,
}

/// 468-point face mesh in source image coordinates. `z` shares the scale
/// of `x`.
#[derive(Debug, Clone)]
pub struct Landmarks {
    pub points: Vec<[f32; 3]>,
}

impl Landmarks {
    pub fn point(&self, idx: usize) -> PointF32 {
        let [x, y, _] = self.points[idx];
        PointF32::new(x, y)
    }

    pub fn oval(&self) -> Polygon {
        Polygon::new(FACE_OVAL_IDXS.iter().map(|i| self.point(*i)).collect())
    }
}

impl FaceLandmarker {
    pub fn new(model_dir: &Path, threads: usize, padding: f32) -> Result<FaceLandmarker> {
        Ok(FaceLandmarker {
            model: initialize_model(model_dir, MODEL_FILE, threads)?,
            padding,
        })
    }

    /// Padded crop for `face`, or `None` when it falls outside the image.
    pub fn region(&self, img: &RgbImage, face: &detection::Face) -> Option<Rect> {
        landmark_region(face, self.padding, img.width(), img.height())
    }

    pub fn run(&self, img: &RgbImage, face: &detection::Face) -> Result<Landmarks> {
        let span = span!(Level::DEBUG, "face_landmarker");
        let _guard = span.enter();

        let theta = face.rot_theta();
        debug!("Tilt: {}", theta.to_degrees());

        let bounds = self
            .region(img, face)
            .ok_or_else(|| Error::msg(format!("Face bounds {:?} are empty", face.bounds)))?;

        let crop = imageops::crop_imm(img, bounds.left(), bounds.top(), bounds.w, bounds.h)
            .to_image();
        // level the eyes before running the mesh model
        let crop = rotate_about_center(&crop, -theta, Interpolation::Bilinear, Rgb([0, 0, 0]));
        let input_img = imageops::resize(&crop, WIDTH, HEIGHT, FilterType::Triangle);

        let input_arr =
            Array::from_shape_fn((1, HEIGHT as usize, WIDTH as usize, 3), |(_, y, x, c)| {
                input_img.get_pixel(x as u32, y as u32)[c] as f32 / 255. // 0. - 1. range
            });

        let input = Tensor::from_array(input_arr)?;
        let outputs = self.model.run(ort::inputs!["input_1" => input]?)?;

        let output = outputs["conv2d_21"].try_extract_tensor::<f32>()?;
        let mesh: Vec<f32> = output.iter().copied().collect();

        extract_results(&mesh, WIDTH, HEIGHT, bounds, theta)
    }
}

pub fn landmark_region(
    face: &detection::Face,
    padding: f32,
    width: u32,
    height: u32,
) -> Option<Rect> {
    let mut bounds = face.bounds;
    bounds.scale(padding, width, height);

    (bounds.w > 0 && bounds.h > 0).then_some(bounds)
}

/// Map model-space mesh points back onto the source image: undo the
/// resize, then the levelling rotation, then the crop offset.
pub fn extract_results(
    mesh: &[f32],
    input_width: u32,
    input_height: u32,
    run_bounds: Rect,
    run_rot: f32,
) -> Result<Landmarks> {
    if mesh.len() < NUM_LANDMARKS * 3 {
        return Err(Error::msg(format!(
            "Expected {} mesh values, got {}",
            NUM_LANDMARKS * 3,
            mesh.len()
        )));
    }

    let x_scale = run_bounds.w as f32 / input_width as f32;
    let y_scale = run_bounds.h as f32 / input_height as f32;
    let x_offset = run_bounds.left() as f32;
    let y_offset = run_bounds.top() as f32;
    let origin = PointF32::new(run_bounds.w as f32 / 2., run_bounds.h as f32 / 2.);

    let points = mesh
        .chunks_exact(3)
        .take(NUM_LANDMARKS)
        .map(|kpt| {
            let mut p = PointF32::new(kpt[0] * x_scale, kpt[1] * y_scale);
            p.rotate(origin, run_rot);

            [p.x + x_offset, p.y + y_offset, kpt[2] * x_scale]
        })
        .collect();

    Ok(Landmarks { points })
}
