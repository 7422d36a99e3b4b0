use super::model::{Session, initialize_model};
use crate::shapes::point::PointF32;
use crate::shapes::rect::{Rect, RectF32};
use anchors::{INPUT_SIZE, NUM_ANCHORS, gen_anchors};
use anyhow::{Error, Result};
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::{Array, ArrayView2};
use ort::value::Tensor;
use std::path::Path;
use tracing::{Level, span, trace};

mod anchors;

const MODEL_FILE: &str = "mediapipe_face_detection_short_range.onnx";
const MAX_OVERLAP_PCT: f32 = 30.;

pub struct FaceDetector {
    model: Session,
    anchors: Vec<RectF32>,
    min_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct Face {
    pub bounds: Rect,
    pub l_eye: PointF32,
    pub r_eye: PointF32,
    pub confidence: f32,
}

impl Face {
    pub fn with_eyes(confidence: f32, bounds: Rect, l_eye: PointF32, r_eye: PointF32) -> Face {
        Face {
            l_eye,
            r_eye,
            bounds,
            confidence,
        }
    }

    /// Tilt of the line between the eyes, in image coordinates.
    pub fn rot_theta(&self) -> f32 {
        let dx = self.r_eye.x - self.l_eye.x;
        let dy = self.r_eye.y - self.l_eye.y;
        dy.atan2(dx)
    }
}

impl FaceDetector {
    /*
    BlazeFace (short range) wrapper.

    Model Input: 1x128x128x3 f32 image in [-1, 1]
    Model Output:
    - classificators: 896 raw confidence logits
    - regressors: 896x16 detection coords

    The first 4 values of each regressor row are the box centre offset,
    width and height in input pixels, relative to the anchor at the same
    index. The remaining 12 values are 6 keypoints (eyes, nose, mouth,
    ears), also offset from the anchor centre.
     */
    pub fn new(model_dir: &Path, threads: usize, min_confidence: f32) -> Result<FaceDetector> {
        Ok(FaceDetector {
            model: initialize_model(model_dir, MODEL_FILE, threads)?,
            anchors: gen_anchors(),
            min_confidence,
        })
    }

    pub fn run(&self, img: &RgbImage) -> Result<Vec<Face>> {
        let span = span!(Level::DEBUG, "face_detector");
        let _guard = span.enter();

        let resized = imageops::resize(img, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let input_arr = Array::from_shape_fn(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            |(_, y, x, c)| resized.get_pixel(x as u32, y as u32)[c] as f32 / 127.5 - 1.,
        );

        let input = Tensor::from_array(input_arr)?;
        let outputs = self.model.run(ort::inputs!["input" => input]?)?;

        let regressors = outputs["regressors"].try_extract_tensor::<f32>()?;
        let classificators = outputs["classificators"].try_extract_tensor::<f32>()?;

        let regressors = regressors.to_shape((NUM_ANCHORS, 16))?.to_owned();
        let scores: Vec<f32> = classificators.iter().copied().collect();

        decode_detections(
            regressors.view(),
            &scores,
            &self.anchors,
            img.width(),
            img.height(),
            self.min_confidence,
        )
    }
}

pub fn decode_detections(
    regressors: ArrayView2<f32>,
    scores: &[f32],
    anchors: &[RectF32],
    input_width: u32,
    input_height: u32,
    min_confidence: f32,
) -> Result<Vec<Face>> {
    if regressors.nrows() != anchors.len() || scores.len() != anchors.len() {
        return Err(Error::msg(format!(
            "Detector output mismatch: {} rows, {} scores, {} anchors",
            regressors.nrows(),
            scores.len(),
            anchors.len()
        )));
    }

    let x_scale = input_width as f32 / INPUT_SIZE as f32;
    let y_scale = input_height as f32 / INPUT_SIZE as f32;
    let mut candidates: Vec<Face> = Vec::new();

    for (row_idx, res) in regressors.rows().into_iter().enumerate() {
        let score = sigmoid_stable(scores[row_idx]);
        if score <= min_confidence {
            continue;
        }

        let anchor = anchors[row_idx];
        let ax = anchor.x * INPUT_SIZE as f32;
        let ay = anchor.y * INPUT_SIZE as f32;

        let bounds: Rect = RectF32::from_center(ax + res[0], ay + res[1], res[2], res[3])
            .scale(x_scale, y_scale)
            .into();
        let l_eye = PointF32::new((ax + res[4]) * x_scale, (ay + res[5]) * y_scale);
        let r_eye = PointF32::new((ax + res[6]) * x_scale, (ay + res[7]) * y_scale);
        candidates.push(Face::with_eyes(score, bounds, l_eye, r_eye));
    }

    // greedy suppression, best first
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut results: Vec<Face> = Vec::new();
    for c in candidates {
        if results
            .iter()
            .all(|kept| kept.bounds.overlap_pct(&c.bounds) <= MAX_OVERLAP_PCT)
        {
            results.push(c);
        }
    }

    trace!("Detected {} faces", results.len());

    Ok(results)
}

fn sigmoid_stable(x: f32) -> f32 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        x.exp() / (1. + x.exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn outputs_with(hits: &[(usize, f32, [f32; 4])]) -> (Array2<f32>, Vec<f32>) {
        let mut regressors = Array2::<f32>::zeros((NUM_ANCHORS, 16));
        let mut scores = vec![-10f32; NUM_ANCHORS];

        for (idx, logit, [dx, dy, w, h]) in hits {
            scores[*idx] = *logit;
            regressors[[*idx, 0]] = *dx;
            regressors[[*idx, 1]] = *dy;
            regressors[[*idx, 2]] = *w;
            regressors[[*idx, 3]] = *h;
            // eyes 10px either side of the anchor, level
            regressors[[*idx, 4]] = -10.;
            regressors[[*idx, 6]] = 10.;
        }

        (regressors, scores)
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid_stable(0.), 0.5);
        assert!(sigmoid_stable(20.) > 0.999);
        assert!(sigmoid_stable(-20.) < 0.001);
        assert!(sigmoid_stable(-200.).is_finite());
    }

    #[test]
    fn test_decode_scales_to_input() {
        let anchors = gen_anchors();
        // anchor 600 is in the 8x8 grid
        let (regressors, scores) = outputs_with(&[(600, 5., [2., 0., 40., 40.])]);

        let faces =
            decode_detections(regressors.view(), &scores, &anchors, 256, 512, 0.5).unwrap();
        assert_eq!(faces.len(), 1);

        let face = &faces[0];
        let ax = anchors[600].x * 128.;
        let ay = anchors[600].y * 128.;
        assert_eq!(face.bounds.w, 80);
        assert_eq!(face.bounds.h, 160);
        assert_eq!(face.bounds.x, ((ax + 2.) * 2.).round() as u32);
        assert_eq!(face.bounds.y, (ay * 4.).round() as u32);
        assert!(face.rot_theta().abs() < 1e-6);
    }

    #[test]
    fn test_decode_suppresses_overlaps() {
        let anchors = gen_anchors();
        // same cell, slightly different boxes
        let (regressors, scores) = outputs_with(&[
            (600, 2., [0., 0., 40., 40.]),
            (601, 4., [1., 1., 40., 40.]),
            (0, 3., [0., 0., 10., 10.]),
        ]);

        let faces =
            decode_detections(regressors.view(), &scores, &anchors, 128, 128, 0.5).unwrap();
        assert_eq!(faces.len(), 2);
        assert!(faces[0].confidence > faces[1].confidence);
        assert_eq!(faces[0].confidence, sigmoid_stable(4.));
    }

    #[test]
    fn test_decode_drops_every_box_overlapping_a_better_one() {
        let anchors = gen_anchors();
        // anchors 692..=694 share the 8x8 cell centred at (104, 56)
        let (regressors, scores) = outputs_with(&[
            (692, 1., [-64., 0., 40., 40.]),
            (693, 1., [-16., 0., 40., 40.]),
            (694, 3., [-40., 0., 60., 40.]),
        ]);

        let faces =
            decode_detections(regressors.view(), &scores, &anchors, 128, 128, 0.5).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].bounds, Rect::from_tl(34, 36, 60, 40));
        assert_eq!(faces[0].confidence, sigmoid_stable(3.));
    }

    #[test]
    fn test_decode_rejects_mismatched_outputs() {
        let anchors = gen_anchors();
        let regressors = Array2::<f32>::zeros((10, 16));
        let scores = vec![0f32; 10];

        assert!(decode_detections(regressors.view(), &scores, &anchors, 128, 128, 0.5).is_err());
    }
}
