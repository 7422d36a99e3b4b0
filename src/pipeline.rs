use anyhow::Result;
use image::RgbImage;
use std::path::Path;
use tracing::{Level, info, span, trace, warn};

use detection::FaceDetector;
use landmarks::FaceLandmarker;

pub use detection::Face;
pub use landmarks::Landmarks;

mod detection;
pub mod landmarks;
mod model;

pub struct Pipeline {
    face_detector: FaceDetector,
    face_landmarker: FaceLandmarker,
}

#[derive(Debug, Clone)]
pub struct FaceMesh {
    pub face: Face,
    pub landmarks: Landmarks,
}

pub type Detection = Vec<FaceMesh>;

pub struct PipelineOptions<'a> {
    pub model_dir: &'a Path,
    pub threads: usize,
    pub min_confidence: f32,
    pub padding: f32,
}

impl Pipeline {
    pub fn new(opts: PipelineOptions) -> Result<Pipeline> {
        model::init_runtime()?;

        Ok(Pipeline {
            face_detector: FaceDetector::new(opts.model_dir, opts.threads, opts.min_confidence)?,
            face_landmarker: FaceLandmarker::new(opts.model_dir, opts.threads, opts.padding)?,
        })
    }

    /// Up to `max_faces` faces with their landmark meshes, most confident
    /// first. Detections whose padded crop falls outside the image are
    /// skipped.
    pub fn run(&self, img: &RgbImage, max_faces: usize) -> Result<Detection> {
        let span = span!(Level::DEBUG, "pipeline");
        let _guard = span.enter();

        info!("Starting face detector..");
        let face_bounds = self.face_detector.run(img)?;
        if face_bounds.len() > max_faces {
            warn!(
                "Found {} faces, keeping the {max_faces} most confident",
                face_bounds.len()
            );
        }

        let mut faces = Vec::new();
        for face in face_bounds {
            if faces.len() >= max_faces {
                break;
            }
            trace!("Face bound: {face:?}");

            if self.face_landmarker.region(img, &face).is_none() {
                warn!("Skipping face {:?}, its crop is outside the image", face.bounds);
                continue;
            }

            let landmarks = self.face_landmarker.run(img, &face)?;
            faces.push(FaceMesh { face, landmarks });
        }

        Ok(faces)
    }
}
