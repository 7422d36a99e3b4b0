use clap::Parser;
use num_cpus::get as get_cpu_count;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "fbd", version, about = "Find the 3D boundary of a face object", long_about = None)]
pub struct Config {
    /// Source image the object was textured from
    #[arg(short = 'i', long = "image_path", alias = "image-path", value_name = "FILE")]
    pub image_path: PathBuf,

    /// Wavefront object to cut the face out of
    #[arg(short = 'o', long = "object_path", alias = "object-path", value_name = "FILE")]
    pub obj_path: PathBuf,

    /// Base path for outputs; the mesh lands in `<dir>/boundary/`
    #[arg(short = 'b', long = "boundary_path", alias = "boundary-path", value_name = "FILE")]
    pub boundary_path: PathBuf,

    /// Also split the object into voxel/texture text files in this directory
    #[arg(short = 'c', long = "chunk_path", alias = "chunk-path", value_name = "DIR")]
    pub chunk_path: Option<PathBuf>,

    /// Verbose logging and a debug overlay image
    #[arg(short, long)]
    pub debug: bool,

    /// Only write keypoints, not the boundary mesh
    #[arg(short = 'k', long = "skip_boundary", alias = "skip-boundary")]
    pub skip_boundary: bool,

    /// Directory holding the face detection and landmark ONNX models
    #[arg(long, default_value = "./models", value_name = "DIR")]
    pub model_dir: PathBuf,

    /// Max threads handed to the inference runtime
    #[arg(short, long)]
    pub max_threads: Option<usize>,

    /// Clamp z to at least `min_z * trim_z`; outside [0, 1] disables trimming
    #[arg(long, default_value = "1.0", allow_negative_numbers = true)]
    pub trim_z: f64,

    /// Center the object's vertices on the origin before writing
    #[arg(long)]
    pub center: bool,

    /// Padding applied to the detected face box before landmarking
    #[arg(long, default_value = "1.5")]
    pub padding: f32,

    /// Minimum face detection confidence
    #[arg(long, default_value = "0.5")]
    pub min_confidence: f32,

    /// Texture v already points down the image
    #[arg(long)]
    pub no_flip_v: bool,
}

impl Config {
    pub fn threads(&self) -> usize {
        let total_threads = get_cpu_count();
        self.max_threads
            .unwrap_or(total_threads)
            .clamp(1, total_threads.max(1))
    }
}
