#![warn(unused_extern_crates)]

use anyhow::{Context, Error, Result};
use clap::Parser;
use image::ImageReader;
use std::time::Instant;
use tracing::{Level, debug, info, span};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::boundary::TextureProjection;
use crate::config::Config;
use crate::mesh::ObjMesh;
use crate::pipeline::{Pipeline, PipelineOptions};

mod boundary;
mod config;
mod mesh;
mod paths;
mod pipeline;
mod shapes;
mod trace;

fn main() -> Result<()> {
    let config = Config::parse();

    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    run(config)
}

pub fn run(config: Config) -> Result<()> {
    let span = span!(Level::INFO, "fbd");
    let _guard = span.enter();
    let start = Instant::now();

    let img = ImageReader::open(&config.image_path)
        .with_context(|| format!("failed to open image {:?}", config.image_path))?
        .decode()
        .with_context(|| format!("failed to decode image {:?}", config.image_path))?
        .into_rgb8();
    debug!("Image {:?} is {}x{}", config.image_path, img.width(), img.height());

    let mut mesh = ObjMesh::read(&config.obj_path)?;
    if config.center {
        mesh::center_vertices(&mut mesh.vertices);
    }
    mesh::trim_z(&mut mesh.vertices, config.trim_z);

    if let Some(chunk_dir) = &config.chunk_path {
        let centered = config.center.then_some(&mesh);
        let files = mesh::write_chunks(&config.obj_path, chunk_dir, centered)?;
        info!("Chunks at {:?} and {:?}", files.voxels, files.texture);
    }

    let pipeline = Pipeline::new(PipelineOptions {
        model_dir: &config.model_dir,
        threads: config.threads(),
        min_confidence: config.min_confidence,
        padding: config.padding,
    })?;

    let face = pipeline.run(&img, 1)?.into_iter().next().ok_or_else(|| {
        Error::msg(format!("No face detected in {:?}", config.image_path))
    })?;
    debug!("Using face {:?}", face.face);

    let projection = TextureProjection {
        width: img.width(),
        height: img.height(),
        flip_v: !config.no_flip_v,
    };

    let keypoints = boundary::keypoints(&mesh, &face.landmarks, projection)?;
    let keypoints_path = paths::sibling_path(&config.boundary_path, "keypoints")?;
    boundary::write_keypoints(&keypoints_path, &keypoints)?;
    info!("Keypoints at {keypoints_path:?}");

    let selected = if config.skip_boundary {
        info!("Skipping boundary mesh");
        None
    } else {
        let index = boundary::select_boundary(&mesh, &face.landmarks.oval(), projection)?;
        let out = paths::boundary_path(&config.boundary_path, Some("obj"))?;
        mesh::write_masked(&out, &mesh, &index)?;
        info!("Boundary of {} vertices at {out:?}", index.len());
        Some(index)
    };

    if config.debug {
        let canvas = trace::draw_overlay(
            &img,
            &face,
            &mesh,
            selected.as_deref().unwrap_or_default(),
            projection,
        );
        trace::save_overlay(
            &canvas,
            &paths::sibling_path_with_ext(&config.boundary_path, "debug", "png")?,
        )?;
    }

    debug!("Took {:?}", start.elapsed());

    Ok(())
}

