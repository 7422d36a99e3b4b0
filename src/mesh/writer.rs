use super::obj::{ObjMesh, Vertex};
use super::transform::center_tex_coords;
use anyhow::{Context, Error, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ChunkFiles {
    pub voxels: PathBuf,
    pub texture: PathBuf,
    pub centered: Option<(PathBuf, PathBuf)>,
}

/// Split the `v` and `vt` lines of an OBJ into `<stem>_voxels.txt` and
/// `<stem>_texture.txt` under `out_dir`, tags stripped.
pub fn split_obj(obj_path: &Path, out_dir: &Path) -> Result<ChunkFiles> {
    let contents = fs::read_to_string(obj_path)
        .with_context(|| format!("failed to read object {obj_path:?}"))?;
    let stem = file_stem(obj_path)?;

    fs::create_dir_all(out_dir).with_context(|| format!("failed to create {out_dir:?}"))?;
    let files = ChunkFiles {
        voxels: out_dir.join(format!("{stem}_voxels.txt")),
        texture: out_dir.join(format!("{stem}_texture.txt")),
        centered: None,
    };

    let mut voxels = create(&files.voxels)?;
    let mut texture = create(&files.texture)?;

    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("v ") {
            writeln!(voxels, "{}", rest.trim())?;
        } else if let Some(rest) = line.strip_prefix("vt ") {
            writeln!(texture, "{}", rest.trim())?;
        }
    }

    voxels.flush()?;
    texture.flush()?;
    debug!("Split {obj_path:?} into {files:?}");

    Ok(files)
}

/// `split_obj`, plus `<stem>_voxels_centered.txt` and
/// `<stem>_texture_centered.txt` from `centered` when given. The vertices are
/// written as they are; the texture coordinates are centered here.
pub fn write_chunks(
    obj_path: &Path,
    out_dir: &Path,
    centered: Option<&ObjMesh>,
) -> Result<ChunkFiles> {
    let mut files = split_obj(obj_path, out_dir)?;

    if let Some(mesh) = centered {
        let voxels = centered_name(&files.voxels)?;
        let texture = centered_name(&files.texture)?;

        write_rows(&voxels, mesh.vertices.iter().map(vertex_row))?;

        let mut tex_coords = mesh.tex_coords.clone();
        center_tex_coords(&mut tex_coords);
        write_rows(&texture, tex_coords.iter().map(|t| [t.u, t.v]))?;

        debug!("Centered chunks at {voxels:?} and {texture:?}");
        files.centered = Some((voxels, texture));
    }

    Ok(files)
}

/// Space separated values, one row per line.
pub fn write_rows<I, R>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = f64>,
{
    let mut out = create(path)?;
    for row in rows {
        let row: Vec<f64> = row.into_iter().collect();
        writeln!(out, "{}", join(row.iter()))?;
    }
    out.flush()?;

    Ok(())
}

pub fn vertex_row(v: &Vertex) -> Vec<f64> {
    v.pos.iter().chain(v.extra.iter()).copied().collect()
}

/// Write the sub-mesh made of the vertices at `index` (0-based, in output
/// order) and every triangle whose three corners are all selected.
/// Triangles are renumbered to the new 1-based positions.
pub fn write_masked(path: &Path, mesh: &ObjMesh, index: &[usize]) -> Result<()> {
    if let Some(bad) = index.iter().find(|i| **i >= mesh.vertices.len()) {
        return Err(Error::msg(format!(
            "vertex {bad} out of range for mesh with {} vertices",
            mesh.vertices.len()
        )));
    }

    let mut idx_mapping: HashMap<usize, usize> = HashMap::with_capacity(index.len());
    for (i, idx) in index.iter().enumerate() {
        idx_mapping.entry(*idx).or_insert(i + 1);
    }

    let mut out = create(path)?;

    // vertices (3D) first
    for idx in index {
        let v = &mesh.vertices[*idx];
        writeln!(out, "v {}", join(vertex_row(v).iter()))?;
    }

    // then texture (2D)
    for t in index.iter().filter_map(|idx| mesh.tex_coords.get(*idx)) {
        writeln!(out, "vt {} {}", t.u, t.v)?;
    }

    let mut written = 0;
    for t in &mesh.triangles {
        let mapped: Option<Vec<usize>> = t
            .vertices
            .iter()
            .map(|v| idx_mapping.get(v).copied())
            .collect();

        if let Some(m) = mapped {
            writeln!(out, "f {}/{} {}/{} {}/{}", m[0], m[0], m[1], m[1], m[2], m[2])?;
            written += 1;
        }
    }

    out.flush()?;
    debug!(
        "Wrote {} vertices, {written} triangles to {path:?}",
        index.len()
    );

    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    Ok(BufWriter::new(f))
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::msg(format!("{path:?} has no file name")))
}

fn centered_name(path: &Path) -> Result<PathBuf> {
    let stem = file_stem(path)?;
    Ok(path.with_file_name(format!("{stem}_centered.txt")))
}

fn join<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
