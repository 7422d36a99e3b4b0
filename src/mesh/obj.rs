use anyhow::{Context, Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: [f64; 3],
    // trailing columns, e.g. per-vertex colour
    pub extra: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexCoord {
    pub u: f64,
    pub v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLayout {
    /// `f a/b a/b a/b`
    Pair,
    /// `f a/b/c a/b/c a/b/c`
    Full,
    /// anything else (`f a b c`, `f a//c ...`)
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    /// 0-based vertex indices
    pub vertices: [usize; 3],
    pub layout: FaceLayout,
}

#[derive(Debug, Clone, Default)]
pub struct ObjMesh {
    pub vertices: Vec<Vertex>,
    pub tex_coords: Vec<TexCoord>,
    pub triangles: Vec<Triangle>,
}

impl ObjMesh {
    pub fn read(path: &Path) -> Result<ObjMesh> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read object {path:?}"))?;
        let mesh = Self::parse(&contents).with_context(|| format!("failed to parse {path:?}"))?;

        debug!(
            "Loaded {path:?}: {} vertices, {} texture coords, {} triangles",
            mesh.vertices.len(),
            mesh.tex_coords.len(),
            mesh.triangles.len()
        );

        Ok(mesh)
    }

    pub fn parse(contents: &str) -> Result<ObjMesh> {
        let mut mesh = ObjMesh::default();
        let mut faces = Vec::new();
        let mut skipped = 0;
        let mut normal_count = 0;

        for (line_idx, line) in contents.lines().enumerate() {
            let line_no = line_idx + 1;
            let mut parts = line.split_whitespace();

            match parts.next() {
                Some("v") => {
                    let values = parse_floats(parts, line_no)?;
                    if values.len() < 3 {
                        return Err(Error::msg(format!(
                            "line {line_no}: vertex needs 3 coordinates, got {}",
                            values.len()
                        )));
                    }
                    mesh.vertices.push(Vertex {
                        pos: [values[0], values[1], values[2]],
                        extra: values[3..].to_vec(),
                    });
                }
                Some("vt") => {
                    let values = parse_floats(parts, line_no)?;
                    if values.len() < 2 {
                        return Err(Error::msg(format!(
                            "line {line_no}: texture coordinate needs 2 values, got {}",
                            values.len()
                        )));
                    }
                    mesh.tex_coords.push(TexCoord {
                        u: values[0],
                        v: values[1],
                    });
                }
                Some("vn") => normal_count += 1,
                Some("f") => {
                    let corners = parts.collect::<Vec<_>>();
                    if corners.len() != 3 {
                        skipped += 1;
                        continue;
                    }

                    let mut parsed = Vec::with_capacity(3);
                    let mut layout = None;
                    for corner in corners {
                        let counts = [mesh.vertices.len(), mesh.tex_coords.len(), normal_count];
                        let (c, l) = parse_corner(corner, counts, line_no)?;
                        parsed.push(c);
                        layout = match layout {
                            None => Some(l),
                            Some(prev) if prev == l => Some(l),
                            Some(_) => Some(FaceLayout::Other),
                        };
                    }

                    faces.push(Triangle {
                        vertices: [parsed[0], parsed[1], parsed[2]],
                        layout: layout.unwrap_or(FaceLayout::Other),
                    });
                }
                _ => {}
            }
        }

        if skipped > 0 {
            warn!("Skipped {skipped} faces that are not triangles");
        }

        mesh.triangles = select_layout(faces);

        for t in &mesh.triangles {
            if let Some(v) = t.vertices.iter().find(|v| **v >= mesh.vertices.len()) {
                return Err(Error::msg(format!(
                    "face references vertex {} but only {} vertices exist",
                    v + 1,
                    mesh.vertices.len()
                )));
            }
        }

        Ok(mesh)
    }
}

// Scans can mix both slash layouts; the dominant one is the real mesh.
fn select_layout(faces: Vec<Triangle>) -> Vec<Triangle> {
    let full = faces
        .iter()
        .filter(|f| f.layout == FaceLayout::Full)
        .count();
    let pair = faces
        .iter()
        .filter(|f| f.layout == FaceLayout::Pair)
        .count();

    let keep = if full > pair {
        FaceLayout::Full
    } else if pair > 0 {
        FaceLayout::Pair
    } else {
        return faces;
    };

    let total = faces.len();
    let faces: Vec<Triangle> = faces.into_iter().filter(|f| f.layout == keep).collect();
    if faces.len() < total {
        warn!(
            "Dropped {} faces not in the dominant {keep:?} layout",
            total - faces.len()
        );
    }

    faces
}

fn parse_floats<'a>(parts: impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vec<f64>> {
    parts
        .map(|p| {
            p.parse::<f64>()
                .map_err(|e| Error::msg(format!("line {line_no}: bad number {p:?}: {e}")))
        })
        .collect()
}

fn parse_corner(corner: &str, counts: [usize; 3], line_no: usize) -> Result<(usize, FaceLayout)> {
    let fields: Vec<&str> = corner.split('/').collect();

    let index = |s: &str, count: usize| -> Result<Option<usize>> {
        if s.is_empty() {
            return Ok(None);
        }
        let i: i64 = s
            .parse()
            .map_err(|e| Error::msg(format!("line {line_no}: bad index {s:?}: {e}")))?;
        resolve_index(i, count)
            .map(Some)
            .ok_or_else(|| Error::msg(format!("line {line_no}: invalid index {i}")))
    };

    let v = index(fields[0], counts[0])?
        .ok_or_else(|| Error::msg(format!("line {line_no}: face corner without vertex")))?;
    let vt = fields.get(1).map(|s| index(*s, counts[1])).transpose()?.flatten();
    let vn = fields.get(2).map(|s| index(*s, counts[2])).transpose()?.flatten();

    let layout = match (fields.len(), vt.is_some(), vn.is_some()) {
        (2, true, _) => FaceLayout::Pair,
        (3, true, true) => FaceLayout::Full,
        _ => FaceLayout::Other,
    };

    Ok((v, layout))
}

// OBJ indices are 1-based; negative ones count back from the latest element.
fn resolve_index(i: i64, count: usize) -> Option<usize> {
    match i {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => (count as i64 + i).try_into().ok(),
    }
}
