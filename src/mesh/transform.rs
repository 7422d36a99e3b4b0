use super::obj::{TexCoord, Vertex};

/// Shift each position axis so its centre sits on 0.
///
/// The centre of an axis is `min + floor((max - min) / 2)`, which keeps
/// integer pixel/voxel grids on whole numbers.
pub fn center_vertices(vertices: &mut [Vertex]) {
    for axis in 0..3 {
        if let Some(shift) = center_shift(vertices.iter().map(|v| v.pos[axis])) {
            vertices.iter_mut().for_each(|v| v.pos[axis] += shift);
        }
    }
}

pub fn center_tex_coords(tex_coords: &mut [TexCoord]) {
    if let Some(shift) = center_shift(tex_coords.iter().map(|t| t.u)) {
        tex_coords.iter_mut().for_each(|t| t.u += shift);
    }
    if let Some(shift) = center_shift(tex_coords.iter().map(|t| t.v)) {
        tex_coords.iter_mut().for_each(|t| t.v += shift);
    }
}

fn center_shift(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })?;

    let center = min + ((max - min) / 2.).floor();
    Some(-center)
}

/// Flatten the back of the mesh: every z below `min_z * trim` is raised to
/// it. `trim` outside `[0, 1]` means no trimming.
pub fn trim_z(vertices: &mut [Vertex], trim: f64) {
    let trim = if (0.0..=1.0).contains(&trim) { trim } else { 1.0 };
    if trim == 1.0 {
        return;
    }

    let Some(min_z) = vertices.iter().map(|v| v.pos[2]).reduce(f64::min) else {
        return;
    };

    let trim_min = min_z * trim;
    for v in vertices.iter_mut() {
        v.pos[2] = v.pos[2].max(trim_min);
    }
}
