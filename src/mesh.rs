//! Minimal Wavefront OBJ support: the vertices, texture coordinates and
//! triangles needed to cut a face out of a scanned mesh.
//!
//! The scans this tool works on keep `v` and `vt` lines aligned, so the
//! i-th texture coordinate belongs to the i-th vertex.

pub use obj::{ObjMesh, TexCoord};
pub use transform::{center_vertices, trim_z};
pub use writer::{write_chunks, write_masked};

mod obj;
mod transform;
mod writer;
