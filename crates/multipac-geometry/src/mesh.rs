// ─────────────────────────────────────────────────────────────────────
// SCPN Multipac — Triangulated Surfaces
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Triangulated RF-structure surfaces.
//!
//! Holds one vertex triple per cell in struct-of-arrays layout so the
//! intersection kernels stream through contiguous memory. Normals stored in
//! STL files are ignored; collision angles need outward unit normals that
//! are recomputed in one explicit pass.

use log::warn;
use multipac_types::error::{MultipacError, MultipacResult};
use std::path::Path;

use crate::vec3::{cross, normalize, sub};

/// Byte length of one record in binary STL: 12 f32 + u16 attribute.
const STL_BINARY_RECORD: usize = 50;
/// Binary STL header + triangle count.
const STL_BINARY_PREAMBLE: usize = 84;

#[derive(Debug, Clone)]
pub struct TriMesh {
    v0: Vec<[f64; 3]>,
    v1: Vec<[f64; 3]>,
    v2: Vec<[f64; 3]>,
    cell_normals: Option<Vec<[f64; 3]>>,
}

impl TriMesh {
    /// Build from per-cell vertex arrays. Lengths must agree.
    pub fn new(v0: Vec<[f64; 3]>, v1: Vec<[f64; 3]>, v2: Vec<[f64; 3]>) -> MultipacResult<Self> {
        if v0.len() != v1.len() || v0.len() != v2.len() {
            return Err(MultipacError::ShapeMismatch {
                left: v0.len(),
                right: v1.len().min(v2.len()),
                message: "triangle vertex arrays differ in length".to_string(),
            });
        }
        Ok(Self {
            v0,
            v1,
            v2,
            cell_normals: None,
        })
    }

    /// Load a stereolithography file, auto-detecting binary vs ASCII layout.
    pub fn from_stl_file(path: &Path) -> MultipacResult<Self> {
        let bytes = std::fs::read(path)?;
        let label = path.display().to_string();

        if bytes.len() >= STL_BINARY_PREAMBLE {
            let count =
                u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
            if STL_BINARY_PREAMBLE + count * STL_BINARY_RECORD == bytes.len() {
                return parse_stl_binary(&bytes, &label);
            }
        }
        parse_stl_ascii(&String::from_utf8_lossy(&bytes), &label)
    }

    pub fn n_cells(&self) -> usize {
        self.v0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v0.is_empty()
    }

    pub fn v0(&self) -> &[[f64; 3]] {
        &self.v0
    }

    pub fn v1(&self) -> &[[f64; 3]] {
        &self.v1
    }

    pub fn v2(&self) -> &[[f64; 3]] {
        &self.v2
    }

    /// One-time normal computation; collision angles are undefined until
    /// this has run. Degenerate cells get a zero normal, which downstream
    /// angle math turns into NaN rather than an error.
    pub fn compute_cell_normals(&mut self) {
        let mut degenerate = 0usize;
        let normals = self
            .v0
            .iter()
            .zip(self.v1.iter())
            .zip(self.v2.iter())
            .map(|((&a, &b), &c)| {
                let n = normalize(cross(sub(b, a), sub(c, a)));
                if n == [0.0; 3] {
                    degenerate += 1;
                }
                n
            })
            .collect();
        if degenerate > 0 {
            warn!("{degenerate} degenerate cells carry zero normals; their impact angles will be NaN");
        }
        self.cell_normals = Some(normals);
    }

    pub fn cell_normals(&self) -> Option<&[[f64; 3]]> {
        self.cell_normals.as_deref()
    }
}

fn parse_stl_ascii(text: &str, label: &str) -> MultipacResult<TriMesh> {
    let mut vertices: Vec<[f64; 3]> = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if !line.starts_with("vertex") {
            continue;
        }
        let mut fields = line.split_whitespace();
        fields.next(); // "vertex"
        let mut v = [0.0; 3];
        for slot in v.iter_mut() {
            let token = fields.next().ok_or_else(|| MultipacError::FormatError {
                path: label.to_string(),
                line: line_no + 1,
                message: "vertex with fewer than 3 coordinates".to_string(),
            })?;
            *slot = token.parse::<f64>().map_err(|e| MultipacError::FormatError {
                path: label.to_string(),
                line: line_no + 1,
                message: format!("bad coordinate {token:?}: {e}"),
            })?;
        }
        vertices.push(v);
    }

    if vertices.is_empty() {
        return Err(MultipacError::FormatError {
            path: label.to_string(),
            line: 0,
            message: "no vertex records found; not an ASCII STL?".to_string(),
        });
    }
    if vertices.len() % 3 != 0 {
        return Err(MultipacError::FormatError {
            path: label.to_string(),
            line: 0,
            message: format!("vertex count {} is not a multiple of 3", vertices.len()),
        });
    }

    let n = vertices.len() / 3;
    let mut v0 = Vec::with_capacity(n);
    let mut v1 = Vec::with_capacity(n);
    let mut v2 = Vec::with_capacity(n);
    for tri in vertices.chunks_exact(3) {
        v0.push(tri[0]);
        v1.push(tri[1]);
        v2.push(tri[2]);
    }
    TriMesh::new(v0, v1, v2)
}

fn parse_stl_binary(bytes: &[u8], label: &str) -> MultipacResult<TriMesh> {
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    if bytes.len() < STL_BINARY_PREAMBLE + count * STL_BINARY_RECORD {
        return Err(MultipacError::FormatError {
            path: label.to_string(),
            line: 0,
            message: format!(
                "binary STL truncated: header promises {count} triangles, \
                 payload holds {} bytes",
                bytes.len() - STL_BINARY_PREAMBLE.min(bytes.len())
            ),
        });
    }

    let read_f32 = |offset: usize| -> f64 {
        f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]) as f64
    };

    let mut v0 = Vec::with_capacity(count);
    let mut v1 = Vec::with_capacity(count);
    let mut v2 = Vec::with_capacity(count);
    for i in 0..count {
        // Skip the 12-byte stored normal; vertices follow.
        let base = STL_BINARY_PREAMBLE + i * STL_BINARY_RECORD + 12;
        v0.push([read_f32(base), read_f32(base + 4), read_f32(base + 8)]);
        v1.push([read_f32(base + 12), read_f32(base + 16), read_f32(base + 20)]);
        v2.push([read_f32(base + 24), read_f32(base + 28), read_f32(base + 32)]);
    }
    TriMesh::new(v0, v1, v2)
}
