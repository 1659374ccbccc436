//! Mesh diagnostics returned alongside every generated mesh.
//!
//! Tube sweeps and extrusions are finalized through the same repair pass
//! (weld, degenerate cull, winding fix, outward orientation); the counters
//! below record what that pass found and changed.

use std::fmt;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the final mesh.
    pub vertex_count: usize,

    /// Total number of triangles in the final mesh.
    pub triangle_count: usize,

    /// Vertices merged during tolerance-based welding.
    pub welded_vertex_count: usize,

    /// Triangles whose winding order was corrected for consistency.
    pub flipped_triangle_count: usize,

    /// Zero-area or collapsed triangles removed.
    pub degenerate_triangle_count: usize,

    /// Edges with only one adjacent triangle. Zero for a closed tube.
    pub open_edge_count: usize,

    /// Edges shared by more than two triangles.
    pub non_manifold_edge_count: usize,

    /// Human-readable notes about repairs and suspicious input.
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Watertight and manifold: the minimum for a valid solid.
    #[must_use]
    pub fn is_valid_solid(&self) -> bool {
        self.is_watertight() && self.is_manifold()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums counts and appends warnings from `other`.
    pub fn merge(&mut self, other: &GeomMeshDiagnostics) {
        self.vertex_count += other.vertex_count;
        self.triangle_count += other.triangle_count;
        self.welded_vertex_count += other.welded_vertex_count;
        self.flipped_triangle_count += other.flipped_triangle_count;
        self.degenerate_triangle_count += other.degenerate_triangle_count;
        self.open_edge_count += other.open_edge_count;
        self.non_manifold_edge_count += other.non_manifold_edge_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Short one-line summary suitable for logging: `"V:{vertices} T:{triangles} [issues...]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.welded_vertex_count > 0 {
            parts.push(format!("welded:{}", self.welded_vertex_count));
        }
        if self.flipped_triangle_count > 0 {
            parts.push(format!("flipped:{}", self.flipped_triangle_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;
        for warning in &self.warnings {
            write!(f, "; {warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_only_nonzero_issues() {
        let diag = GeomMeshDiagnostics {
            vertex_count: 8,
            triangle_count: 12,
            open_edge_count: 2,
            ..GeomMeshDiagnostics::default()
        };
        assert_eq!(diag.summary(), "V:8 T:12 open:2");
        assert!(!diag.is_watertight());
        assert!(diag.is_manifold());
    }

    #[test]
    fn merge_sums_counts_and_warnings() {
        let mut a = GeomMeshDiagnostics::new();
        a.triangle_count = 4;
        let mut b = GeomMeshDiagnostics::new();
        b.triangle_count = 6;
        b.add_warning("mesh has open edges");

        a.merge(&b);
        assert_eq!(a.triangle_count, 10);
        assert_eq!(a.warnings, vec!["mesh has open edges".to_string()]);
        assert_eq!(a.to_string(), "V:0 T:10; mesh has open edges");
    }
}
