//! Whole-mesh passes and the remeshing loop.

use super::mesh::PlanarMesh;
use super::ops::{RemeshHooks, RemeshOp};
use crate::executor::{ExecutePass, PassStats};
use crate::mesh_error::MeshWeaveError;
use crate::topology::Tuple;
use serde::{Deserialize, Serialize};

/// Counters of one remeshing round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationStats {
    pub split: PassStats,
    pub collapse: PassStats,
    pub swap: PassStats,
    pub smooth: PassStats,
}

impl PlanarMesh {
    fn run_pass(&self, op: RemeshOp, items: Vec<Tuple>) -> Result<PassStats, MeshWeaveError> {
        let config = self.params.executor.clone();
        if config.num_threads > 0 {
            self.assign_partitions(config.num_threads)?;
        }
        log::debug!("{op:?} pass over {} items", items.len());
        let items = items.into_iter().map(|t| (op, t)).collect();
        ExecutePass::new(RemeshHooks::for_mesh(self), config).run(self, items)
    }

    /// Splits every edge longer than 4/3 of the target, longest first.
    pub fn split_pass(&self) -> Result<PassStats, MeshWeaveError> {
        self.run_pass(RemeshOp::Split, self.mesh().get_edges())
    }

    /// Collapses every edge shorter than 4/5 of the target, shortest first.
    pub fn collapse_pass(&self) -> Result<PassStats, MeshWeaveError> {
        self.run_pass(RemeshOp::Collapse, self.mesh().get_edges())
    }

    pub fn swap_pass(&self) -> Result<PassStats, MeshWeaveError> {
        self.run_pass(RemeshOp::Swap, self.mesh().get_edges())
    }

    /// One tangential relaxation sweep over the interior vertices.
    pub fn smooth_pass(&self) -> Result<PassStats, MeshWeaveError> {
        self.run_pass(RemeshOp::Smooth, self.mesh().get_vertices())
    }

    /// `params.iterations` rounds of split, collapse, swap, and smooth, each
    /// followed by consolidation.
    pub fn remesh(&mut self) -> Result<Vec<IterationStats>, MeshWeaveError> {
        self.params.validate()?;
        let mut history = Vec::with_capacity(self.params.iterations);
        for round in 0..self.params.iterations {
            let stats = IterationStats {
                split: self.split_pass()?,
                collapse: self.collapse_pass()?,
                swap: self.swap_pass()?,
                smooth: self.smooth_pass()?,
            };
            let remap = self.consolidate()?;
            log::info!(
                "remesh round {round}: {} vertices, {} faces, mean edge {:.4}",
                remap.vertex_count(),
                remap.face_count(),
                self.average_edge_length(),
            );
            history.push(stats);
        }
        Ok(history)
    }
}
