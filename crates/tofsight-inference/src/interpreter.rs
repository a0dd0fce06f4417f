//! [`Interpreter`] – executes a validated [`Graph`] inside an [`Arena`].
//!
//! Construction does all the fallible work: validation, kernel resolution
//! and arena planning. After that, [`Interpreter::invoke`] only walks the
//! operator list.

use tracing::debug;

use crate::arena::{Arena, Region, planned_bytes};
use crate::error::InferenceError;
use crate::graph::{Graph, Tensor};
use crate::kernels::KernelFn;
use crate::resolver::OpResolver;

pub struct Interpreter {
    graph: Graph,
    kernels: Vec<KernelFn>,
    /// Arena region per tensor; `None` for constants.
    regions: Vec<Option<Region>>,
    arena: Arena,
}

impl Interpreter {
    /// Validate `graph`, resolve every operator and carve all activation
    /// tensors out of a fresh `arena_bytes` arena.
    ///
    /// # Errors
    ///
    /// - [`InferenceError::MalformedGraph`] if validation fails.
    /// - [`InferenceError::UnsupportedOp`] if an operator kind is not
    ///   registered in `resolver`.
    /// - [`InferenceError::ArenaExhausted`] if the activations do not fit.
    pub fn new(graph: Graph, resolver: &OpResolver, arena_bytes: usize) -> Result<Self, InferenceError> {
        graph.validate()?;

        let kernels = graph
            .operators
            .iter()
            .map(|op| resolver.find(op.kind()))
            .collect::<Result<Vec<_>, _>>()?;

        let required = planned_bytes(
            graph
                .tensors
                .iter()
                .filter(|t| !t.is_constant())
                .map(Tensor::byte_len),
        )
        .ok_or_else(|| {
            InferenceError::MalformedGraph("activation sizes overflow the address space".to_string())
        })?;
        if required > arena_bytes {
            return Err(InferenceError::ArenaExhausted {
                required,
                capacity: arena_bytes,
            });
        }

        let mut arena = Arena::new(arena_bytes);
        let mut regions = Vec::with_capacity(graph.tensors.len());
        for tensor in &graph.tensors {
            if tensor.is_constant() {
                regions.push(None);
            } else {
                regions.push(Some(arena.allocate(tensor.byte_len())?));
            }
        }
        debug!(
            operators = graph.operators.len(),
            tensors = graph.tensors.len(),
            arena_used = arena.used_bytes(),
            "interpreter planned"
        );

        Ok(Self {
            graph,
            kernels,
            regions,
            arena,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Descriptor of the single input slot.
    pub fn input(&self) -> &Tensor {
        self.graph.input_tensor()
    }

    /// Descriptor of the single output slot.
    pub fn output(&self) -> &Tensor {
        self.graph.output_tensor()
    }

    /// Raw bytes of the input slot.
    pub fn input_bytes_mut(&mut self) -> Result<&mut [u8], InferenceError> {
        let region = self.region(self.graph.input)?;
        Ok(self.arena.bytes_mut(region))
    }

    /// Raw bytes of the output slot.
    pub fn output_bytes(&self) -> Result<&[u8], InferenceError> {
        let region = self.region(self.graph.output)?;
        Ok(self.arena.bytes(region))
    }

    /// Run every operator once, in order.
    pub fn invoke(&mut self) -> Result<(), InferenceError> {
        for (op, kernel) in self.graph.operators.iter().zip(&self.kernels) {
            let read = self.regions[op.input()].ok_or_else(|| missing(op.input()))?;
            let write = self.regions[op.output()].ok_or_else(|| missing(op.output()))?;
            let (input, output) = self.arena.split(read, write)?;
            kernel(op, &self.graph, input, output)?;
        }
        Ok(())
    }

    pub fn arena_used_bytes(&self) -> usize {
        self.arena.used_bytes()
    }

    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    fn region(&self, tensor: usize) -> Result<Region, InferenceError> {
        self.regions
            .get(tensor)
            .copied()
            .flatten()
            .ok_or_else(|| missing(tensor))
    }
}

fn missing(tensor: usize) -> InferenceError {
    InferenceError::InferenceFailed(format!("tensor {tensor} has no arena region"))
}
