//! [`OpResolver`] – fixed-capacity operator registry.
//!
//! Only registered kinds can run. The registry lives in a fixed array so it
//! never allocates, which also caps how many kinds one runtime can carry.

use crate::error::InferenceError;
use crate::graph::OpKind;
use crate::kernels::{KernelFn, kernel_for};

/// Maximum number of operator kinds one resolver holds.
pub const RESOLVER_CAPACITY: usize = 8;

/// Operator kinds the presence graph uses.
pub const PRESENCE_OPS: [OpKind; 7] = [
    OpKind::Conv2D,
    OpKind::MaxPool2D,
    OpKind::FullyConnected,
    OpKind::Reshape,
    OpKind::Quantize,
    OpKind::Dequantize,
    OpKind::Logistic,
];

/// Maps registered [`OpKind`]s to their kernels.
#[derive(Clone)]
pub struct OpResolver {
    entries: [Option<(OpKind, KernelFn)>; RESOLVER_CAPACITY],
    len: usize,
}

impl OpResolver {
    /// An empty resolver.
    pub fn new() -> Self {
        Self {
            entries: [None; RESOLVER_CAPACITY],
            len: 0,
        }
    }

    /// A resolver with exactly [`PRESENCE_OPS`] registered.
    pub fn presence_ops() -> Result<Self, InferenceError> {
        let mut resolver = Self::new();
        for kind in PRESENCE_OPS {
            resolver.register(kind)?;
        }
        Ok(resolver)
    }

    /// Register `kind`. Registering a kind twice is a no-op.
    ///
    /// # Errors
    ///
    /// - [`InferenceError::ResolverFull`] once [`RESOLVER_CAPACITY`] distinct
    ///   kinds are registered.
    /// - [`InferenceError::UnsupportedOp`] if the runtime has no kernel for
    ///   `kind`.
    pub fn register(&mut self, kind: OpKind) -> Result<(), InferenceError> {
        if self.is_registered(kind) {
            return Ok(());
        }
        if self.len == RESOLVER_CAPACITY {
            return Err(InferenceError::ResolverFull {
                capacity: RESOLVER_CAPACITY,
            });
        }
        let kernel = kernel_for(kind).ok_or(InferenceError::UnsupportedOp(kind))?;
        self.entries[self.len] = Some((kind, kernel));
        self.len += 1;
        Ok(())
    }

    pub fn is_registered(&self, kind: OpKind) -> bool {
        self.entries.iter().flatten().any(|(k, _)| *k == kind)
    }

    /// Look up the kernel for `kind`.
    pub fn find(&self, kind: OpKind) -> Result<KernelFn, InferenceError> {
        self.entries
            .iter()
            .flatten()
            .find(|(k, _)| *k == kind)
            .map(|(_, kernel)| *kernel)
            .ok_or(InferenceError::UnsupportedOp(kind))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for OpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().flatten().map(|(k, _)| k))
            .finish()
    }
}
