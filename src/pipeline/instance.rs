//! Compiled pipeline instances and the per-pipeline instance list.

use std::fmt;

use crate::state::GraphicsPipelineStateInfo;

/// Opaque native pipeline handle returned by the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineHandle(pub u64);

impl PipelineHandle {
    pub const NULL: Self = Self(0);

    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineHandle({:#x})", self.0)
    }
}

/// Graphics pipeline instance
///
/// Stores a state vector and the corresponding pipeline handle. Immutable
/// once constructed. The `Default` value (default state, null handle) is a
/// placeholder and never lives in an instance list.
#[derive(Debug, Clone, Default)]
pub struct GraphicsPipelineInstance {
    state: GraphicsPipelineStateInfo,
    hash: u64,
    handle: PipelineHandle,
}

impl GraphicsPipelineInstance {
    #[must_use]
    pub fn new(state: GraphicsPipelineStateInfo, handle: PipelineHandle) -> Self {
        let hash = state.hash_value();
        Self { state, hash, handle }
    }

    /// Checks for matching pipeline state.
    #[inline]
    #[must_use]
    pub fn is_compatible(&self, state: &GraphicsPipelineStateInfo) -> bool {
        self.state == *state
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> PipelineHandle {
        self.handle
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &GraphicsPipelineStateInfo {
        &self.state
    }
}

/// Append-only list of instances shared between threads.
///
/// Readers never lock: `find` walks a `boxcar::Vec`, whose elements are
/// fully initialized before they become visible and are never moved or
/// freed until the list itself is dropped. `insert` is thread-safe on its
/// own but does **not** check for duplicates; the owning pipeline serializes
/// inserts and performs the uniqueness check under its mutex.
#[derive(Default)]
pub struct GraphicsPipelineInstances {
    instances: boxcar::Vec<GraphicsPipelineInstance>,
}

impl GraphicsPipelineInstances {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an instance compatible with `state`.
    #[must_use]
    pub fn find(&self, state: &GraphicsPipelineStateInfo) -> Option<&GraphicsPipelineInstance> {
        self.find_hashed(state, state.hash_value())
    }

    /// Same as [`find`](Self::find) with a precomputed `state.hash_value()`.
    #[must_use]
    pub fn find_hashed(&self, state: &GraphicsPipelineStateInfo, hash: u64) -> Option<&GraphicsPipelineInstance> {
        self.iter()
            .find(|instance| instance.hash == hash && instance.is_compatible(state))
    }

    /// Appends a new instance and returns a reference to it.
    pub fn insert(&self, state: GraphicsPipelineStateInfo, handle: PipelineHandle) -> &GraphicsPipelineInstance {
        debug_assert!(!handle.is_null(), "null handles must not be cached");
        let index = self.instances.push(GraphicsPipelineInstance::new(state, handle));
        &self.instances[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphicsPipelineInstance> + '_ {
        self.instances.iter().map(|(_, instance)| instance)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for GraphicsPipelineInstances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsPipelineInstances")
            .field("len", &self.len())
            .finish()
    }
}
