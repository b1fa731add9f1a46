use std::collections::HashMap;

use crate::caps::PipelineCaps;

/// Compiled programs keyed by capability descriptor.
#[derive(Debug)]
pub struct PipelineCache<P> {
    pipelines: HashMap<PipelineCaps, P>,
}

impl<P> Default for PipelineCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PipelineCache<P> {
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    pub fn try_get(&self, caps: &PipelineCaps) -> Option<&P> {
        self.pipelines.get(caps)
    }

    /// Stores the program for `caps` and returns it.
    ///
    /// Registering a descriptor twice is a caller bug: programs are built once.
    pub fn register(&mut self, caps: PipelineCaps, pipeline: P) -> &P {
        use std::collections::hash_map::Entry;

        match self.pipelines.entry(caps) {
            Entry::Occupied(_) => panic!("pipeline for {caps:?} registered twice"),
            Entry::Vacant(slot) => slot.insert(pipeline),
        }
    }

    /// Returns the cached program, building and registering it on a miss.
    pub fn get_or_insert_with(&mut self, caps: PipelineCaps, build: impl FnOnce() -> P) -> &P {
        self.pipelines.entry(caps).or_insert_with(build)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
