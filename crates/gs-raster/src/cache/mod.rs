//! Lifetime caches for compiled programs and bound resource sets.
//!
//! Both caches are generic over the backend's handle type so the bookkeeping is shared
//! by every backend. Entries are never evicted.

mod descriptor_set;
mod pipeline;

pub use descriptor_set::{resource_bindings, DescriptorSetCache, ResourceBinding};
pub use pipeline::PipelineCache;
