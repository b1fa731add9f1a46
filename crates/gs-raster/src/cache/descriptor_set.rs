use std::collections::HashMap;

use crate::caps::DescriptorSetCaps;
use crate::shader::binding;

/// One resource a draw program may bind in the resource group.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceBinding {
    Memory,
    Clut,
    TextureSwizzle,
    FramebufferSwizzle,
    DepthSwizzle,
}

impl ResourceBinding {
    /// Binding slot in the resource group.
    pub const fn binding(self) -> u32 {
        match self {
            ResourceBinding::Memory => binding::MEMORY,
            ResourceBinding::Clut => binding::CLUT,
            ResourceBinding::TextureSwizzle => binding::TEXTURE_SWIZZLE,
            ResourceBinding::FramebufferSwizzle => binding::FRAMEBUFFER_SWIZZLE,
            ResourceBinding::DepthSwizzle => binding::DEPTH_SWIZZLE,
        }
    }
}

/// Binding composition for a key, in binding order.
///
/// Memory and the frame/depth lookup tables are always bound; the texture table only
/// when sampling and the CLUT only for indexed textures.
pub fn resource_bindings(caps: &DescriptorSetCaps) -> Vec<ResourceBinding> {
    let mut bindings = vec![ResourceBinding::Memory];
    if caps.uses_clut() {
        bindings.push(ResourceBinding::Clut);
    }
    if caps.has_texture {
        bindings.push(ResourceBinding::TextureSwizzle);
    }
    bindings.push(ResourceBinding::FramebufferSwizzle);
    bindings.push(ResourceBinding::DepthSwizzle);
    bindings
}

/// Bound resource sets keyed by the descriptor-set key.
#[derive(Debug)]
pub struct DescriptorSetCache<R> {
    sets: HashMap<DescriptorSetCaps, R>,
}

impl<R> Default for DescriptorSetCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> DescriptorSetCache<R> {
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
        }
    }

    pub fn try_get(&self, caps: &DescriptorSetCaps) -> Option<&R> {
        self.sets.get(caps)
    }

    pub fn register(&mut self, caps: DescriptorSetCaps, set: R) -> &R {
        use std::collections::hash_map::Entry;

        match self.sets.entry(caps) {
            Entry::Occupied(_) => panic!("resource set for {caps:?} registered twice"),
            Entry::Vacant(slot) => slot.insert(set),
        }
    }

    pub fn get_or_insert_with(&mut self, caps: DescriptorSetCaps, build: impl FnOnce() -> R) -> &R {
        self.sets.entry(caps).or_insert_with(build)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psm::TextureFormat;

    #[test]
    fn composition_follows_two_predicates() {
        use ResourceBinding::*;

        let plain = DescriptorSetCaps::default();
        assert_eq!(
            resource_bindings(&plain),
            [Memory, FramebufferSwizzle, DepthSwizzle]
        );

        let direct = DescriptorSetCaps {
            has_texture: true,
            texture_format: TextureFormat::Ct16,
            ..plain
        };
        assert_eq!(
            resource_bindings(&direct),
            [Memory, TextureSwizzle, FramebufferSwizzle, DepthSwizzle]
        );

        let indexed = DescriptorSetCaps {
            texture_format: TextureFormat::T4HL,
            ..direct
        };
        assert_eq!(
            resource_bindings(&indexed),
            [Memory, Clut, TextureSwizzle, FramebufferSwizzle, DepthSwizzle]
        );

        // An indexed format without sampling binds no CLUT.
        let unsampled = DescriptorSetCaps {
            has_texture: false,
            ..indexed
        };
        assert_eq!(resource_bindings(&unsampled), resource_bindings(&plain));
    }

    #[test]
    fn bindings_are_in_slot_order() {
        let caps = DescriptorSetCaps {
            has_texture: true,
            texture_format: TextureFormat::T8,
            ..Default::default()
        };
        let slots: Vec<u32> = resource_bindings(&caps).iter().map(|b| b.binding()).collect();
        assert_eq!(slots, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn shared_key_reuses_set() {
        let mut cache = DescriptorSetCache::new();
        let key = DescriptorSetCaps::default();
        cache.get_or_insert_with(key, || 7);
        assert_eq!(*cache.get_or_insert_with(key, || 8), 7);
        assert_eq!(cache.len(), 1);
    }
}
