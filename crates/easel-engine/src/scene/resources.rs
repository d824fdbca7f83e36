//! Ownership slots for GPU resources.
//!
//! Each scene object bundles its handles into a resource-set struct of
//! [`Slot`]s, torn down together on `destroy`. A slot is either empty or
//! holds exactly one live handle; releasing an empty slot is a no-op, so
//! partial setups always tear down cleanly.

/// Hook for handles that want an explicit GPU-side release before the
/// Rust value is dropped. Buffers and textures free device memory eagerly;
/// everything else is reclaimed by dropping the handle.
pub trait ReleaseHandle {
    fn release(&self) {}
}

impl ReleaseHandle for wgpu::Buffer {
    fn release(&self) {
        self.destroy();
    }
}

impl ReleaseHandle for wgpu::Texture {
    fn release(&self) {
        self.destroy();
    }
}

impl ReleaseHandle for wgpu::TextureView {}
impl ReleaseHandle for wgpu::Sampler {}
impl ReleaseHandle for wgpu::ShaderModule {}
impl ReleaseHandle for wgpu::BindGroup {}
impl ReleaseHandle for wgpu::RenderPipeline {}
impl ReleaseHandle for wgpu::ComputePipeline {}

/// Single-owner slot for one GPU resource handle.
#[derive(Debug)]
pub struct Slot<T: ReleaseHandle> {
    inner: Option<T>,
}

impl<T: ReleaseHandle> Slot<T> {
    pub const fn empty() -> Self {
        Self { inner: None }
    }

    /// Stores a handle, releasing any previous occupant first.
    pub fn fill(&mut self, value: T) {
        self.release();
        self.inner = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    pub fn is_filled(&self) -> bool {
        self.inner.is_some()
    }

    /// Releases the held handle, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(handle) = self.inner.take() {
            handle.release();
        }
    }
}

impl<T: ReleaseHandle> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked {
        releases: Rc<Cell<u32>>,
    }

    impl ReleaseHandle for Tracked {
        fn release(&self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn tracked() -> (Tracked, Rc<Cell<u32>>) {
        let releases = Rc::new(Cell::new(0));
        (
            Tracked {
                releases: Rc::clone(&releases),
            },
            releases,
        )
    }

    #[test]
    fn empty_slot_release_is_a_no_op() {
        let mut slot: Slot<Tracked> = Slot::empty();
        slot.release();
        assert!(!slot.is_filled());
    }

    #[test]
    fn release_empties_the_slot_exactly_once() {
        let (handle, releases) = tracked();
        let mut slot = Slot::empty();
        slot.fill(handle);

        slot.release();
        slot.release();

        assert!(!slot.is_filled());
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn refilling_releases_the_previous_occupant() {
        let (first, first_releases) = tracked();
        let (second, second_releases) = tracked();

        let mut slot = Slot::empty();
        slot.fill(first);
        slot.fill(second);

        assert_eq!(first_releases.get(), 1);
        assert_eq!(second_releases.get(), 0);
        assert!(slot.is_filled());
    }
}
