//! Typed entity pools
//!
//! Each pool owns an active list and a free list. An entity lives in exactly
//! one of them; release moves it from active to free, acquire moves it back
//! after a reset. Once the free list is warm, steady-state play allocates
//! nothing.

/// An entity that can be recycled through an [`EntityPool`]
pub trait Poolable: Default {
    /// Clear per-spawn state before the entity is handed out again
    fn reset(&mut self);
    fn is_active(&self) -> bool;
    fn set_active(&mut self, active: bool);
}

#[derive(Debug, Clone)]
pub struct EntityPool<T> {
    active: Vec<T>,
    free: Vec<T>,
}

impl<T: Poolable> Default for EntityPool<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: Poolable> EntityPool<T> {
    /// Pool with `n` pre-built free entities
    pub fn with_capacity(n: usize) -> Self {
        let mut free = Vec::with_capacity(n);
        free.resize_with(n, T::default);
        Self {
            active: Vec::with_capacity(n),
            free,
        }
    }

    /// Take an entity from the free list (or build one) and mark it active
    pub fn acquire(&mut self) -> &mut T {
        let mut item = self.free.pop().unwrap_or_default();
        item.reset();
        item.set_active(true);
        self.active.push(item);
        let last = self.active.len() - 1;
        &mut self.active[last]
    }

    /// Return the active entity at `index` to the free list
    pub fn release(&mut self, index: usize) {
        let mut item = self.active.remove(index);
        debug_assert!(item.is_active(), "entity released twice");
        item.set_active(false);
        self.free.push(item);
    }

    /// Release every active entity matching `pred`, keeping the order of the rest
    pub fn release_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut released = 0;
        let mut i = 0;
        while i < self.active.len() {
            if pred(&self.active[i]) {
                self.release(i);
                released += 1;
            } else {
                i += 1;
            }
        }
        released
    }

    /// Return everything to the free list
    pub fn release_all(&mut self) {
        while !self.active.is_empty() {
            self.release(self.active.len() - 1);
        }
    }

    pub fn active(&self) -> &[T] {
        &self.active
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.active.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.active.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Entities waiting for reuse
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Test hook: inspect the free list
    #[cfg(test)]
    pub(crate) fn free(&self) -> &[T] {
        &self.free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Default, Clone)]
    struct Dummy {
        value: u32,
        active: bool,
    }

    impl Poolable for Dummy {
        fn reset(&mut self) {
            self.value = 0;
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    #[test]
    fn test_acquire_reuses_and_resets() {
        let mut pool: EntityPool<Dummy> = EntityPool::with_capacity(2);
        assert_eq!(pool.free_len(), 2);

        pool.acquire().value = 7;
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.free_len(), 1);

        pool.release(0);
        assert_eq!(pool.free_len(), 2);

        let reused = pool.acquire();
        assert_eq!(reused.value, 0, "reused entity must be reset");
        assert!(reused.active);
    }

    #[test]
    fn test_grows_when_free_list_empty() {
        let mut pool: EntityPool<Dummy> = EntityPool::default();
        for _ in 0..5 {
            pool.acquire();
        }
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.free_len(), 0);
    }

    #[test]
    fn test_release_where_keeps_order() {
        let mut pool: EntityPool<Dummy> = EntityPool::default();
        for v in 1..=5 {
            pool.acquire().value = v;
        }
        let n = pool.release_where(|d| d.value % 2 == 0);
        assert_eq!(n, 2);
        let left: Vec<u32> = pool.iter().map(|d| d.value).collect();
        assert_eq!(left, vec![1, 3, 5]);
    }

    #[test]
    fn test_release_all() {
        let mut pool: EntityPool<Dummy> = EntityPool::default();
        for _ in 0..3 {
            pool.acquire();
        }
        pool.release_all();
        assert!(pool.is_empty());
        assert_eq!(pool.free_len(), 3);
        assert!(pool.free().iter().all(|d| !d.active));
    }

    proptest! {
        /// Active entities are flagged active, pooled ones are not, and the
        /// total population never shrinks or duplicates.
        #[test]
        fn prop_pool_invariant(ops in proptest::collection::vec((any::<bool>(), any::<u8>()), 1..200)) {
            let mut pool: EntityPool<Dummy> = EntityPool::with_capacity(4);
            let mut population = 4usize;

            for (acquire, pick) in ops {
                if acquire || pool.is_empty() {
                    if pool.free_len() == 0 {
                        population += 1;
                    }
                    pool.acquire();
                } else {
                    let idx = pick as usize % pool.len();
                    pool.release(idx);
                }

                prop_assert!(pool.iter().all(|d| d.active));
                prop_assert!(pool.free().iter().all(|d| !d.active));
                prop_assert_eq!(pool.len() + pool.free_len(), population);
            }
        }
    }
}
