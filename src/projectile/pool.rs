//! Slot arena of reusable projectile visual handles.
//!
//! ## Design
//!
//! Each slot holds one [`PooledVisual`]: the sprite family it is configured
//! for, its visibility, and the motion state mirrored to its physics body.
//! A [`VisualHandle`] is `(index, generation)`; the generation is bumped every
//! time the slot is handed out, so a handle kept by a retired projectile can
//! never release (or read) the slot after it has been reassigned.
//!
//! | List      | Holds                                             |
//! |-----------|---------------------------------------------------|
//! | `free`    | retired slots waiting to be reused (≤ capacity)   |
//! | `vacant`  | indices of destroyed slots, reused on allocation  |
//!
//! A slot is either active (held by exactly one projectile) or on `free`,
//! never both.  Releasing while `free` is full destroys the slot instead.

use crate::weapon::ProjectileVisual;
use bevy::prelude::*;

/// Generational reference to one pooled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle {
    index: u32,
    generation: u32,
}

impl VisualHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// State of one live (not destroyed) slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledVisual {
    pub kind: ProjectileVisual,
    pub active: bool,
    pub visible: bool,
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    /// `None` once the slot has been destroyed.
    visual: Option<PooledVisual>,
}

/// Lifetime counters, mostly for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots created from scratch.
    pub allocated: u64,
    /// Acquisitions served from the free list.
    pub recycled: u64,
    /// Slots permanently destroyed (over capacity or at shutdown).
    pub destroyed: u64,
}

#[derive(Debug)]
pub struct ProjectilePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    vacant: Vec<u32>,
    capacity: usize,
    closed: bool,
    stats: PoolStats,
}

impl ProjectilePool {
    /// Pool whose free list never grows beyond `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            capacity,
            closed: false,
            stats: PoolStats::default(),
        }
    }

    /// Pre-create `count` free slots (up to capacity) so the first volleys
    /// don't allocate.
    pub fn prewarm(&mut self, kind: ProjectileVisual, count: usize) {
        let count = count.min(self.capacity.saturating_sub(self.free.len()));
        let mut warmed = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(handle) = self.acquire(kind) {
                warmed.push(handle);
            }
        }
        for handle in warmed {
            self.release(handle);
        }
    }

    /// Hand out a slot configured for `kind`, reusing a retired one if any.
    ///
    /// Returns `None` only after [`ProjectilePool::shutdown`].
    pub fn acquire(&mut self, kind: ProjectileVisual) -> Option<VisualHandle> {
        if self.closed {
            warn!("Projectile pool is shut down; refusing to acquire a {kind:?} handle");
            return None;
        }

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            if let Some(visual) = slot.visual.as_mut() {
                slot.generation = slot.generation.wrapping_add(1);
                visual.kind = kind;
                visual.active = true;
                visual.visible = true;
                self.stats.recycled += 1;
                return Some(VisualHandle {
                    index,
                    generation: slot.generation,
                });
            }
        }

        let fresh = PooledVisual {
            kind,
            active: true,
            visible: true,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
        };
        self.stats.allocated += 1;
        match self.vacant.pop() {
            Some(index) => {
                // Continue the destroyed slot's generation sequence so stale
                // handles to it stay stale.
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.visual = Some(fresh);
                Some(VisualHandle {
                    index,
                    generation: slot.generation,
                })
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    visual: Some(fresh),
                });
                Some(VisualHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                })
            }
        }
    }

    /// Return `handle` to the pool.
    ///
    /// Hides the slot and zeroes its motion, then keeps it on the free list if
    /// there is room or destroys it otherwise.  Stale, already-released, or
    /// post-shutdown handles are ignored and return `false`.
    pub fn release(&mut self, handle: VisualHandle) -> bool {
        if self.closed {
            return false;
        }
        let Some(slot) = self.slot_mut_checked(handle) else {
            return false;
        };
        if !slot.active {
            return false;
        }
        slot.active = false;
        slot.visible = false;
        slot.position = Vec2::ZERO;
        slot.velocity = Vec2::ZERO;

        if self.free.len() < self.capacity {
            self.free.push(handle.index);
        } else {
            self.destroy_slot(handle.index);
            debug!(
                "Projectile pool at capacity ({}); destroyed slot {}",
                self.capacity, handle.index
            );
        }
        true
    }

    #[inline]
    pub fn get(&self, handle: VisualHandle) -> Option<&PooledVisual> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.visual.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, handle: VisualHandle) -> Option<&mut PooledVisual> {
        self.slot_mut_checked(handle)
    }

    /// Current handle of slot `index`, whether active or waiting on the free
    /// list.  `None` for destroyed or out-of-range slots.
    pub fn handle_at(&self, index: usize) -> Option<VisualHandle> {
        let slot = self.slots.get(index)?;
        slot.visual.as_ref()?;
        Some(VisualHandle {
            index: index as u32,
            generation: slot.generation,
        })
    }

    /// Every slot index with its state; `None` marks a destroyed slot.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<&PooledVisual>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.visual.as_ref()))
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn active_len(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|s| s.visual.as_ref())
            .filter(|v| v.active)
            .count()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Destroy every slot and refuse further acquisitions.
    ///
    /// Active slots must have been released by their owner first; any that
    /// remain are destroyed as well.
    pub fn shutdown(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].visual.is_some() {
                self.destroy_slot(index as u32);
            }
        }
        self.free.clear();
        self.closed = true;
    }

    fn slot_mut_checked(&mut self, handle: VisualHandle) -> Option<&mut PooledVisual> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.visual.as_mut())
    }

    fn destroy_slot(&mut self, index: u32) {
        if self.slots[index as usize].visual.take().is_some() {
            self.stats.destroyed += 1;
            if !self.closed {
                self.vacant.push(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_allocates_visible_active_slot() {
        let mut pool = ProjectilePool::new(4);
        let h = pool.acquire(ProjectileVisual::Bolt).unwrap();
        let slot = pool.get(h).unwrap();
        assert!(slot.active && slot.visible);
        assert_eq!(slot.kind, ProjectileVisual::Bolt);
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn reacquired_handle_is_reset_and_retextured() {
        let mut pool = ProjectilePool::new(4);
        let h = pool.acquire(ProjectileVisual::Pellet).unwrap();
        {
            let slot = pool.get_mut(h).unwrap();
            slot.position = Vec2::new(50.0, 60.0);
            slot.velocity = Vec2::new(400.0, -20.0);
        }
        assert!(pool.release(h));
        let released = pool.slots().find_map(|(i, s)| (i == h.index()).then_some(s)).flatten().unwrap();
        assert!(!released.active && !released.visible);

        let again = pool.acquire(ProjectileVisual::Shell).unwrap();
        assert_eq!(again.index(), h.index(), "free list must be reused");
        assert_ne!(again, h, "recycled handle gets a new generation");
        let slot = pool.get(again).unwrap();
        assert!(slot.active && slot.visible);
        assert_eq!(slot.velocity, Vec2::ZERO);
        assert_eq!(slot.position, Vec2::ZERO);
        assert_eq!(slot.kind, ProjectileVisual::Shell);
        assert_eq!(pool.stats().recycled, 1);
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn double_and_stale_release_are_ignored() {
        let mut pool = ProjectilePool::new(4);
        let h = pool.acquire(ProjectileVisual::Pellet).unwrap();
        assert!(pool.release(h));
        assert!(!pool.release(h));
        assert_eq!(pool.free_len(), 1);

        let reused = pool.acquire(ProjectileVisual::Pellet).unwrap();
        assert!(!pool.release(h), "stale handle must not release the new owner's slot");
        assert!(pool.get(reused).unwrap().active);
        assert!(pool.get(h).is_none());
    }

    #[test]
    fn free_list_never_exceeds_capacity() {
        let mut pool = ProjectilePool::new(3);
        let handles: Vec<_> = (0..10)
            .map(|_| pool.acquire(ProjectileVisual::Pellet).unwrap())
            .collect();
        for h in handles {
            assert!(pool.release(h));
            assert!(pool.free_len() <= 3);
        }
        assert_eq!(pool.free_len(), 3);
        assert_eq!(pool.stats().destroyed, 7);
        assert_eq!(pool.active_len(), 0);
    }

    #[test]
    fn destroyed_slot_indices_are_reused_with_fresh_generation() {
        let mut pool = ProjectilePool::new(0);
        let h = pool.acquire(ProjectileVisual::Pellet).unwrap();
        assert!(pool.release(h));
        assert_eq!(pool.free_len(), 0);
        assert!(pool.get(h).is_none());

        let next = pool.acquire(ProjectileVisual::Orb).unwrap();
        assert_eq!(next.index(), h.index());
        assert_ne!(next.generation(), h.generation());
        assert_eq!(pool.slot_count(), 1);
        assert!(!pool.release(h));
    }

    #[test]
    fn prewarm_fills_free_list_once() {
        let mut pool = ProjectilePool::new(8);
        pool.prewarm(ProjectileVisual::Pellet, 20);
        assert_eq!(pool.free_len(), 8);
        assert_eq!(pool.stats().allocated, 8);
        pool.acquire(ProjectileVisual::Bolt).unwrap();
        assert_eq!(pool.stats().allocated, 8);
    }

    #[test]
    fn shutdown_destroys_everything_and_closes() {
        let mut pool = ProjectilePool::new(4);
        let a = pool.acquire(ProjectileVisual::Pellet).unwrap();
        let b = pool.acquire(ProjectileVisual::Pellet).unwrap();
        pool.release(a);
        pool.shutdown();
        assert!(pool.is_closed());
        assert_eq!(pool.free_len(), 0);
        assert!(pool.slots().all(|(_, s)| s.is_none()));
        assert!(pool.acquire(ProjectileVisual::Pellet).is_none());
        assert!(!pool.release(b));
    }
}
