//! Cooperative frame clock.
//!
//! Stands in for the page's animation-frame and timer queues. Tasks are plain
//! values handed back to the owner when they come due, so the owner decides
//! what running a task means.

use std::collections::BTreeMap;

/// Cancel handle for one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    NextFrame,
    At(u64),
}

#[derive(Debug)]
pub struct FrameClock<T> {
    now_ms: u64,
    next_handle: u64,
    pending: BTreeMap<FrameHandle, (Due, T)>,
}

impl<T> Default for FrameClock<T> {
    fn default() -> Self {
        FrameClock {
            now_ms: 0,
            next_handle: 1,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> FrameClock<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the last `advance`, in milliseconds.
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Run `task` on the next frame.
    pub fn request_frame(&mut self, task: T) -> FrameHandle {
        self.schedule(Due::NextFrame, task)
    }

    /// Run `task` once `delay_ms` has elapsed from now.
    pub fn set_timeout(&mut self, delay_ms: u64, task: T) -> FrameHandle {
        let deadline = self.now_ms.saturating_add(delay_ms);
        self.schedule(Due::At(deadline), task)
    }

    fn schedule(&mut self, due: Due, task: T) -> FrameHandle {
        let handle = FrameHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle, (due, task));
        handle
    }

    /// Returns whether the handle was still pending.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Move time forward and take every task now due, in scheduling order.
    /// Frame requests are always due. Time never moves backwards.
    pub fn advance(&mut self, now_ms: u64) -> Vec<T> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let due: Vec<FrameHandle> = self
            .pending
            .iter()
            .filter(|(_, (when, _))| match when {
                Due::NextFrame => true,
                Due::At(deadline) => *deadline <= now,
            })
            .map(|(handle, _)| *handle)
            .collect();

        due.into_iter()
            .filter_map(|handle| self.pending.remove(&handle).map(|(_, task)| task))
            .collect()
    }
}
