use crate::animation::Motion;
use crate::animation::action::{ClipSlot, FinishCallback, MotionEntry, MotionHandle, Resolve};
use crate::assets::ClipCache;
use crate::engine::CoreModel;

/// Motion priority. Higher priorities may preempt lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    #[default]
    None = 0,
    Idle = 1,
    Normal = 2,
    Force = 3,
}

/// A priority-gated motion queue.
///
/// At most one foreground motion plays at a time; starting a new one fades
/// every live entry out over its own fade-out time while the new entry fades
/// in. The same queue drives motion clips and expressions.
pub struct MotionManager<C> {
    entries: Vec<MotionEntry<C>>,
    user_time: f32,
    current_priority: Priority,
    reserve_priority: Priority,
    next_handle: u64,
}

impl<C> Default for MotionManager<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            user_time: 0.0,
            current_priority: Priority::None,
            reserve_priority: Priority::None,
            next_handle: 1,
        }
    }
}

impl<C: Motion> MotionManager<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_priority(&self) -> Priority {
        self.current_priority
    }

    #[must_use]
    pub fn reserve_priority(&self) -> Priority {
        self.reserve_priority
    }

    pub fn set_reserve_priority(&mut self, priority: Priority) {
        self.reserve_priority = priority;
    }

    /// Claims the play slot at `priority`.
    ///
    /// Fails if an equal or higher priority is already reserved or playing.
    pub fn reserve_motion(&mut self, priority: Priority) -> bool {
        if priority <= self.reserve_priority || priority <= self.current_priority {
            return false;
        }
        self.reserve_priority = priority;
        true
    }

    /// Queues `clip` as the foreground motion at `priority`.
    pub fn start_motion_priority(
        &mut self,
        clip: ClipSlot<C>,
        key: impl Into<String>,
        auto_delete: bool,
        priority: Priority,
        on_finished: Option<FinishCallback>,
    ) -> MotionHandle {
        if priority == self.reserve_priority {
            self.reserve_priority = Priority::None;
        }
        self.current_priority = priority;
        self.start_motion(clip, key, auto_delete, on_finished)
    }

    /// Queues `clip`, fading out everything already playing.
    pub fn start_motion(
        &mut self,
        clip: ClipSlot<C>,
        key: impl Into<String>,
        auto_delete: bool,
        on_finished: Option<FinishCallback>,
    ) -> MotionHandle {
        let now = self.user_time;
        for entry in &mut self.entries {
            entry.start_fade_out(now);
        }

        let handle = MotionHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(MotionEntry::new(
            handle,
            key.into(),
            clip,
            auto_delete,
            on_finished,
        ));
        handle
    }

    /// Advances all entries by `dt` and applies them to `model`.
    ///
    /// Returns true if any entry wrote parameters this frame. Entries whose
    /// clip is still loading are kept but skipped; entries whose clip failed
    /// to load are dropped.
    pub fn update_motion(&mut self, model: &mut dyn CoreModel, dt: f32, cache: &ClipCache<C>) -> bool {
        self.user_time += dt;
        let now = self.user_time;
        let mut updated = false;

        for entry in &mut self.entries {
            let clip = match entry.resolve(cache) {
                Resolve::Ready(clip) => clip,
                Resolve::Waiting => continue,
                Resolve::Gone => {
                    log::debug!("Dropping motion '{}': clip unavailable", entry.key);
                    entry.finished = true;
                    continue;
                }
            };

            let (local_time, weight) = entry.advance(&clip, now);
            clip.apply(model, local_time, weight);
            updated = true;

            if entry.is_past_end(now) {
                entry.finished = true;
                if let Some(callback) = &entry.on_finished {
                    callback(entry.key.as_str());
                }
            }
        }

        self.entries.retain(|entry| !entry.finished);

        if self.entries.is_empty() {
            self.current_priority = Priority::None;
        }

        updated
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once the motion behind `handle` has left the queue.
    #[must_use]
    pub fn is_handle_finished(&self, handle: MotionHandle) -> bool {
        !self.entries.iter().any(|e| e.handle == handle)
    }

    #[must_use]
    pub fn entries(&self) -> &[MotionEntry<C>] {
        &self.entries
    }

    /// Key of the newest entry, if any.
    #[must_use]
    pub fn playing_key(&self) -> Option<&str> {
        self.entries.last().map(|e| e.key.as_str())
    }

    pub fn stop_all_motions(&mut self) {
        self.entries.clear();
        self.current_priority = Priority::None;
        self.reserve_priority = Priority::None;
    }

    pub fn release(&mut self) {
        self.stop_all_motions();
        self.user_time = 0.0;
    }
}
