use std::rc::Rc;

use crate::animation::Motion;
use crate::assets::{ClipCache, ClipStatus};
use crate::utils::easing_sine;

/// Called once when a queued motion finishes; receives the clip key.
pub type FinishCallback = Rc<dyn Fn(&str)>;

/// Opaque id of a queued motion, used only for completion queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionHandle(pub(crate) u64);

/// The clip an entry plays. A lazily fetched clip starts out `Pending` and is
/// resolved against the owning model's [`ClipCache`] on later frames.
pub enum ClipSlot<C> {
    Ready(Rc<C>),
    Pending(String),
}

impl<C> Clone for ClipSlot<C> {
    fn clone(&self) -> Self {
        match self {
            ClipSlot::Ready(clip) => ClipSlot::Ready(clip.clone()),
            ClipSlot::Pending(key) => ClipSlot::Pending(key.clone()),
        }
    }
}

impl<C> ClipSlot<C> {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, ClipSlot::Ready(_))
    }
}

pub(crate) enum Resolve<C> {
    Ready(Rc<C>),
    Waiting,
    Gone,
}

/// One motion in a manager's queue.
pub struct MotionEntry<C> {
    pub(crate) handle: MotionHandle,
    pub(crate) key: String,
    pub(crate) clip: ClipSlot<C>,
    pub(crate) auto_delete: bool,
    pub(crate) on_finished: Option<FinishCallback>,

    /// Manager time at which playback started; unset until the clip is ready.
    start_time: Option<f32>,
    end_time: Option<f32>,
    fade_out_requested: bool,
    pub(crate) finished: bool,
    /// Weight applied on the last update.
    pub weight: f32,
}

impl<C: Motion> MotionEntry<C> {
    pub(crate) fn new(
        handle: MotionHandle,
        key: String,
        clip: ClipSlot<C>,
        auto_delete: bool,
        on_finished: Option<FinishCallback>,
    ) -> Self {
        Self {
            handle,
            key,
            clip,
            auto_delete,
            on_finished,
            start_time: None,
            end_time: None,
            fade_out_requested: false,
            finished: false,
            weight: 0.0,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn handle(&self) -> MotionHandle {
        self.handle
    }

    /// Whether the clip was fetched lazily for this entry.
    #[must_use]
    pub fn auto_delete(&self) -> bool {
        self.auto_delete
    }

    #[must_use]
    pub fn is_fading_out(&self) -> bool {
        self.fade_out_requested
    }

    /// Looks the clip up in `cache` if it was still pending.
    pub(crate) fn resolve(&mut self, cache: &ClipCache<C>) -> Resolve<C> {
        match &self.clip {
            ClipSlot::Ready(clip) => Resolve::Ready(clip.clone()),
            ClipSlot::Pending(key) => match cache.status(key) {
                ClipStatus::Ready => match cache.get(key) {
                    Some(clip) => {
                        self.clip = ClipSlot::Ready(clip.clone());
                        Resolve::Ready(clip)
                    }
                    None => Resolve::Gone,
                },
                ClipStatus::Pending if !self.fade_out_requested => Resolve::Waiting,
                _ => Resolve::Gone,
            },
        }
    }

    /// Starts fading out at `now`, finishing no later than the clip's fade-out time.
    pub(crate) fn start_fade_out(&mut self, now: f32) {
        self.fade_out_requested = true;
        if let ClipSlot::Ready(clip) = &self.clip {
            let end = now + clip.fade_out_time();
            if self.end_time.is_none_or(|current| end < current) {
                self.end_time = Some(end);
            }
        }
    }

    /// Advances the entry to manager time `now` and returns the clip-local
    /// time together with the fade weight to apply.
    pub(crate) fn advance(&mut self, clip: &C, now: f32) -> (f32, f32) {
        let start = match self.start_time {
            Some(start) => start,
            None => {
                self.start_time = Some(now);
                self.end_time = clip.duration().map(|d| now + d);
                if self.fade_out_requested {
                    let end = now + clip.fade_out_time();
                    if self.end_time.is_none_or(|current| end < current) {
                        self.end_time = Some(end);
                    }
                }
                now
            }
        };

        let fade_in = if clip.fade_in_time() <= 0.0 {
            1.0
        } else {
            easing_sine((now - start) / clip.fade_in_time())
        };
        let fade_out = match self.end_time {
            Some(end) if clip.fade_out_time() > 0.0 => {
                easing_sine((end - now) / clip.fade_out_time())
            }
            _ => 1.0,
        };
        self.weight = fade_in * fade_out;

        (now - start, self.weight)
    }

    pub(crate) fn is_past_end(&self, now: f32) -> bool {
        self.end_time.is_some_and(|end| end <= now)
    }
}
