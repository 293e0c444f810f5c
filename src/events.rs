//! Hit-area event registry.
//!
//! Listeners subscribe to one of the five [`HitArea`] tags and are invoked
//! synchronously, in subscription order, when the scene emits that tag.

use std::fmt;
use std::str::FromStr;

use slotmap::{SlotMap, new_key_type};

use crate::errors::WidgetError;

new_key_type! {
    pub struct ListenerId;
}

/// Closed set of tap targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitArea {
    Head,
    Body,
    Left,
    Right,
    Other,
}

impl HitArea {
    pub const ALL: [HitArea; 5] = [
        HitArea::Head,
        HitArea::Body,
        HitArea::Left,
        HitArea::Right,
        HitArea::Other,
    ];

    /// Name used in the model manifest's `HitAreas[].Name`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HitArea::Head => "Head",
            HitArea::Body => "Body",
            HitArea::Left => "Left",
            HitArea::Right => "Right",
            HitArea::Other => "Other",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HitArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HitArea {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HitArea::ALL
            .into_iter()
            .find(|area| area.as_str() == s)
            .ok_or_else(|| WidgetError::Config(format!("unknown hit area '{s}'")))
    }
}

type Listener = Box<dyn FnMut()>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: SlotMap<ListenerId, Listener>,
    order: [Vec<ListenerId>; 5],
}

impl EventEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `area`; the returned id removes it again.
    pub fn on(&mut self, area: HitArea, callback: impl FnMut() + 'static) -> ListenerId {
        let id = self.listeners.insert(Box::new(callback));
        self.order[area.slot()].push(id);
        id
    }

    /// Removes a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        if self.listeners.remove(id).is_none() {
            return false;
        }
        for list in &mut self.order {
            list.retain(|l| *l != id);
        }
        true
    }

    /// Invokes every listener of `area` in registration order.
    pub fn emit(&mut self, area: HitArea) {
        let Self { listeners, order } = self;
        for id in &order[area.slot()] {
            if let Some(callback) = listeners.get_mut(*id) {
                callback();
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self, area: HitArea) -> usize {
        self.order[area.slot()].len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
        for list in &mut self.order {
            list.clear();
        }
    }
}
