//! Groups and scenes.

use srpc_protocol::Destination;

/// Whether the gateway has confirmed an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Requested locally, not yet confirmed.
    Pending,
    /// Confirmed or listed by the gateway.
    Active,
}

/// A group of devices.
///
/// Until the gateway confirms it, a group is known only by name and its id
/// is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Gateway-assigned id.
    pub id: u16,
    /// Display name, also the key used to match the confirmation.
    pub name: String,
    /// Confirmation state.
    pub status: EntryStatus,
}

impl Group {
    pub(crate) fn pending(name: impl Into<String>) -> Self {
        Group {
            id: 0,
            name: name.into(),
            status: EntryStatus::Pending,
        }
    }

    pub(crate) fn active(id: u16, name: impl Into<String>) -> Self {
        Group {
            id,
            name: name.into(),
            status: EntryStatus::Active,
        }
    }

    /// Whether the gateway has confirmed this group.
    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active
    }

    /// Group-addressed destination.
    pub fn destination(&self) -> Destination {
        Destination::group(self.id)
    }
}

/// A stored scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// Group the scene belongs to.
    pub group_id: u16,
    /// Gateway-assigned id within the group. Zero while pending.
    pub scene_id: u8,
    /// Display name.
    pub name: String,
    /// Confirmation state.
    pub status: EntryStatus,
}

impl Scene {
    pub(crate) fn pending(name: impl Into<String>, group_id: u16) -> Self {
        Scene {
            group_id,
            scene_id: 0,
            name: name.into(),
            status: EntryStatus::Pending,
        }
    }

    pub(crate) fn active(group_id: u16, scene_id: u8, name: impl Into<String>) -> Self {
        Scene {
            group_id,
            scene_id,
            name: name.into(),
            status: EntryStatus::Active,
        }
    }

    /// Whether this scene is `name` in group `group_id`.
    pub fn matches(&self, name: &str, group_id: u16) -> bool {
        self.name == name && self.group_id == group_id
    }

    /// Whether the gateway has confirmed this scene.
    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active
    }
}
