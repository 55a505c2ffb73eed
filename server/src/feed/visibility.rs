use uuid::Uuid;

use crate::models::Event;

/// Who is looking at a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(id: Option<Uuid>) -> Self {
        id.map_or(Viewer::Anonymous, Viewer::User)
    }
}

/// Listings show the administrator's curated events plus the viewer's own;
/// nobody else's events leak into them.
#[derive(Debug, Clone, Copy)]
pub struct EventScope {
    admin_id: Uuid,
    viewer: Viewer,
}

impl EventScope {
    pub fn new(admin_id: Uuid, viewer: Viewer) -> Self {
        Self { admin_id, viewer }
    }

    /// Owners whose events are admitted, without duplicates.
    pub fn owner_ids(&self) -> Vec<Uuid> {
        match self.viewer.user_id() {
            Some(viewer) if viewer != self.admin_id => vec![self.admin_id, viewer],
            _ => vec![self.admin_id],
        }
    }

    pub fn admits(&self, event: &Event) -> bool {
        event.user_id == self.admin_id || Some(event.user_id) == self.viewer.user_id()
    }

    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        events.into_iter().filter(|e| self.admits(e)).collect()
    }
}
