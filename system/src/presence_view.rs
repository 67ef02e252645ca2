use std::collections::HashMap;

use crate::message::ServerMessage;
use crate::presence::PresenceRecord;
use crate::types::{short_id, Color, Point, SessionId};

/// An on-screen cursor of a remote session.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorIndicator {
    pub label: String,
    pub color: Color,
    /// Page coordinates.
    pub position: Point,
}

/// What the rendering layer has to do after a relay notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewChange {
    Identified { id: SessionId, color: Color },
    IndicatorCreated { id: SessionId, label: String, color: Color },
    IndicatorMoved { id: SessionId, position: Point },
    IndicatorRemoved { id: SessionId },
    ActiveUsersChanged(usize),
}

/// Client-side view of remote sessions.
///
/// Indicators are keyed by session id, so repeated cursor notifications from
/// the same session only move the existing indicator. The roster only feeds
/// the participant count; the local session is never part of it.
pub struct PresenceView {
    local_id: Option<SessionId>,
    local_color: Option<Color>,
    indicators: HashMap<SessionId, CursorIndicator>,
    roster: HashMap<SessionId, PresenceRecord>,
}

impl PresenceView {
    pub fn new() -> Self {
        Self {
            local_id: None,
            local_color: None,
            indicators: HashMap::new(),
            roster: HashMap::new(),
        }
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn local_color(&self) -> Option<&str> {
        self.local_color.as_deref()
    }

    pub fn active_users(&self) -> usize {
        self.roster.len() + 1
    }

    pub fn indicator(&self, id: &str) -> Option<&CursorIndicator> {
        self.indicators.get(id)
    }

    pub fn indicator_count(&self) -> usize {
        self.indicators.len()
    }

    /// `canvas_origin` is the canvas' top-left corner in page coordinates.
    pub fn apply(&mut self, message: ServerMessage, canvas_origin: Point) -> Vec<ViewChange> {
        match message {
            ServerMessage::Init { user_id, color } => {
                self.local_id = Some(user_id.clone());
                self.local_color = Some(color.clone());
                let mut changes = vec![ViewChange::Identified { id: user_id.clone(), color }];
                if self.roster.remove(&user_id).is_some() {
                    changes.push(ViewChange::ActiveUsersChanged(self.active_users()));
                }
                if self.indicators.remove(&user_id).is_some() {
                    changes.push(ViewChange::IndicatorRemoved { id: user_id });
                }
                changes
            }
            ServerMessage::Cursor {
                user_id,
                cursor,
                color,
                name,
            } => {
                if self.is_local(&user_id) {
                    return Vec::new();
                }
                let mut changes = Vec::new();
                let position = cursor.offset_by(&canvas_origin);
                let indicator = self.indicators.entry(user_id.clone()).or_insert_with(|| {
                    let label = if name.is_empty() {
                        short_id(&user_id, 6)
                    } else {
                        name
                    };
                    changes.push(ViewChange::IndicatorCreated {
                        id: user_id.clone(),
                        label: label.clone(),
                        color: color.clone(),
                    });
                    CursorIndicator {
                        label,
                        color,
                        position,
                    }
                });
                indicator.position = position;
                changes.push(ViewChange::IndicatorMoved {
                    id: user_id,
                    position,
                });
                changes
            }
            ServerMessage::UserJoined { user } => {
                if self.is_local(&user.id) {
                    return Vec::new();
                }
                self.roster.insert(user.id.clone(), user);
                vec![ViewChange::ActiveUsersChanged(self.active_users())]
            }
            ServerMessage::ExistingUsers { users } => {
                for user in users {
                    if !self.is_local(&user.id) {
                        self.roster.insert(user.id.clone(), user);
                    }
                }
                vec![ViewChange::ActiveUsersChanged(self.active_users())]
            }
            ServerMessage::UserLeft { user_id } => {
                let mut changes = Vec::new();
                if self.indicators.remove(&user_id).is_some() {
                    changes.push(ViewChange::IndicatorRemoved {
                        id: user_id.clone(),
                    });
                }
                self.roster.remove(&user_id);
                changes.push(ViewChange::ActiveUsersChanged(self.active_users()));
                changes
            }
        }
    }

    /// Drops everything learned from the relay. The next connection gets a
    /// fresh identity and roster.
    pub fn disconnected(&mut self) -> Vec<ViewChange> {
        self.local_id = None;
        self.roster.clear();
        let mut changes = self
            .indicators
            .drain()
            .map(|(id, _)| ViewChange::IndicatorRemoved { id })
            .collect::<Vec<_>>();
        changes.push(ViewChange::ActiveUsersChanged(self.active_users()));
        changes
    }

    fn is_local(&self, id: &str) -> bool {
        self.local_id.as_deref() == Some(id)
    }
}

impl Default for PresenceView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Point {
        Point::new(100.0, 50.0)
    }

    fn record(id: &str, name: &str) -> PresenceRecord {
        PresenceRecord {
            id: id.into(),
            name: Some(name.into()),
            color: "#4ECDC4".into(),
            cursor: None,
        }
    }

    fn cursor(id: &str, x: f64, y: f64) -> ServerMessage {
        ServerMessage::Cursor {
            user_id: id.into(),
            cursor: Point::new(x, y),
            color: "#4ECDC4".into(),
            name: "Bob".into(),
        }
    }

    fn init(view: &mut PresenceView) {
        view.apply(
            ServerMessage::Init {
                user_id: "me".into(),
                color: "#FF6B6B".into(),
            },
            origin(),
        );
    }

    #[test]
    fn it_creates_indicator_once_per_session() {
        let mut view = PresenceView::new();
        init(&mut view);

        let first = view.apply(cursor("bob", 10.0, 20.0), origin());
        assert_eq!(first.len(), 2);
        assert!(matches!(first[0], ViewChange::IndicatorCreated { .. }));

        let second = view.apply(cursor("bob", 10.0, 20.0), origin());
        assert_eq!(
            second,
            vec![ViewChange::IndicatorMoved {
                id: "bob".into(),
                position: Point::new(110.0, 70.0),
            }]
        );
        assert_eq!(view.indicator_count(), 1);
        assert_eq!(view.indicator("bob").expect("").label, "Bob");
    }

    #[test]
    fn it_labels_nameless_cursor_with_id_prefix() {
        let mut view = PresenceView::new();
        let changes = view.apply(
            ServerMessage::Cursor {
                user_id: "0123456789".into(),
                cursor: Point::new(0.0, 0.0),
                color: "#4ECDC4".into(),
                name: String::new(),
            },
            origin(),
        );
        assert_eq!(
            changes[0],
            ViewChange::IndicatorCreated {
                id: "0123456789".into(),
                label: "012345".into(),
                color: "#4ECDC4".into(),
            }
        );
    }

    #[test]
    fn it_ignores_own_cursor_and_own_roster_entry() {
        let mut view = PresenceView::new();
        init(&mut view);

        assert!(view.apply(cursor("me", 1.0, 1.0), origin()).is_empty());
        view.apply(
            ServerMessage::ExistingUsers {
                users: vec![record("me", "Me"), record("alice", "Alice")],
            },
            origin(),
        );
        assert_eq!(view.indicator_count(), 0);
        assert_eq!(view.active_users(), 2);
    }

    #[test]
    fn it_counts_local_user_plus_roster() {
        let mut view = PresenceView::new();
        init(&mut view);
        assert_eq!(view.active_users(), 1);

        view.apply(
            ServerMessage::UserJoined {
                user: record("alice", "Alice"),
            },
            origin(),
        );
        view.apply(
            ServerMessage::UserJoined {
                user: record("alice", "Alice"),
            },
            origin(),
        );
        assert_eq!(view.active_users(), 2);
    }

    #[test]
    fn it_removes_indicator_and_roster_entry_on_leave() {
        let mut view = PresenceView::new();
        init(&mut view);
        view.apply(
            ServerMessage::UserJoined {
                user: record("bob", "Bob"),
            },
            origin(),
        );
        view.apply(cursor("bob", 5.0, 5.0), origin());

        let changes = view.apply(
            ServerMessage::UserLeft {
                user_id: "bob".into(),
            },
            origin(),
        );
        assert_eq!(
            changes,
            vec![
                ViewChange::IndicatorRemoved { id: "bob".into() },
                ViewChange::ActiveUsersChanged(1),
            ]
        );
        assert!(view.indicator("bob").is_none());
    }

    #[test]
    fn it_forgets_remote_sessions_when_disconnected() {
        let mut view = PresenceView::new();
        init(&mut view);
        view.apply(cursor("bob", 5.0, 5.0), origin());
        view.apply(
            ServerMessage::ExistingUsers {
                users: vec![record("bob", "Bob")],
            },
            origin(),
        );

        let changes = view.disconnected();
        assert!(changes.contains(&ViewChange::IndicatorRemoved { id: "bob".into() }));
        assert_eq!(view.active_users(), 1);
        assert!(view.local_id().is_none());
        assert_eq!(view.local_color(), Some("#FF6B6B"));
    }
}
