use dashmap::{DashMap, DashSet};

use arena_core::protocol::UserPresence;

/// Stream presence: stream_key -> {session_id -> presence}, session_id -> streams.
///
/// Stream keys are opaque here; services namespace them (`topic:...`, `match:...`).
#[derive(Default)]
pub struct Tracker {
    streams: DashMap<String, DashMap<String, UserPresence>>,
    session_streams: DashMap<String, DashSet<String>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
            session_streams: DashMap::new(),
        }
    }

    /// Returns true if the presence was not tracked on this stream before.
    pub fn track(&self, stream: &str, presence: UserPresence) -> bool {
        self.session_streams
            .entry(presence.session_id.clone())
            .or_insert_with(DashSet::new)
            .insert(stream.to_string());

        self.streams
            .entry(stream.to_string())
            .or_insert_with(DashMap::new)
            .insert(presence.session_id.clone(), presence)
            .is_none()
    }

    pub fn untrack(&self, stream: &str, session_id: &str) -> Option<UserPresence> {
        if let Some(set) = self.session_streams.get(session_id) {
            set.remove(stream);
            if set.is_empty() {
                drop(set);
                self.session_streams.remove(session_id);
            }
        }
        self.remove_from_stream(stream, session_id)
    }

    /// Drop every stream membership of a session; returns what was removed.
    pub fn untrack_all(&self, session_id: &str) -> Vec<(String, UserPresence)> {
        let Some((_, streams)) = self.session_streams.remove(session_id) else {
            return vec![];
        };
        streams
            .iter()
            .filter_map(|s| {
                let stream = s.key().to_string();
                self.remove_from_stream(&stream, session_id).map(|p| (stream, p))
            })
            .collect()
    }

    pub fn is_tracked(&self, stream: &str, session_id: &str) -> bool {
        self.streams
            .get(stream)
            .map(|m| m.contains_key(session_id))
            .unwrap_or(false)
    }

    /// Presences on a stream, ordered by user then session for stable output.
    pub fn presences(&self, stream: &str) -> Vec<UserPresence> {
        let mut out: Vec<UserPresence> = self
            .streams
            .get(stream)
            .map(|m| m.iter().map(|e| e.value().clone()).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| (&a.user_id, &a.session_id).cmp(&(&b.user_id, &b.session_id)));
        out
    }

    pub fn count(&self, stream: &str) -> usize {
        self.streams.get(stream).map(|m| m.len()).unwrap_or(0)
    }

    fn remove_from_stream(&self, stream: &str, session_id: &str) -> Option<UserPresence> {
        let removed = self.streams.get(stream)?.remove(session_id).map(|(_, p)| p);
        self.streams.remove_if(stream, |_, m| m.is_empty());
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(user: &str, sid: &str) -> UserPresence {
        UserPresence {
            user_id: user.into(),
            session_id: sid.into(),
            handle: user.into(),
        }
    }

    #[test]
    fn track_is_idempotent_per_session() {
        let t = Tracker::new();
        assert!(t.track("match:1", presence("a", "s1")));
        assert!(!t.track("match:1", presence("a", "s1")));
        assert!(t.track("match:1", presence("b", "s2")));
        assert_eq!(t.count("match:1"), 2);
        assert_eq!(t.presences("match:1")[0].user_id, "a");
    }

    #[test]
    fn untrack_drops_empty_streams() {
        let t = Tracker::new();
        t.track("topic:1:lobby", presence("a", "s1"));
        assert!(t.untrack("topic:1:lobby", "s1").is_some());
        assert!(t.untrack("topic:1:lobby", "s1").is_none());
        assert_eq!(t.count("topic:1:lobby"), 0);
        assert!(t.presences("topic:1:lobby").is_empty());
    }

    #[test]
    fn untrack_all_leaves_other_sessions() {
        let t = Tracker::new();
        t.track("x", presence("a", "s1"));
        t.track("y", presence("a", "s1"));
        t.track("y", presence("b", "s2"));

        let mut removed: Vec<String> = t.untrack_all("s1").into_iter().map(|(s, _)| s).collect();
        removed.sort();
        assert_eq!(removed, vec!["x".to_string(), "y".to_string()]);
        assert!(!t.is_tracked("y", "s1"));
        assert!(t.is_tracked("y", "s2"));
        assert!(t.untrack_all("s1").is_empty());
    }
}
