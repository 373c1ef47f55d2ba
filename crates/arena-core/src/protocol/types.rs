//! Shared value types and numeric enumerations carried inside payloads.

use serde::{Deserialize, Serialize};

numeric_enum! {
    /// Topic flavours a client can join.
    pub enum TopicType {
        #[default]
        DirectMessage = 0 => "DIRECT_MESSAGE",
        Room = 1 => "ROOM",
        Group = 2 => "GROUP",
    }
}

numeric_enum! {
    /// Identity providers a user can link to their account.
    pub enum AuthProvider {
        #[default]
        Device = 0 => "DEVICE",
        Email = 1 => "EMAIL",
        Facebook = 2 => "FACEBOOK",
        Google = 3 => "GOOGLE",
        GameCenter = 4 => "GAME_CENTER",
        Steam = 5 => "STEAM",
        Custom = 6 => "CUSTOM",
    }
}

numeric_enum! {
    pub enum StorageReadPermission {
        #[default]
        NoRead = 0 => "NO_READ",
        OwnerRead = 1 => "OWNER_READ",
        PublicRead = 2 => "PUBLIC_READ",
    }
}

numeric_enum! {
    pub enum StorageWritePermission {
        #[default]
        NoWrite = 0 => "NO_WRITE",
        OwnerWrite = 1 => "OWNER_WRITE",
    }
}

numeric_enum! {
    /// How a leaderboard record write combines with the stored score.
    pub enum ScoreOp {
        #[default]
        Best = 0 => "BEST",
        Set = 1 => "SET",
        Incr = 2 => "INCR",
        Decr = 3 => "DECR",
    }
}

/// One live session of one user, as seen by other participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserPresence {
    pub user_id: String,
    pub session_id: String,
    pub handle: String,
}

/// Fully-qualified topic identifier.
///
/// For direct messages `id` is the two participants' user ids, sorted and
/// joined by `:`, so both sides resolve the same topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopicId {
    pub kind: TopicType,
    pub id: String,
}

impl TopicId {
    pub fn room(name: impl Into<String>) -> Self {
        Self {
            kind: TopicType::Room,
            id: name.into(),
        }
    }

    pub fn group(group_id: impl Into<String>) -> Self {
        Self {
            kind: TopicType::Group,
            id: group_id.into(),
        }
    }

    pub fn direct(a: &str, b: &str) -> Self {
        let id = if a <= b {
            format!("{a}:{b}")
        } else {
            format!("{b}:{a}")
        };
        Self {
            kind: TopicType::DirectMessage,
            id,
        }
    }

    /// Key under which the tracker stores this topic's presences.
    pub fn stream_key(&self) -> String {
        format!("topic:{}:{}", i32::from(self.kind), self.id)
    }
}
