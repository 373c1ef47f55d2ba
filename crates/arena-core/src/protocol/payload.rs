//! Payload variants and their message-kind names.
//!
//! `Payload` is the closed tagged union an envelope carries. `PayloadKind` is
//! its field-less mirror: the stable name used as the dispatch and hook
//! lookup key. Both are generated from one list so a variant cannot exist
//! without a kind, and the kind of a payload never depends on field values.

use serde::{Deserialize, Serialize};

use super::envelope::ErrorPayload;
use super::types::{
    AuthProvider, ScoreOp, StorageReadPermission, StorageWritePermission, TopicId, TopicType,
    UserPresence,
};

macro_rules! payloads {
    (
        request { $( $(#[$rmeta:meta])* $req:ident($req_ty:ty), )+ }
        response { $( $(#[$smeta:meta])* $resp:ident($resp_ty:ty), )+ }
    ) => {
        /// Exactly one active variant of an envelope.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Payload {
            $( $(#[$rmeta])* $req($req_ty), )+
            $( $(#[$smeta])* $resp($resp_ty), )+
        }

        /// Message-kind discriminator of a [`Payload`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PayloadKind {
            $( $req, )+
            $( $resp, )+
        }

        impl Payload {
            pub fn kind(&self) -> PayloadKind {
                match self {
                    $( Payload::$req(_) => PayloadKind::$req, )+
                    $( Payload::$resp(_) => PayloadKind::$resp, )+
                }
            }
        }

        impl PayloadKind {
            /// Every kind, requests first.
            pub const ALL: &'static [PayloadKind] = &[
                $( PayloadKind::$req, )+
                $( PayloadKind::$resp, )+
            ];

            /// Kinds a client may send.
            pub const REQUESTS: &'static [PayloadKind] = &[ $( PayloadKind::$req, )+ ];

            /// Stable message-kind name, e.g. `"GroupCreate"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( PayloadKind::$req => stringify!($req), )+
                    $( PayloadKind::$resp => stringify!($resp), )+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( stringify!($req) => Some(PayloadKind::$req), )+
                    $( stringify!($resp) => Some(PayloadKind::$resp), )+
                    _ => None,
                }
            }

            /// True for kinds a client may send; response-only kinds are never routed.
            pub fn is_request(self) -> bool {
                matches!(self, $( PayloadKind::$req )|+)
            }
        }

        impl ::core::fmt::Display for PayloadKind {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

payloads! {
    request {
        Logout(Logout),
        Link(Link),
        Unlink(Unlink),

        SelfFetch(SelfFetch),
        SelfUpdate(SelfUpdate),
        UsersFetch(UsersFetch),

        FriendAdd(FriendAdd),
        FriendRemove(FriendRemove),
        FriendBlock(FriendBlock),
        FriendsList(FriendsList),

        GroupCreate(GroupCreate),
        GroupUpdate(GroupUpdate),
        GroupRemove(GroupRemove),
        GroupsFetch(GroupsFetch),
        GroupsList(GroupsList),
        GroupsSelfList(GroupsSelfList),
        GroupUsersList(GroupUsersList),
        GroupJoin(GroupJoin),
        GroupLeave(GroupLeave),
        GroupUserAdd(GroupUserAdd),
        GroupUserKick(GroupUserKick),
        GroupUserPromote(GroupUserPromote),

        TopicJoin(TopicJoin),
        TopicLeave(TopicLeave),
        TopicMessageSend(TopicMessageSend),
        TopicMessagesList(TopicMessagesList),

        MatchCreate(MatchCreate),
        MatchJoin(MatchJoin),
        MatchLeave(MatchLeave),
        MatchDataSend(MatchDataSend),

        MatchmakeAdd(MatchmakeAdd),
        MatchmakeRemove(MatchmakeRemove),

        StorageFetch(StorageFetch),
        StorageWrite(StorageWrite),
        StorageRemove(StorageRemove),

        LeaderboardsList(LeaderboardsList),
        LeaderboardRecordWrite(LeaderboardRecordWrite),
        LeaderboardRecordsFetch(LeaderboardRecordsFetch),
        LeaderboardRecordsList(LeaderboardRecordsList),

        /// Also the shape of an rpc response.
        Rpc(Rpc),
    }
    response {
        Error(ErrorPayload),

        Match(Match),
        MatchData(MatchData),
        MatchPresence(MatchPresence),

        MatchmakeTicket(MatchmakeTicket),
        MatchmakeMatched(MatchmakeMatched),

        Topics(Topics),
        TopicMessage(TopicMessage),
        TopicMessageAck(TopicMessageAck),
        TopicPresence(TopicPresence),
    }
}

macro_rules! message {
    ($(
        $(#[$meta:meta])*
        pub struct $name:ident { $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty, )* }
    )+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
            #[serde(default, deny_unknown_fields)]
            pub struct $name {
                $( $(#[$fmeta])* pub $field: $ty, )*
            }
        )+
    };
}

// --------------------
// Session / account
// --------------------
message! {
    pub struct Logout {}

    pub struct Link {
        pub provider: AuthProvider,
        /// Provider credential (device id, email, OAuth token, ...).
        pub token: String,
    }

    pub struct Unlink {
        pub provider: AuthProvider,
        pub id: String,
    }

    pub struct SelfFetch {}

    pub struct SelfUpdate {
        pub handle: String,
        pub fullname: String,
        pub timezone: String,
        pub location: String,
        pub lang: String,
        /// JSON document, opaque to the pipeline.
        pub metadata: String,
        pub avatar_url: String,
    }

    pub struct UsersFetch {
        pub user_ids: Vec<String>,
        pub handles: Vec<String>,
    }
}

// --------------------
// Friends
// --------------------
message! {
    pub struct FriendAdd {
        pub user_id: String,
        pub handle: String,
    }

    pub struct FriendRemove {
        pub user_id: String,
    }

    pub struct FriendBlock {
        pub user_id: String,
    }

    pub struct FriendsList {}
}

// --------------------
// Groups
// --------------------
message! {
    pub struct NewGroup {
        pub name: String,
        pub description: String,
        pub avatar_url: String,
        pub lang: String,
        pub metadata: String,
        pub private: bool,
    }

    pub struct GroupCreate {
        pub groups: Vec<NewGroup>,
    }

    pub struct GroupUpdate {
        pub group_id: String,
        pub name: String,
        pub description: String,
        pub avatar_url: String,
        pub lang: String,
        pub metadata: String,
        pub private: bool,
    }

    pub struct GroupRemove {
        pub group_id: String,
    }

    pub struct GroupsFetch {
        pub group_ids: Vec<String>,
        pub names: Vec<String>,
    }

    pub struct GroupsList {
        pub page_limit: i64,
        pub order_by_asc: bool,
        pub lang: String,
        pub cursor: String,
    }

    pub struct GroupsSelfList {}

    pub struct GroupUsersList {
        pub group_id: String,
    }

    pub struct GroupJoin {
        pub group_id: String,
    }

    pub struct GroupLeave {
        pub group_id: String,
    }

    pub struct GroupUserAdd {
        pub group_id: String,
        pub user_id: String,
    }

    pub struct GroupUserKick {
        pub group_id: String,
        pub user_id: String,
    }

    pub struct GroupUserPromote {
        pub group_id: String,
        pub user_id: String,
    }
}

// --------------------
// Topics (chat)
// --------------------
message! {
    pub struct TopicJoin {
        pub kind: TopicType,
        /// Other user's id for direct messages, room name, or group id.
        pub target: String,
    }

    pub struct TopicLeave {
        pub topic: TopicId,
    }

    pub struct TopicMessageSend {
        pub topic: TopicId,
        /// JSON document, opaque to the pipeline.
        pub data: String,
    }

    pub struct TopicMessagesList {
        pub topic: TopicId,
        pub cursor: String,
        pub forward: bool,
        pub limit: i64,
    }

    pub struct TopicInfo {
        pub topic: TopicId,
        pub presences: Vec<UserPresence>,
        #[serde(rename = "self")]
        pub self_presence: UserPresence,
    }

    pub struct Topics {
        pub topics: Vec<TopicInfo>,
    }

    pub struct TopicMessage {
        pub topic: TopicId,
        pub user_id: String,
        pub handle: String,
        pub message_id: String,
        /// Milliseconds since the unix epoch.
        pub created_at: i64,
        pub data: String,
    }

    pub struct TopicMessageAck {
        pub message_id: String,
        pub created_at: i64,
        pub handle: String,
    }

    pub struct TopicPresence {
        pub topic: TopicId,
        pub joins: Vec<UserPresence>,
        pub leaves: Vec<UserPresence>,
    }
}

// --------------------
// Realtime matches
// --------------------
message! {
    pub struct MatchCreate {}

    pub struct MatchJoin {
        pub match_id: String,
    }

    pub struct MatchLeave {
        pub match_id: String,
    }

    pub struct MatchDataSend {
        pub match_id: String,
        pub op_code: i64,
        pub data: String,
        /// Restrict delivery to these presences; empty means everyone else.
        pub presences: Vec<UserPresence>,
    }

    pub struct Match {
        pub match_id: String,
        pub presences: Vec<UserPresence>,
        #[serde(rename = "self")]
        pub self_presence: UserPresence,
    }

    pub struct MatchData {
        pub match_id: String,
        pub presence: UserPresence,
        pub op_code: i64,
        pub data: String,
    }

    pub struct MatchPresence {
        pub match_id: String,
        pub joins: Vec<UserPresence>,
        pub leaves: Vec<UserPresence>,
    }
}

// --------------------
// Matchmaking
// --------------------
message! {
    pub struct MatchmakeAdd {
        pub required_count: i64,
    }

    pub struct MatchmakeRemove {
        pub ticket: String,
    }

    pub struct MatchmakeTicket {
        pub ticket: String,
    }

    pub struct MatchmakeMatched {
        pub ticket: String,
        /// Match id all matched users should join.
        pub token: String,
        pub presences: Vec<UserPresence>,
        #[serde(rename = "self")]
        pub self_presence: UserPresence,
    }
}

// --------------------
// Storage
// --------------------
message! {
    pub struct StorageKey {
        pub bucket: String,
        pub collection: String,
        pub record: String,
        pub user_id: String,
    }

    pub struct StorageData {
        pub bucket: String,
        pub collection: String,
        pub record: String,
        pub value: String,
        pub version: String,
        pub permission_read: StorageReadPermission,
        pub permission_write: StorageWritePermission,
    }

    pub struct StorageFetch {
        pub keys: Vec<StorageKey>,
    }

    pub struct StorageWrite {
        pub data: Vec<StorageData>,
    }

    pub struct StorageRemove {
        pub keys: Vec<StorageKey>,
    }
}

// --------------------
// Leaderboards
// --------------------
message! {
    pub struct LeaderboardsList {
        pub limit: i64,
        pub cursor: String,
        pub filter_leaderboard_ids: Vec<String>,
    }

    pub struct LeaderboardRecordWrite {
        pub leaderboard_id: String,
        pub op: ScoreOp,
        pub value: i64,
        pub metadata: String,
        pub location: String,
        pub timezone: String,
    }

    pub struct LeaderboardRecordsFetch {
        pub leaderboard_ids: Vec<String>,
        pub limit: i64,
        pub cursor: String,
    }

    pub struct LeaderboardRecordsList {
        pub leaderboard_id: String,
        pub owner_ids: Vec<String>,
        pub limit: i64,
        pub cursor: String,
    }
}

// --------------------
// Custom remote procedures
// --------------------
message! {
    pub struct Rpc {
        pub id: String,
        pub payload: String,
    }
}
