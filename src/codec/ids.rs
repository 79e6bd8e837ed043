//! The closed packet id catalog.
//!
//! Packet ids are a flat `u16` space split by direction: ids the client
//! sends are dispatched on by the router (§4.8); ids the server sends are
//! only ever produced by the builder. The numeric values pinned in the
//! external wire-format table are reproduced exactly; the remainder are
//! assigned a fixed, internally consistent value and never recomputed at
//! runtime, matching the "static handler table" design note.

/// Ids a connected client sends to the server.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ClientPacketId {
    ChangeAction = 0,
    SendPublicMessage = 1,
    Logout = 2,
    RequestStatusUpdate = 3,
    Ping = 4,
    StartSpectating = 16,
    StopSpectating = 17,
    SpectateFrames = 18,
    ErrorReport = 20,
    CantSpectate = 22,
    SendPrivateMessage = 25,
    PartLobby = 29,
    JoinLobby = 30,
    CreateMatch = 31,
    JoinMatch = 32,
    PartMatch = 33,
    MatchChangeSlot = 38,
    MatchReady = 39,
    MatchLock = 40,
    MatchChangeSettings = 41,
    MatchStart = 44,
    MatchScoreUpdate = 47,
    MatchComplete = 49,
    MatchChangeMods = 51,
    MatchLoadComplete = 52,
    MatchNoBeatmap = 54,
    MatchNotReady = 55,
    MatchFailed = 56,
    MatchHasBeatmap = 59,
    MatchSkipRequest = 60,
    ChannelJoin = 63,
    BeatmapInfoRequest = 68,
    MatchTransferHost = 70,
    FriendAdd = 73,
    FriendRemove = 74,
    MatchChangeTeam = 77,
    ChannelPart = 78,
    ReceiveUpdates = 79,
    SetAwayMessage = 82,
    UserStatsRequest = 85,
    MatchInvite = 87,
    MatchChangePassword = 90,
    TournamentMatchInfoRequest = 93,
    UserPresenceRequest = 97,
    UserPresenceRequestAll = 98,
    ToggleBlockNonFriendDms = 99,
    TournamentJoinMatchChannel = 108,
    TournamentLeaveMatchChannel = 109,
}

impl ClientPacketId {
    /// Maps a raw wire id to a known client packet, or `None` for an
    /// id the router has never heard of (logged and skipped, not fatal).
    pub fn from_u16(id: u16) -> Option<Self> {
        use ClientPacketId::*;
        Some(match id {
            0 => ChangeAction,
            1 => SendPublicMessage,
            2 => Logout,
            3 => RequestStatusUpdate,
            4 => Ping,
            16 => StartSpectating,
            17 => StopSpectating,
            18 => SpectateFrames,
            20 => ErrorReport,
            22 => CantSpectate,
            25 => SendPrivateMessage,
            29 => PartLobby,
            30 => JoinLobby,
            31 => CreateMatch,
            32 => JoinMatch,
            33 => PartMatch,
            38 => MatchChangeSlot,
            39 => MatchReady,
            40 => MatchLock,
            41 => MatchChangeSettings,
            44 => MatchStart,
            47 => MatchScoreUpdate,
            49 => MatchComplete,
            51 => MatchChangeMods,
            52 => MatchLoadComplete,
            54 => MatchNoBeatmap,
            55 => MatchNotReady,
            56 => MatchFailed,
            59 => MatchHasBeatmap,
            60 => MatchSkipRequest,
            63 => ChannelJoin,
            68 => BeatmapInfoRequest,
            70 => MatchTransferHost,
            73 => FriendAdd,
            74 => FriendRemove,
            77 => MatchChangeTeam,
            78 => ChannelPart,
            79 => ReceiveUpdates,
            82 => SetAwayMessage,
            85 => UserStatsRequest,
            87 => MatchInvite,
            90 => MatchChangePassword,
            93 => TournamentMatchInfoRequest,
            97 => UserPresenceRequest,
            98 => UserPresenceRequestAll,
            99 => ToggleBlockNonFriendDms,
            108 => TournamentJoinMatchChannel,
            109 => TournamentLeaveMatchChannel,
            _ => return None,
        })
    }

    /// Ids the router still dispatches for a `restricted` session (§4.8).
    pub fn allowed_while_restricted(self) -> bool {
        matches!(
            self,
            Self::Logout
                | Self::RequestStatusUpdate
                | Self::Ping
                | Self::ChangeAction
                | Self::ChannelJoin
                | Self::ChannelPart
                | Self::UserStatsRequest
        )
    }
}

/// Ids the server sends to a client. Values match the pinned entries in the
/// external wire-format table (§6.1); the rest are assigned consistently.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerPacketId {
    UserId = 5,
    SendMessage = 7,
    Pong = 8,
    UserStats = 11,
    UserLogout = 12,
    SpectatorJoined = 13,
    SpectatorLeft = 14,
    SpectateFrames = 15,
    UserPresence = 19,
    SpectatorCantSpectate = 21,
    Notification = 24,
    NewMatch = 26,
    UpdateMatch = 27,
    DisposeMatch = 28,
    FellowSpectatorJoined = 34,
    FellowSpectatorLeft = 35,
    MatchStart = 36,
    MatchJoinSuccess = 37,
    MatchJoinFail = 38,
    MatchChangePassword = 39,
    MatchAllPlayersLoaded = 40,
    MatchPlayerSkipped = 41,
    MatchAllSkipped = 42,
    MatchScoreUpdate = 43,
    MatchComplete = 45,
    MatchPlayerFailed = 46,
    MatchNewHost = 50,
    MatchAbort = 52,
    SwitchServer = 60,
    Restart = 61,
    Rtx = 62,
    CrashReportRequest = 64,
    MainMenuIcon = 65,
    ChannelJoinSuccess = 71,
    ChannelInfo = 72,
    ChannelKicked = 73,
    UserSilenced = 74,
    ProtocolVersion = 75,
    Privileges = 76,
    SilenceEnd = 92,
    ChannelInfoEnd = 83,
    FriendsList = 86,
}
