//! The relational store's own user privilege bitmask, distinct from the
//! bancho-wire `BanchoPrivileges` the client is shown (§4.7, §9). The
//! exact bit layout is this server's own and is never placed on the wire;
//! what matters is the semantics the login pipeline checks against it.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Privileges: i64 {
        /// Not banned. Cleared privileges (`0`) means banned outright.
        const PUBLIC = 1 << 0;
        /// A normal, non-restricted account.
        const NORMAL = 1 << 1;
        const DONOR = 1 << 2;
        const BAT = 1 << 3;
        const MODERATOR = 1 << 4;
        const ADMIN = 1 << 5;
        const COMMUNITY_MANAGER = 1 << 6;
        const TOURNAMENT_STAFF = 1 << 7;
        const BOT = 1 << 8;
        /// Account has not completed hardware verification yet.
        const PENDING_VERIFICATION = 1 << 9;
    }
}

impl Privileges {
    /// `priv & 3 > 0` in the upstream login handler: either public or
    /// normal bits set means "not banned".
    pub fn is_banned(self) -> bool {
        !self.intersects(Privileges::PUBLIC | Privileges::NORMAL)
            && !self.contains(Privileges::PENDING_VERIFICATION)
    }

    /// Hidden from `main`/presence broadcasts and limited to an
    /// allow-listed packet set (§4.8, Glossary "Restricted").
    pub fn is_restricted(self) -> bool {
        self.contains(Privileges::NORMAL) && !self.contains(Privileges::PUBLIC)
    }

    pub fn is_admin(self) -> bool {
        self.intersects(Privileges::ADMIN | Privileges::MODERATOR | Privileges::COMMUNITY_MANAGER)
    }
}

/// The bancho-wire privilege bit an `#admin`-gated channel checks against
/// (§4.4 channel minimum privilege, `channels.rs`).
pub const ADMIN_PRIVILEGE_BIT: i32 = Privileges::ADMIN.bits() as i32;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_privileges_is_banned() {
        assert!(Privileges::empty().is_banned());
    }

    #[test]
    fn public_and_normal_is_not_banned_or_restricted() {
        let p = Privileges::PUBLIC | Privileges::NORMAL;
        assert!(!p.is_banned());
        assert!(!p.is_restricted());
    }

    #[test]
    fn normal_without_public_is_restricted() {
        let p = Privileges::NORMAL;
        assert!(!p.is_banned());
        assert!(p.is_restricted());
    }
}
