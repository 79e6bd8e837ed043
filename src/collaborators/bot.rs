//! Bot collaborator (§6.4): a narrow, explicitly-scoped command catalog
//! (`!help`, `!roll`) — anything wider (a trivia engine, a moderation
//! console) is out of scope, this core only knows how to hand a message
//! to whatever implements `respond` and relay the reply, if any. The
//! `!mp` family lives outside this trait entirely (`router::handle_mp_command`)
//! since it needs match context this interface deliberately doesn't carry.

use axum::async_trait;
use rand::Rng;

pub struct BotReply(pub String);

#[async_trait]
pub trait Bot: Send + Sync {
    /// `channel_or_user` is a channel name (`#osu`) or a username for a DM.
    async fn respond(
        &self,
        from_username: &str,
        channel_or_user: &str,
        message: &str,
    ) -> Option<BotReply>;
}

/// A bot with no command catalog wired up: every message is acknowledged
/// as received but produces no reply. Useful as a test double or for an
/// install that wants the chat path without any bot commands at all.
pub struct SilentBot;

#[async_trait]
impl Bot for SilentBot {
    async fn respond(&self, _from_username: &str, _channel_or_user: &str, _message: &str) -> Option<BotReply> {
        None
    }
}

/// `!help` and `!roll [max]`; `!py ...` answers with a fixed "disabled"
/// reply regardless of `PS_ENABLE_PY_COMMAND` — operators migrating an
/// existing deployment keep the command name, but no code ever
/// evaluates the argument (§9 Non-goals: no in-process code execution).
pub struct ScriptedBot;

const DEFAULT_ROLL_MAX: u32 = 100;

#[async_trait]
impl Bot for ScriptedBot {
    async fn respond(&self, from_username: &str, _channel_or_user: &str, message: &str) -> Option<BotReply> {
        let mut words = message.split_whitespace();
        let command = words.next()?.trim_start_matches('!').to_lowercase();

        let reply = match command.as_str() {
            "help" => "Available commands: !help, !roll [max], !mp <start|abort|lock|unlock|invite|password|host|scorev1|scorev2>.".to_owned(),
            "roll" => {
                let max = words.next().and_then(|s| s.parse::<u32>().ok()).filter(|&n| n > 0).unwrap_or(DEFAULT_ROLL_MAX);
                let value = rand::thread_rng().gen_range(0..=max);
                format!("{from_username} rolls {value} point(s)")
            }
            "py" => "The !py command is disabled on this server.".to_owned(),
            _ => return None,
        };

        Some(BotReply(reply))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn help_lists_known_commands() {
        let reply = ScriptedBot.respond("alice", "#osu", "!help").await.unwrap();
        assert!(reply.0.contains("!roll"));
    }

    #[tokio::test]
    async fn roll_stays_within_the_requested_bound() {
        let reply = ScriptedBot.respond("alice", "#osu", "!roll 5").await.unwrap();
        let rolled: u32 = reply.0.split_whitespace().nth(2).unwrap().parse().unwrap();
        assert!(rolled <= 5);
    }

    #[tokio::test]
    async fn unrecognized_command_is_ignored() {
        assert!(ScriptedBot.respond("alice", "#osu", "!nonsense").await.is_none());
    }
}
