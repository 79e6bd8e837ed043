//! A session's currently-broadcast activity (§3, Glossary "Action"):
//! action kind, free-text, beatmap md5, beatmap id, mods, game mode.

#[derive(Debug, Clone)]
pub struct ActionState {
    pub action_id: u8,
    pub action_text: String,
    pub beatmap_md5: String,
    pub beatmap_id: i32,
    pub mods: i32,
    pub game_mode: u8,
}

impl Default for ActionState {
    fn default() -> Self {
        Self {
            action_id: 0,
            action_text: String::new(),
            beatmap_md5: String::new(),
            beatmap_id: -1,
            mods: 0,
            game_mode: 0,
        }
    }
}
