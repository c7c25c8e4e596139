//! Normalized game-state snapshot.
//!
//! A [`Snapshot`] is built once from a raw GSI document and never mutated.
//! Every field the client may omit is an `Option`; `None` always means the
//! upstream value was missing or had an unexpected shape, never a guess.

use crate::{SessionId, Side, SteamId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Game rules state reported in `map.game_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameState {
    Init,
    WaitForPlayersToLoad,
    HeroSelection,
    StrategyTime,
    TeamShowcase,
    WaitForMapToLoad,
    PreGame,
    GameInProgress,
    PostGame,
    Disconnect,
    /// A state this build does not know about, kept verbatim.
    Other(String),
}

impl GameState {
    pub fn as_str(&self) -> &str {
        match self {
            GameState::Init => "DOTA_GAMERULES_STATE_INIT",
            GameState::WaitForPlayersToLoad => "DOTA_GAMERULES_STATE_WAIT_FOR_PLAYERS_TO_LOAD",
            GameState::HeroSelection => "DOTA_GAMERULES_STATE_HERO_SELECTION",
            GameState::StrategyTime => "DOTA_GAMERULES_STATE_STRATEGY_TIME",
            GameState::TeamShowcase => "DOTA_GAMERULES_STATE_TEAM_SHOWCASE",
            GameState::WaitForMapToLoad => "DOTA_GAMERULES_STATE_WAIT_FOR_MAP_TO_LOAD",
            GameState::PreGame => "DOTA_GAMERULES_STATE_PRE_GAME",
            GameState::GameInProgress => "DOTA_GAMERULES_STATE_GAME_IN_PROGRESS",
            GameState::PostGame => "DOTA_GAMERULES_STATE_POST_GAME",
            GameState::Disconnect => "DOTA_GAMERULES_STATE_DISCONNECT",
            GameState::Other(s) => s,
        }
    }
}

impl From<String> for GameState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "DOTA_GAMERULES_STATE_INIT" => GameState::Init,
            "DOTA_GAMERULES_STATE_WAIT_FOR_PLAYERS_TO_LOAD" => GameState::WaitForPlayersToLoad,
            "DOTA_GAMERULES_STATE_HERO_SELECTION" => GameState::HeroSelection,
            "DOTA_GAMERULES_STATE_STRATEGY_TIME" => GameState::StrategyTime,
            "DOTA_GAMERULES_STATE_TEAM_SHOWCASE" => GameState::TeamShowcase,
            "DOTA_GAMERULES_STATE_WAIT_FOR_MAP_TO_LOAD" => GameState::WaitForMapToLoad,
            "DOTA_GAMERULES_STATE_PRE_GAME" => GameState::PreGame,
            "DOTA_GAMERULES_STATE_GAME_IN_PROGRESS" => GameState::GameInProgress,
            "DOTA_GAMERULES_STATE_POST_GAME" => GameState::PostGame,
            "DOTA_GAMERULES_STATE_DISCONNECT" => GameState::Disconnect,
            _ => GameState::Other(s),
        }
    }
}

impl From<GameState> for String {
    fn from(state: GameState) -> Self {
        match state {
            GameState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider block: who sent the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
    pub app_id: Option<i64>,
    pub version: Option<i64>,
    pub timestamp: Option<i64>,
}

/// Map block: the match as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSession {
    pub name: Option<String>,
    pub id: Option<SessionId>,
    /// Seconds since the map loaded (`game_time`).
    pub game_clock: Option<i64>,
    /// In-game clock shown to players (`clock_time`), negative before the horn.
    pub wall_clock: Option<i64>,
    pub daytime: Option<bool>,
    pub nightstalker_night: Option<bool>,
    pub state: Option<GameState>,
    pub paused: Option<bool>,
    pub winning_side: Option<Side>,
    pub custom_game_name: Option<String>,
    pub ward_purchase_cooldown: Option<i64>,
}

/// Player block for the local client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub steam_id: Option<SteamId>,
    pub name: Option<String>,
    pub activity: Option<String>,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub last_hits: Option<i64>,
    pub denies: Option<i64>,
    pub kill_streak: Option<i64>,
    pub side: Option<Side>,
    pub gold: Option<i64>,
    pub gold_reliable: Option<i64>,
    pub gold_unreliable: Option<i64>,
    pub gold_from_hero_kills: Option<i64>,
    pub gold_from_creep_kills: Option<i64>,
    pub gold_from_income: Option<i64>,
    pub gold_from_shared: Option<i64>,
    pub gpm: Option<i64>,
    pub xpm: Option<i64>,
}

/// Hero block for the local client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub level: Option<i64>,
    pub alive: Option<bool>,
    pub respawn_seconds: Option<i64>,
    pub buyback_cost: Option<i64>,
    pub buyback_cooldown: Option<i64>,
    pub health: Option<i64>,
    pub max_health: Option<i64>,
    pub health_percent: Option<i64>,
    pub mana: Option<i64>,
    pub max_mana: Option<i64>,
    pub mana_percent: Option<i64>,
    pub silenced: Option<bool>,
    pub stunned: Option<bool>,
    pub disarmed: Option<bool>,
    pub magic_immune: Option<bool>,
    pub hexed: Option<bool>,
    pub muted: Option<bool>,
    pub broken: Option<bool>,
    pub has_debuff: Option<bool>,
    #[serde(default)]
    pub selected_units: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub level: Option<i64>,
    pub can_cast: Option<bool>,
    pub passive: Option<bool>,
    pub ability_active: Option<bool>,
    pub cooldown: Option<i64>,
    pub ultimate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: Option<String>,
    pub purchaser: Option<i64>,
    pub can_cast: Option<bool>,
    pub cooldown: Option<i64>,
    pub passive: Option<bool>,
    pub charges: Option<i64>,
}

/// Slot name to item; every known slot is present as a key.
pub type Inventory = BTreeMap<String, Option<Item>>;

/// Building name to current health; every catalogued building is a key.
pub type BuildingHealth = BTreeMap<String, Option<i64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structures {
    pub radiant: BuildingHealth,
    pub dire: BuildingHealth,
}

/// Event section, resolved once from whichever shape the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum EventBundle {
    /// The client sent a plain list; kept as an opaque ordered sequence.
    List { events: Vec<Value> },
    /// The client sent an object with named streams.
    Streams {
        roshan: Value,
        courier_kills: Vec<Value>,
        tower_kills: Vec<Value>,
        chat: Vec<Value>,
    },
    /// The section had some other shape.
    Empty,
}

/// One normalized GSI sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: Option<Metadata>,
    pub session: Option<MatchSession>,
    pub actor: Option<Actor>,
    pub hero: Option<Hero>,
    pub abilities: Option<Vec<Ability>>,
    pub inventory: Option<Inventory>,
    pub structures: Option<Structures>,
    pub events: Option<EventBundle>,
    /// The document as received.
    #[serde(default)]
    pub raw: Value,
}

impl Snapshot {
    /// Match id carried by this snapshot, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().and_then(|s| s.id.as_ref())
    }

    pub fn game_state(&self) -> Option<&GameState> {
        self.session.as_ref().and_then(|s| s.state.as_ref())
    }

    pub fn winning_side(&self) -> Option<Side> {
        self.session.as_ref().and_then(|s| s.winning_side)
    }
}
