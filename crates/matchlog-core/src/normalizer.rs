//! Raw GSI document → [`Snapshot`].
//!
//! Normalization is total: a field that is missing or has an unexpected type
//! becomes `None`, and a malformed subtree only affects itself.

use matchlog_types::{
    Ability, Actor, BuildingHealth, EventBundle, GameState, Hero, Inventory, Item, MatchSession,
    Metadata, SessionId, Side, Snapshot, SteamId, Structures,
};
use serde_json::{Map, Value};

/// Inventory slots the client reports.
pub const INVENTORY_SLOTS: [&str; 14] = [
    "slot0", "slot1", "slot2", "slot3", "slot4", "slot5", "stash0", "stash1", "stash2", "stash3",
    "stash4", "stash5", "teleport", "neutral0",
];

pub const RADIANT_BUILDINGS: [&str; 12] = [
    "dota_goodguys_tower1_top",
    "dota_goodguys_tower2_top",
    "dota_goodguys_tower3_top",
    "dota_goodguys_tower1_mid",
    "dota_goodguys_tower2_mid",
    "dota_goodguys_tower3_mid",
    "dota_goodguys_tower1_bot",
    "dota_goodguys_tower2_bot",
    "dota_goodguys_tower3_bot",
    "dota_goodguys_tower4_top",
    "dota_goodguys_tower4_bot",
    "goodguys_fort",
];

pub const DIRE_BUILDINGS: [&str; 12] = [
    "dota_badguys_tower1_top",
    "dota_badguys_tower2_top",
    "dota_badguys_tower3_top",
    "dota_badguys_tower1_mid",
    "dota_badguys_tower2_mid",
    "dota_badguys_tower3_mid",
    "dota_badguys_tower1_bot",
    "dota_badguys_tower2_bot",
    "dota_badguys_tower3_bot",
    "dota_badguys_tower4_top",
    "dota_badguys_tower4_bot",
    "badguys_fort",
];

/// Normalize one raw snapshot.
pub fn normalize(raw: &Value) -> Snapshot {
    Snapshot {
        metadata: section(raw, "provider").map(extract_metadata),
        session: section(raw, "map").map(extract_session),
        actor: section(raw, "player").map(extract_actor),
        hero: section(raw, "hero").map(extract_hero),
        abilities: section(raw, "abilities").map(extract_abilities),
        inventory: raw.get("items").map(extract_inventory),
        structures: raw.get("buildings").map(extract_structures),
        events: raw.get("events").map(extract_events),
        raw: raw.clone(),
    }
}

/// The match is running or about to start.
pub fn is_started(snapshot: &Snapshot) -> bool {
    matches!(
        snapshot.game_state(),
        Some(GameState::GameInProgress | GameState::PreGame)
    )
}

/// The match is over: post-game state, or a winner has been declared.
pub fn is_ended(snapshot: &Snapshot) -> bool {
    matches!(snapshot.game_state(), Some(GameState::PostGame)) || snapshot.winning_side().is_some()
}

fn section<'a>(raw: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    raw.get(key).and_then(Value::as_object)
}

pub(crate) fn string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn int(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = obj.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

pub(crate) fn boolean(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

/// Numeric identifiers arrive either as JSON numbers or digit strings.
pub(crate) fn steam_id(value: &Value) -> Option<SteamId> {
    match value {
        Value::Number(n) => n.as_u64().map(SteamId),
        Value::String(s) => SteamId::parse(s),
        _ => None,
    }
}

fn session_id(value: &Value) -> Option<SessionId> {
    match value {
        Value::Number(n) => SessionId::new(n.to_string()),
        Value::String(s) => SessionId::new(s.as_str()),
        _ => None,
    }
}

pub(crate) fn side(obj: &Map<String, Value>, key: &str) -> Option<Side> {
    obj.get(key).and_then(Value::as_str).and_then(Side::parse)
}

fn extract_metadata(provider: &Map<String, Value>) -> Metadata {
    Metadata {
        name: string(provider, "name"),
        app_id: int(provider, "appid"),
        version: int(provider, "version"),
        timestamp: int(provider, "timestamp"),
    }
}

fn extract_session(map: &Map<String, Value>) -> MatchSession {
    MatchSession {
        name: string(map, "name"),
        id: map.get("matchid").and_then(session_id),
        game_clock: int(map, "game_time"),
        wall_clock: int(map, "clock_time"),
        daytime: boolean(map, "daytime"),
        nightstalker_night: boolean(map, "nightstalker_night"),
        state: string(map, "game_state").map(GameState::from),
        paused: boolean(map, "paused"),
        winning_side: side(map, "win_team"),
        custom_game_name: string(map, "customgamename").filter(|s| !s.is_empty()),
        ward_purchase_cooldown: int(map, "ward_purchase_cooldown"),
    }
}

fn extract_actor(player: &Map<String, Value>) -> Actor {
    Actor {
        steam_id: player.get("steamid").and_then(steam_id),
        name: string(player, "name"),
        activity: string(player, "activity"),
        kills: int(player, "kills"),
        deaths: int(player, "deaths"),
        assists: int(player, "assists"),
        last_hits: int(player, "last_hits"),
        denies: int(player, "denies"),
        kill_streak: int(player, "kill_streak"),
        side: side(player, "team_name").or_else(|| side(player, "team")),
        gold: int(player, "gold"),
        gold_reliable: int(player, "gold_reliable"),
        gold_unreliable: int(player, "gold_unreliable"),
        gold_from_hero_kills: int(player, "gold_from_hero_kills"),
        gold_from_creep_kills: int(player, "gold_from_creep_kills"),
        gold_from_income: int(player, "gold_from_income"),
        gold_from_shared: int(player, "gold_from_shared"),
        gpm: int(player, "gpm"),
        xpm: int(player, "xpm"),
    }
}

fn extract_hero(hero: &Map<String, Value>) -> Hero {
    Hero {
        id: int(hero, "id"),
        name: string(hero, "name"),
        level: int(hero, "level"),
        alive: boolean(hero, "alive"),
        respawn_seconds: int(hero, "respawn_seconds"),
        buyback_cost: int(hero, "buyback_cost"),
        buyback_cooldown: int(hero, "buyback_cooldown"),
        health: int(hero, "health"),
        max_health: int(hero, "max_health"),
        health_percent: int(hero, "health_percent"),
        mana: int(hero, "mana"),
        max_mana: int(hero, "max_mana"),
        mana_percent: int(hero, "mana_percent"),
        silenced: boolean(hero, "silenced"),
        stunned: boolean(hero, "stunned"),
        disarmed: boolean(hero, "disarmed"),
        magic_immune: boolean(hero, "magicimmune"),
        hexed: boolean(hero, "hexed"),
        muted: boolean(hero, "muted"),
        broken: boolean(hero, "break"),
        has_debuff: boolean(hero, "has_debuff"),
        selected_units: hero
            .get("selected_units")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn extract_abilities(abilities: &Map<String, Value>) -> Vec<Ability> {
    abilities
        .iter()
        .filter_map(|(key, value)| {
            let ability = value.as_object()?;
            Some(Ability {
                name: string(ability, "name").unwrap_or_else(|| key.clone()),
                level: int(ability, "level"),
                can_cast: boolean(ability, "can_cast"),
                passive: boolean(ability, "passive"),
                ability_active: boolean(ability, "ability_active"),
                cooldown: int(ability, "cooldown"),
                ultimate: boolean(ability, "ultimate"),
            })
        })
        .collect()
}

fn extract_inventory(items: &Value) -> Inventory {
    let items = items.as_object();
    INVENTORY_SLOTS
        .iter()
        .map(|slot| {
            let item = items
                .and_then(|items| items.get(*slot))
                .and_then(Value::as_object)
                .map(extract_item);
            (slot.to_string(), item)
        })
        .collect()
}

fn extract_item(item: &Map<String, Value>) -> Item {
    Item {
        name: string(item, "name"),
        purchaser: int(item, "purchaser"),
        can_cast: boolean(item, "can_cast"),
        cooldown: int(item, "cooldown"),
        passive: boolean(item, "passive"),
        charges: int(item, "charges"),
    }
}

fn extract_structures(buildings: &Value) -> Structures {
    let buildings = buildings.as_object();
    Structures {
        radiant: building_health(buildings, "radiant", &RADIANT_BUILDINGS),
        dire: building_health(buildings, "dire", &DIRE_BUILDINGS),
    }
}

fn building_health(
    buildings: Option<&Map<String, Value>>,
    team: &str,
    catalog: &[&str],
) -> BuildingHealth {
    let team = buildings
        .and_then(|b| b.get(team))
        .and_then(Value::as_object);
    catalog
        .iter()
        .map(|name| {
            let health = team
                .and_then(|t| t.get(*name))
                .and_then(Value::as_object)
                .and_then(|building| int(building, "health"));
            (name.to_string(), health)
        })
        .collect()
}

fn extract_events(events: &Value) -> EventBundle {
    match events {
        Value::Array(list) => EventBundle::List {
            events: list.clone(),
        },
        Value::Object(streams) => EventBundle::Streams {
            roshan: streams
                .get("roshan")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            courier_kills: stream(streams, "courier_kills"),
            tower_kills: stream(streams, "tower_kills"),
            chat: stream(streams, "chat"),
        },
        _ => EventBundle::Empty,
    }
}

fn stream(streams: &Map<String, Value>, key: &str) -> Vec<Value> {
    streams
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
