//! Player profile links.

use matchlog_types::SteamId;

const STEAM_ID64_PREFIX: &str = "7656119";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLinks {
    pub dotabuff: String,
    pub opendota: String,
}

/// Profile URLs for a SteamID64, or `None` if the id is not in wide form.
pub fn profile_links(steam_id: &str) -> Option<ProfileLinks> {
    let id = steam_id.trim();
    if id.len() != 17 || !id.bytes().all(|b| b.is_ascii_digit()) || !id.starts_with(STEAM_ID64_PREFIX) {
        return None;
    }
    Some(ProfileLinks {
        dotabuff: format!("https://www.dotabuff.com/players/{}", id),
        opendota: format!("https://www.opendota.com/players/{}", id),
    })
}

pub fn profile_links_for(steam_id: SteamId) -> Option<ProfileLinks> {
    profile_links(&steam_id.to_string())
}
