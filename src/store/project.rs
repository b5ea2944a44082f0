use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// A named workspace selecting a subset of catalog servers.
///
/// `server_ids` keeps insertion order and never holds the same id twice.
/// `secrets` maps vault keys (by name, not id) to project-scoped overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub server_ids: Vec<String>,
    pub color: String,
    pub last_used: DateTime<Utc>,
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
}

impl Project {
    pub fn is_installed(&self, server_id: &str) -> bool {
        self.server_ids.iter().any(|id| id == server_id)
    }

    /// Removes `server_id` if present, otherwise appends it. Returns whether
    /// the id is installed afterwards.
    pub fn toggle(&mut self, server_id: &str) -> bool {
        if self.is_installed(server_id) {
            self.server_ids.retain(|id| id != server_id);
            false
        } else {
            self.server_ids.push(server_id.to_string());
            true
        }
    }

    /// Appends `server_id` unless already present.
    pub fn install(&mut self, server_id: &str) -> bool {
        if self.is_installed(server_id) {
            return false;
        }
        self.server_ids.push(server_id.to_string());
        true
    }
}

/// `prefix-` followed by nine base36 characters.
pub fn short_id<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let suffix: String = (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", prefix, suffix)
}

/// Draws ids until one is not `taken`.
pub fn unique_id<R, F>(prefix: &str, rng: &mut R, taken: F) -> String
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    loop {
        let id = short_id(prefix, rng);
        if !taken(&id) {
            return id;
        }
    }
}

/// `#rrggbb` with a uniformly drawn 24-bit colour.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..=0xff_ffffu32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn empty() -> Project {
        Project {
            id: "proj-x".to_string(),
            name: "X".to_string(),
            description: String::new(),
            server_ids: Vec::new(),
            color: "#000000".to_string(),
            last_used: Utc::now(),
            secrets: BTreeMap::new(),
        }
    }

    #[test]
    fn toggle_preserves_order_of_remaining_ids() {
        let mut project = empty();
        project.server_ids = vec!["a".into(), "b".into(), "c".into()];
        assert!(!project.toggle("b"));
        assert_eq!(project.server_ids, vec!["a", "c"]);
        assert!(project.toggle("b"));
        assert_eq!(project.server_ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn install_is_idempotent() {
        let mut project = empty();
        assert!(project.install("a"));
        assert!(!project.install("a"));
        assert_eq!(project.server_ids, vec!["a"]);
    }

    #[test]
    fn ids_have_prefix_and_base36_suffix() {
        let mut rng = StdRng::seed_from_u64(5);
        let id = short_id("proj", &mut rng);
        let suffix = id.strip_prefix("proj-").unwrap();
        assert_eq!(suffix.len(), ID_LEN);
        assert!(suffix.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn unique_id_skips_taken_ids() {
        let mut replay = StdRng::seed_from_u64(9);
        let first = short_id("sec", &mut replay);
        let mut rng = StdRng::seed_from_u64(9);
        let id = unique_id("sec", &mut rng, |candidate| candidate == first);
        assert_ne!(id, first);
    }

    #[test]
    fn colors_are_always_six_hex_digits() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let color = random_color(&mut rng);
            assert_eq!(color.len(), 7);
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
