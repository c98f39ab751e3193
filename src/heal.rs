//! Non-destructive configuration healing.
//!
//! Healing merges a default document into a user document without ever
//! overwriting something the user set. Missing keys are inserted, empty or
//! zero scalars are filled, and everything else is left exactly as found.
//! Running a heal twice produces the same document as running it once.

use crate::store::{Credentials, Options, ServerEntry, ServerMap, ServiceMap};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// A document, or fragment of one, that can be filled in from its default
/// counterpart.
pub trait Heal {
    /// Merges `default` into `self`. Returns true if anything changed.
    fn heal_from(&mut self, default: &Self) -> bool;
}

impl Heal for String {
    fn heal_from(&mut self, default: &Self) -> bool {
        if self.is_empty() && !default.is_empty() {
            *self = default.clone();
            true
        } else {
            false
        }
    }
}

impl Heal for u32 {
    fn heal_from(&mut self, default: &Self) -> bool {
        if *self == 0 && *default != 0 {
            *self = *default;
            true
        } else {
            false
        }
    }
}

impl Heal for Value {
    // Free-form JSON is entirely user-owned once it exists.
    fn heal_from(&mut self, _default: &Self) -> bool {
        false
    }
}

impl<V: Heal + Clone> Heal for BTreeMap<String, V> {
    fn heal_from(&mut self, default: &Self) -> bool {
        let mut changed = false;
        for (key, default_value) in default {
            match self.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(default_value.clone());
                    changed = true;
                }
                Entry::Occupied(mut slot) => {
                    changed |= slot.get_mut().heal_from(default_value);
                }
            }
        }
        changed
    }
}

impl Heal for Credentials {
    fn heal_from(&mut self, default: &Self) -> bool {
        let mut changed = self.password.heal_from(&default.password);
        changed |= self.db.heal_from(&default.db);
        changed
    }
}

impl Heal for ServiceMap {
    /// Categories missing from the user document are copied whole. Within a
    /// category, default entries whose id is absent are appended. Entries
    /// the user already has are not modified.
    fn heal_from(&mut self, default: &Self) -> bool {
        let mut changed = false;
        for (kind, default_entries) in &default.services {
            match self.services.entry(*kind) {
                Entry::Vacant(slot) => {
                    slot.insert(default_entries.clone());
                    changed = true;
                }
                Entry::Occupied(mut slot) => {
                    let entries = slot.get_mut();
                    for default_entry in default_entries {
                        if !entries.iter().any(|e| e.id == default_entry.id) {
                            entries.push(default_entry.clone());
                            changed = true;
                        }
                    }
                }
            }
        }
        changed
    }
}

impl Heal for Options {
    fn heal_from(&mut self, default: &Self) -> bool {
        let mut changed = self.editor.heal_from(&default.editor);
        changed |= self.theme.heal_from(&default.theme);
        changed |= self.cache.heal_from(&default.cache);
        changed |= self.services.heal_from(&default.services);
        changed
    }
}

impl Heal for ServerEntry {
    fn heal_from(&mut self, default: &Self) -> bool {
        let mut changed = self.host.heal_from(&default.host);
        changed |= self.user.heal_from(&default.user);
        changed |= self.identity_file.heal_from(&default.identity_file);
        changed
    }
}

impl Heal for ServerMap {
    fn heal_from(&mut self, default: &Self) -> bool {
        self.servers.heal_from(&default.servers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Registry, ServiceKind};

    #[test]
    fn empty_string_is_filled_and_set_string_is_kept() {
        let mut empty = String::new();
        assert!(empty.heal_from(&"vi".to_string()));
        assert_eq!(empty, "vi");

        let mut set = "emacs".to_string();
        assert!(!set.heal_from(&"vi".to_string()));
        assert_eq!(set, "emacs");
    }

    #[test]
    fn zero_is_filled_and_nonzero_is_kept() {
        let mut zero = 0u32;
        assert!(zero.heal_from(&3));
        assert_eq!(zero, 3);

        let mut set = 7u32;
        assert!(!set.heal_from(&3));
        assert_eq!(set, 7);
    }

    #[test]
    fn existing_json_values_are_never_replaced() {
        let mut user = Value::Bool(false);
        assert!(!user.heal_from(&Value::Bool(true)));
        assert_eq!(user, Value::Bool(false));
    }

    #[test]
    fn maps_gain_missing_keys_and_recurse_into_present_ones() {
        let mut defaults = BTreeMap::new();
        defaults.insert("editor".to_string(), "vi".to_string());
        defaults.insert("pager".to_string(), "less".to_string());

        let mut user = BTreeMap::new();
        user.insert("editor".to_string(), String::new());

        assert!(user.heal_from(&defaults));
        assert_eq!(user["editor"], "vi");
        assert_eq!(user["pager"], "less");
    }

    #[test]
    fn service_map_appends_missing_ids_without_touching_existing_entries() {
        let registry = Registry::builtin();
        let defaults = ServiceMap::defaults(&registry);

        let mut user = defaults.clone();
        let entries = user.services.get_mut(&ServiceKind::Cs).unwrap();
        entries.retain(|e| e.id != "svc-auth");
        entries[0].repo = "git@elsewhere:me/hub.git".to_string();

        assert!(user.heal_from(&defaults));
        let cs = &user.services[&ServiceKind::Cs];
        assert_eq!(cs.len(), 2);
        // The customized entry survives untouched, the missing one comes back.
        assert_eq!(cs[0].repo, "git@elsewhere:me/hub.git");
        assert!(cs.iter().any(|e| e.id == "svc-auth"));
    }

    #[test]
    fn service_map_restores_whole_missing_category() {
        let registry = Registry::builtin();
        let defaults = ServiceMap::defaults(&registry);

        let mut user = defaults.clone();
        user.services.remove(&ServiceKind::Os);

        assert!(user.heal_from(&defaults));
        assert!(user.services.contains_key(&ServiceKind::Os));
    }

    #[test]
    fn options_heal_is_idempotent() {
        let registry = Registry::builtin();
        let defaults = Options::defaults(&registry);

        let mut user = Options {
            editor: "hx".to_string(),
            ..Options::default()
        };
        assert!(user.heal_from(&defaults));
        assert_eq!(user.editor, "hx");
        assert_eq!(user.theme, "dark");

        let after_first = user.clone();
        assert!(!user.heal_from(&defaults));
        assert_eq!(user, after_first);
    }

    #[test]
    fn per_service_settings_gain_missing_subkeys_only() {
        let registry = Registry::builtin();
        let defaults = Options::defaults(&registry);

        let mut user = defaults.clone();
        let hub = user.services.get_mut("svc-hub").unwrap();
        hub.insert("autostart".to_string(), Value::Bool(false));
        hub.remove("branch");

        assert!(user.heal_from(&defaults));
        let hub = &user.services["svc-hub"];
        assert_eq!(hub["autostart"], Value::Bool(false));
        assert_eq!(hub["branch"], Value::String("main".to_string()));
    }

    #[test]
    fn server_map_copies_missing_servers_and_fills_empty_fields() {
        let defaults = ServerMap::defaults();

        let mut user = ServerMap::default();
        user.servers.insert(
            "git".to_string(),
            ServerEntry {
                host: "github.com".to_string(),
                user: String::new(),
                identity_file: String::new(),
            },
        );

        assert!(user.heal_from(&defaults));
        assert!(user.servers.contains_key("local"));
        let git = &user.servers["git"];
        assert_eq!(git.host, "github.com");
        assert_eq!(git.user, "git");
    }
}
