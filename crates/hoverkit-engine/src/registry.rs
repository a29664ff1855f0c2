//! Package → handler factory registry.

use std::{collections::BTreeMap, fmt};

use config::AppProfile;
use hoverkit_overlay::OverlayOptions;
use tracing::{debug, info};

use crate::handler::{HandlerFactory, ProfileHandler};

/// One registered package.
#[derive(Clone)]
struct Entry {
    /// Profile the factory was built from, if any.
    profile: Option<AppProfile>,
    /// Produces handler instances.
    factory: HandlerFactory,
}

/// Maps package identifiers to handler factories.
///
/// Built-in entries are fixed at construction. Custom entries come from the
/// `custom_apps` setting, share the same key space, and shadow a built-in
/// entry with the same package.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    /// Entries registered at startup.
    builtin: BTreeMap<String, Entry>,
    /// Entries from user configuration; replaced wholesale on every merge.
    custom: BTreeMap<String, Entry>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("builtin", &self.builtin.keys().collect::<Vec<_>>())
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a [`ProfileHandler`] for each profile.
    pub fn from_profiles(profiles: &[AppProfile], overlay: &OverlayOptions) -> Self {
        let mut reg = Self::new();
        for profile in profiles {
            reg.register_profile(profile.clone(), overlay);
        }
        reg
    }

    /// Register a built-in handler factory for `package`.
    pub fn register(&mut self, package: impl Into<String>, factory: HandlerFactory) {
        self.builtin.insert(
            package.into(),
            Entry {
                profile: None,
                factory,
            },
        );
    }

    /// Register a built-in profile-driven handler.
    pub fn register_profile(&mut self, profile: AppProfile, overlay: &OverlayOptions) {
        let factory = ProfileHandler::factory(profile.clone(), overlay.clone());
        self.builtin.insert(
            profile.package_name.clone(),
            Entry {
                profile: Some(profile),
                factory,
            },
        );
    }

    /// Replace all custom entries with `profiles`.
    ///
    /// Returns the packages that were not registered before the merge.
    pub fn merge_custom(
        &mut self,
        profiles: Vec<AppProfile>,
        overlay: &OverlayOptions,
    ) -> Vec<String> {
        let before: Vec<String> = self.packages().map(str::to_string).collect();
        self.custom.clear();
        for profile in profiles {
            let factory = ProfileHandler::factory(profile.clone(), overlay.clone());
            if self.builtin.contains_key(&profile.package_name) {
                debug!(package = %profile.package_name, "custom_app_shadows_builtin");
            }
            self.custom.insert(
                profile.package_name.clone(),
                Entry {
                    profile: Some(profile),
                    factory,
                },
            );
        }
        let added: Vec<String> = self
            .packages()
            .filter(|p| !before.iter().any(|b| b == p))
            .map(str::to_string)
            .collect();
        info!(custom = self.custom.len(), added = added.len(), "custom_apps_merged");
        added
    }

    /// Look up an entry, custom first.
    fn entry(&self, package: &str) -> Option<&Entry> {
        self.custom.get(package).or_else(|| self.builtin.get(package))
    }

    /// Whether `package` has a handler.
    pub fn contains(&self, package: &str) -> bool {
        self.entry(package).is_some()
    }

    /// Factory for `package`.
    pub fn factory(&self, package: &str) -> Option<HandlerFactory> {
        self.entry(package).map(|e| e.factory.clone())
    }

    /// Profile for `package`, if it was registered from one.
    pub fn profile(&self, package: &str) -> Option<&AppProfile> {
        self.entry(package).and_then(|e| e.profile.as_ref())
    }

    /// Whether the effective entry for `package` is user defined.
    pub fn is_custom(&self, package: &str) -> bool {
        self.custom.contains_key(package)
    }

    /// Every registered package, sorted and deduplicated.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        let mut all: Vec<&str> = self
            .builtin
            .keys()
            .chain(self.custom.keys().filter(|k| !self.builtin.contains_key(*k)))
            .map(String::as_str)
            .collect();
        all.sort_unstable();
        all.into_iter()
    }

    /// Profiles of every effective entry.
    pub fn profiles(&self) -> impl Iterator<Item = &AppProfile> {
        self.packages().filter_map(move |p| self.profile(p))
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.packages().count()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.builtin.is_empty() && self.custom.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(pkg: &str, custom: Option<&str>) -> AppProfile {
        AppProfile {
            name: "App".into(),
            package_name: pkg.into(),
            input_id: "input".into(),
            send_btn_id: "send".into(),
            message_text_id: "msg".into(),
            message_list_class_name: "RecyclerView".into(),
            custom_name: custom.map(Into::into),
        }
    }

    #[test]
    fn builtin_lookup_and_fresh_instances() {
        let reg = HandlerRegistry::from_profiles(
            &[profile("com.b", None), profile("com.a", None)],
            &OverlayOptions::default(),
        );
        assert_eq!(reg.packages().collect::<Vec<_>>(), vec!["com.a", "com.b"]);
        let f = reg.factory("com.a").unwrap();
        assert_eq!(f().package_name(), "com.a");
        assert!(!reg.is_custom("com.a"));
        assert!(reg.factory("com.c").is_none());
    }

    #[test]
    fn custom_entries_shadow_and_are_replaced() {
        let overlay = OverlayOptions::default();
        let mut reg = HandlerRegistry::from_profiles(&[profile("com.a", None)], &overlay);
        let added = reg.merge_custom(
            vec![profile("com.a", Some("Mine")), profile("com.x", Some("X"))],
            &overlay,
        );
        assert_eq!(added, vec!["com.x".to_string()]);
        assert!(reg.is_custom("com.a"));
        assert_eq!(reg.profile("com.a").unwrap().display_name(), "Mine");
        assert_eq!(reg.len(), 2);

        let added = reg.merge_custom(Vec::new(), &overlay);
        assert!(added.is_empty());
        assert!(!reg.is_custom("com.a"));
        assert!(!reg.contains("com.x"));
        assert_eq!(reg.profiles().count(), 1);
    }
}
