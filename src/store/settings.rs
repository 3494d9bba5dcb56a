//! Typed accessors for persisted user settings

use tracing::info;
use uuid::Uuid;

use super::{FileStore, StoreResult};

/// Keys of every value persisted by the crate
pub mod keys {
    pub const SELECTED_REGION_ID: &str = "selected_region_id";
    pub const SELECTED_CITY_ID: &str = "selected_city_id";
    pub const ONLY_ACCESSIBLE_BUSES: &str = "only_accessible_buses";
    pub const RECENT_ROUTES: &str = "recent_routes";
    pub const APP_CODE: &str = "app_code";
    pub const CACHED_STATIONS: &str = "cached_stations";
    pub const CACHED_ROUTES: &str = "cached_routes";
    pub const CACHED_CITY_ID: &str = "cached_city_id";
    pub const SELECTED_ROUTE_IDS: &str = "selected_route_ids";
}

/// Length of the installation code shown to users for support requests
const APP_CODE_LEN: usize = 8;

/// User settings backed by a `FileStore`
///
/// Cloning is cheap; all clones share the same directory on disk.
#[derive(Debug, Clone)]
pub struct Settings {
    store: FileStore,
}

impl Settings {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn selected_region_id(&self) -> Option<i64> {
        self.store.read(keys::SELECTED_REGION_ID)
    }

    pub fn set_selected_region_id(&self, region_id: i64) -> StoreResult<()> {
        self.store.write(keys::SELECTED_REGION_ID, &region_id)
    }

    pub fn selected_city_id(&self) -> Option<i64> {
        self.store.read(keys::SELECTED_CITY_ID)
    }

    /// Stores the selected city
    ///
    /// Use `CacheCoordinator::select_city` instead when cached routes and
    /// stations must follow the change.
    pub fn set_selected_city_id(&self, city_id: i64) -> StoreResult<()> {
        self.store.write(keys::SELECTED_CITY_ID, &city_id)
    }

    pub fn only_accessible_buses(&self) -> bool {
        self.store
            .read(keys::ONLY_ACCESSIBLE_BUSES)
            .unwrap_or(false)
    }

    pub fn set_only_accessible_buses(&self, enabled: bool) -> StoreResult<()> {
        self.store.write(keys::ONLY_ACCESSIBLE_BUSES, &enabled)
    }

    pub fn recent_routes(&self) -> Vec<String> {
        self.store.read(keys::RECENT_ROUTES).unwrap_or_default()
    }

    pub fn set_recent_routes(&self, routes: &[String]) -> StoreResult<()> {
        self.store.write(keys::RECENT_ROUTES, routes)
    }

    pub fn selected_route_ids(&self) -> Vec<i64> {
        self.store.read(keys::SELECTED_ROUTE_IDS).unwrap_or_default()
    }

    pub fn set_selected_route_ids(&self, ids: &[i64]) -> StoreResult<()> {
        self.store.write(keys::SELECTED_ROUTE_IDS, ids)
    }

    /// Returns the installation code, generating and storing it on first use
    pub fn app_code(&self) -> StoreResult<String> {
        if let Some(code) = self.store.read::<String>(keys::APP_CODE) {
            if !code.is_empty() {
                return Ok(code);
            }
        }

        let code = generate_app_code();
        self.store.write(keys::APP_CODE, &code)?;
        info!(%code, "generated installation code");
        Ok(code)
    }
}

/// Generates a short, uppercase installation code from a random UUID
fn generate_app_code() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    uuid[..APP_CODE_LEN].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_settings() -> (Settings, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let settings = Settings::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
        (settings, temp_dir)
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let (settings, _temp_dir) = create_test_settings();

        assert_eq!(settings.selected_region_id(), None);
        assert_eq!(settings.selected_city_id(), None);
        assert!(!settings.only_accessible_buses());
        assert!(settings.recent_routes().is_empty());
        assert!(settings.selected_route_ids().is_empty());
    }

    #[test]
    fn test_scalar_settings_persist() {
        let (settings, temp_dir) = create_test_settings();

        settings.set_selected_region_id(1).unwrap();
        settings.set_selected_city_id(2).unwrap();
        settings.set_only_accessible_buses(true).unwrap();

        let reopened = Settings::new(FileStore::with_dir(temp_dir.path().to_path_buf()));
        assert_eq!(reopened.selected_region_id(), Some(1));
        assert_eq!(reopened.selected_city_id(), Some(2));
        assert!(reopened.only_accessible_buses());
    }

    #[test]
    fn test_lists_preserve_order() {
        let (settings, _temp_dir) = create_test_settings();

        settings.set_selected_route_ids(&[7, 3, 9]).unwrap();
        settings
            .set_recent_routes(&["12".to_string(), "3A".to_string()])
            .unwrap();

        assert_eq!(settings.selected_route_ids(), vec![7, 3, 9]);
        assert_eq!(settings.recent_routes(), vec!["12", "3A"]);
    }

    #[test]
    fn test_app_code_is_generated_once() {
        let (settings, _temp_dir) = create_test_settings();

        let first = settings.app_code().unwrap();
        let second = settings.app_code().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), APP_CODE_LEN);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_app_code_regenerated_when_corrupted() {
        let (settings, temp_dir) = create_test_settings();
        fs::write(temp_dir.path().join("app_code.json"), "12").unwrap();

        let code = settings.app_code().unwrap();

        assert_eq!(code.len(), APP_CODE_LEN);
        assert_eq!(settings.app_code().unwrap(), code);
    }
}
