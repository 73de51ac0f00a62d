use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_DB_PATH: &str = "data/finance.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// Where the database lives and how many pooled connections may be open.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub pool_size: u32,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::Figment;
    use rocket::figment::providers::Serialized;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let figment = Figment::from(Serialized::defaults(serde_json::json!({
            "port": 8000,
            "pool_size": 2,
        })));
        let config: StoreConfig = figment.extract().unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.pool_size, 2);
    }

    #[test]
    fn explicit_path_keeps_default_pool() {
        let config = StoreConfig::new("/tmp/ledger.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    }
}
