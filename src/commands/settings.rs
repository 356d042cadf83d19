use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 2;
const SETTINGS_FILE: &str = "courtlens.json";

pub const DEFAULT_MIN_YEAR: i64 = 2017;
pub const DEFAULT_MAX_YEAR: i64 = 2025;

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub data_dir: PathBuf,
    pub cache_path: PathBuf,
    pub min_year: i32,
    pub max_year: i32,
    pub worker_limit: usize,
    pub watch_data_dir: bool,
    pub persist_cache: bool,
    pub forecast_horizon: u32,
}

pub fn load_effective_settings(data_dir: &Path) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(data_dir)?;
    Ok(effective_from_value(data_dir, &settings))
}

fn effective_from_value(data_dir: &Path, settings: &Value) -> EffectiveSettings {
    let cache_path = settings
        .get("cachePath")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_cache_path(data_dir));

    let worker_limit = match settings.get("workerLimit").and_then(Value::as_u64).unwrap_or(0) {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n as usize,
    };

    EffectiveSettings {
        data_dir: data_dir.to_path_buf(),
        cache_path,
        min_year: settings
            .get("minYear")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_MIN_YEAR) as i32,
        max_year: settings
            .get("maxYear")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_MAX_YEAR) as i32,
        worker_limit,
        watch_data_dir: settings
            .get("watchDataDir")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        persist_cache: settings
            .get("persistCache")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        forecast_horizon: settings
            .get("forecastHorizon")
            .and_then(Value::as_u64)
            .unwrap_or(2) as u32,
    }
}

pub fn default_cache_path(data_dir: &Path) -> PathBuf {
    data_dir.join("cache").join("distributions.db")
}

pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, String> {
    let path = settings_path(data_dir);

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {SETTINGS_FILE}: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {SETTINGS_FILE}: {e}");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original && data_dir.is_dir() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(data_dir: &Path, settings: Value) -> Result<Value, String> {
    let path = settings_path(data_dir);
    fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory: {e}"))?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

/// Turn `key=value` pairs into a patch for `save_settings_to_disk`.
///
/// Values parse as JSON when they can (`4`, `false`), otherwise as strings.
pub fn settings_patch(assignments: &[String]) -> Result<Value, String> {
    let known = default_settings();
    let mut patch = Map::new();

    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Expected KEY=VALUE, got `{assignment}`"))?;
        let key = key.trim();
        if key == "schema_version" || known.get(key).is_none() {
            return Err(format!("Unknown setting `{key}`"));
        }
        let raw = raw.trim();
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| json!(raw));
        patch.insert(key.to_string(), value);
    }

    Ok(Value::Object(patch))
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write {SETTINGS_FILE}: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 2 {
        // V1 cached one JSON file per season under `cacheDir`; V2 uses a single database.
        migrate_cache_dir_to_path(&mut out);
    }

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "cachePath": "",
        "minYear": DEFAULT_MIN_YEAR,
        "maxYear": DEFAULT_MAX_YEAR,
        "workerLimit": 0,
        "watchDataDir": false,
        "persistCache": true,
        "forecastHorizon": 2
    })
}

fn migrate_cache_dir_to_path(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(cache_dir) = obj.remove("cacheDir") else {
        return;
    };
    if let Some(dir) = cache_dir.as_str().filter(|d| !d.trim().is_empty()) {
        let path = Path::new(dir).join("distributions.db");
        obj.entry("cachePath".to_string())
            .or_insert_with(|| json!(path.to_string_lossy()));
    }
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_i64(obj, "minYear", 1946, 2100, DEFAULT_MIN_YEAR);
    clamp_i64(obj, "maxYear", 1946, 2100, DEFAULT_MAX_YEAR);
    let min = obj.get("minYear").and_then(Value::as_i64).unwrap_or(DEFAULT_MIN_YEAR);
    let max = obj.get("maxYear").and_then(Value::as_i64).unwrap_or(DEFAULT_MAX_YEAR);
    if min > max {
        obj.insert("minYear".to_string(), json!(max));
        obj.insert("maxYear".to_string(), json!(min));
    }

    // 0 means one worker per available core.
    clamp_u64(obj, "workerLimit", 0, 64, 0);
    clamp_u64(obj, "forecastHorizon", 0, 10, 2);
    ensure_bool(obj, "watchDataDir", false);
    ensure_bool(obj, "persistCache", true);

    if !obj.get("cachePath").is_some_and(Value::is_string) {
        obj.insert("cachePath".to_string(), json!(""));
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn clamp_i64(map: &mut Map<String, Value>, key: &str, min: i64, max: i64, default: i64) {
    let raw = map.get(key).and_then(Value::as_i64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_legacy_cache_dir() {
        let migrated = migrate_settings(json!({
            "schema_version": 1,
            "cacheDir": "/srv/shots/cache"
        }));

        assert!(migrated.get("cacheDir").is_none());
        assert_eq!(
            migrated["cachePath"],
            json!("/srv/shots/cache/distributions.db")
        );
        assert_eq!(
            migrated.get("schema_version").and_then(Value::as_i64),
            Some(SETTINGS_SCHEMA_VERSION)
        );
    }

    #[test]
    fn sanitizes_inverted_year_window_and_bounds() {
        let migrated = migrate_settings(json!({
            "minYear": 2025,
            "maxYear": 2017,
            "workerLimit": 500,
            "watchDataDir": "yes"
        }));

        assert_eq!(migrated["minYear"], json!(2017));
        assert_eq!(migrated["maxYear"], json!(2025));
        assert_eq!(migrated["workerLimit"], json!(64));
        assert_eq!(migrated["watchDataDir"], json!(false));
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "forecastHorizon": 4 }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["forecastHorizon"], json!(4));
        assert_eq!(migrated["maxYear"], json!(DEFAULT_MAX_YEAR));
    }

    #[test]
    fn effective_settings_fill_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let effective = load_effective_settings(dir.path()).expect("settings");

        assert_eq!(effective.cache_path, default_cache_path(dir.path()));
        assert_eq!((effective.min_year, effective.max_year), (2017, 2025));
        assert!(effective.worker_limit >= 1);
        assert!(!effective.watch_data_dir);
        assert!(effective.persist_cache);
        assert!(dir.path().join(SETTINGS_FILE).exists());
    }

    #[test]
    fn patch_parses_typed_and_string_values() {
        let patch = settings_patch(&[
            "workerLimit=4".to_string(),
            "persistCache=false".to_string(),
            "cachePath=/srv/courtlens/cache.db".to_string(),
        ])
        .expect("patch");

        assert_eq!(patch["workerLimit"], json!(4));
        assert_eq!(patch["persistCache"], json!(false));
        assert_eq!(patch["cachePath"], json!("/srv/courtlens/cache.db"));
    }

    #[test]
    fn patch_rejects_unknown_or_malformed_keys() {
        assert!(settings_patch(&["colour=red".to_string()]).is_err());
        assert!(settings_patch(&["schema_version=9".to_string()]).is_err());
        assert!(settings_patch(&["workerLimit".to_string()]).is_err());
    }

    #[test]
    fn saved_settings_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        save_settings_to_disk(dir.path(), json!({ "workerLimit": 3, "minYear": 2019 }))
            .expect("save");

        let effective = load_effective_settings(dir.path()).expect("settings");
        assert_eq!(effective.worker_limit, 3);
        assert_eq!(effective.min_year, 2019);
    }
}
