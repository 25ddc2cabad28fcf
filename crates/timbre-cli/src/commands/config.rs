use std::path::Path;

use anyhow::{Context, Result};
use timbre_search::{config, Config};
use toml_edit::{value, DocumentMut, Item, Table};

/// Keys `config get` and `config set` understand.
const KEYS: &[&str] = &[
    "backend_url",
    "api_key",
    "collection",
    "catalog_path",
    "model_endpoint",
    "cache_dir",
    "default_limit",
    "request_timeout_secs",
    "retry_attempts",
    "logging.level",
    "logging.coloured",
];

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    for key in KEYS {
        println!("  {key}: {}", lookup(config, key).unwrap_or_default());
    }

    println!("\nPriority: CLI args > ENV vars (TIMBRE_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value, or print the whole config file.
pub fn get_config(config: &Config, key: Option<&str>) -> Result<()> {
    if let Some(key) = key {
        let Some(found) = lookup(config, key) else {
            anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, KEYS.join(", "));
        };
        println!("{found}");
    } else {
        let config_path = config::config_file_path();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            print!("{contents}");
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'timbre config init' to create it.");
        }
    }

    Ok(())
}

fn lookup(config: &Config, key: &str) -> Option<String> {
    let not_set = || String::from("<not set>");
    let found = match key {
        "backend_url" => config.backend_url.clone(),
        "api_key" => config.api_key.as_ref().map_or_else(not_set, |_| "<set>".to_string()),
        "collection" => config.collection.clone(),
        "catalog_path" => config.catalog_path.display().to_string(),
        "model_endpoint" => config.model_endpoint.clone().unwrap_or_else(not_set),
        "cache_dir" => config.cache_dir.display().to_string(),
        "default_limit" => config.default_limit.to_string(),
        "request_timeout_secs" => config.request_timeout_secs.to_string(),
        "retry_attempts" => config.retry_attempts.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.coloured" => config.logging.coloured.to_string(),
        _ => return None,
    };
    Some(found)
}

/// Set a config value, keeping the rest of the file and its comments.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    check_key(key)?;

    let config_path = config::config_file_path();

    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path)
        .context("Failed to read config file")?;
    let updated = set_in_document(&contents, key, raw)?;

    std::fs::write(&config_path, updated)
        .context("Failed to write config file")?;

    println!("✓ Updated {key} = {raw}");
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    init_config_at(&config::config_file_path())
}

fn init_config_at(config_path: &Path) -> Result<()> {
    if config::ensure_config_file_at(config_path)? {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure timbre.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

fn check_key(key: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, KEYS.join(", "));
    }
    Ok(())
}

fn set_in_document(contents: &str, key: &str, raw: &str) -> Result<String> {
    check_key(key)?;

    let mut doc: DocumentMut = contents.parse().context("Config file is not valid TOML")?;
    let new_value = typed_value(key, raw)?;

    match key.split_once('.') {
        Some((section, field)) => {
            let table = doc
                .entry(section)
                .or_insert(Item::Table(Table::new()))
                .as_table_mut()
                .ok_or_else(|| anyhow::anyhow!("'{section}' in the config file is not a table"))?;
            table[field] = new_value;
        }
        None => doc[key] = new_value,
    }

    Ok(doc.to_string())
}

fn typed_value(key: &str, raw: &str) -> Result<Item> {
    let item = match key {
        "default_limit" | "request_timeout_secs" | "retry_attempts" => {
            let n: i64 = raw
                .parse()
                .with_context(|| format!("{key} must be a whole number"))?;
            value(n)
        }
        "logging.coloured" => {
            let b: bool = raw
                .parse()
                .with_context(|| format!("{key} must be true or false"))?;
            value(b)
        }
        _ => value(raw),
    };
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_preserves_comments() {
        let original = "# backend\nbackend_url = \"http://old:6333\"\n\n[logging]\nlevel = \"info\"\n";
        let updated = set_in_document(original, "backend_url", "http://new:6333").unwrap();
        assert!(updated.contains("# backend"));
        assert!(updated.contains("backend_url = \"http://new:6333\""));
        assert!(updated.contains("level = \"info\""));
    }

    #[test]
    fn test_set_nested_and_typed() {
        let updated = set_in_document("", "logging.coloured", "false").unwrap();
        assert!(updated.contains("[logging]"));
        assert!(updated.contains("coloured = false"));

        let updated = set_in_document("", "default_limit", "20").unwrap();
        assert!(updated.contains("default_limit = 20"));

        assert!(set_in_document("", "default_limit", "many").is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(set_in_document("", "database_path", "x").is_err());
    }

    #[test]
    fn test_set_unknown_key_fails_before_touching_disk() {
        let err = set_config("database_path", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
    }

    #[test]
    fn test_init_writes_example_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("timbre").join("config.toml");

        init_config_at(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, config::example_config());
        assert!(written.parse::<DocumentMut>().is_ok());

        std::fs::write(&path, "collection = \"mine\"\n").unwrap();
        init_config_at(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "collection = \"mine\"\n");
    }

    #[test]
    fn test_lookup_hides_api_key() {
        let config = Config {
            api_key: Some("secret".to_string()),
            ..Config::default()
        };
        assert_eq!(lookup(&config, "api_key").as_deref(), Some("<set>"));
        assert_eq!(lookup(&config, "nope"), None);
    }
}
