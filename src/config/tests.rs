use super::*;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
    assert!(config.game.path.is_none());
    assert!(config.game.search_dirs.is_empty());
    assert!(config.payload.dir.is_none());
}

#[test]
fn test_set_get_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("config.toml");
    let mut config = Config::default();
    config.set_value("game.path", "/games/140").unwrap();
    config.set_value("payload.dir", "/opt/timer/payload").unwrap();
    config.save_to(&file).unwrap();

    let loaded = Config::load_from(&file).unwrap();
    assert_eq!(loaded.get_value("game.path").unwrap(), "/games/140");
    assert_eq!(loaded.get_value("payload.dir").unwrap(), "/opt/timer/payload");
}

#[test]
fn test_empty_value_clears() {
    let mut config = Config::default();
    config.set_value("game.path", "/games/140").unwrap();
    config.set_value("game.path", "").unwrap();
    assert!(config.game.path.is_none());
    assert_eq!(config.get_value("game.path").unwrap(), "");
}

#[test]
fn test_unknown_key() {
    let mut config = Config::default();
    assert!(config.get_value("game.version").is_err());
    assert!(config.set_value("editor.command", "x").is_err());
}

#[test]
fn test_partial_file_and_search_dirs() {
    let config: Config = toml::from_str(
        "[game]\nsearch_dirs = [\"/mnt/steam/steamapps/common\"]\n",
    )
    .unwrap();
    assert_eq!(
        config.game.search_dirs,
        vec![PathBuf::from("/mnt/steam/steamapps/common")]
    );
    assert!(config.payload.dir.is_none());
}

#[test]
fn test_no_config_location_gives_defaults() {
    let config = Config::load_optional(None).unwrap();
    assert!(config.game.path.is_none());
    assert!(config.payload.dir.is_none());
}

#[test]
fn test_load_optional_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "[payload]\ndir = \"/opt/timer\"\n").unwrap();
    let config = Config::load_optional(Some(&file)).unwrap();
    assert_eq!(config.get_value("payload.dir").unwrap(), "/opt/timer");
}
