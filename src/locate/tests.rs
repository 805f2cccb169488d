use super::*;
use crate::locate::steam::{parse_install_dir, parse_library_folders};
use crate::locate::windows::parse_reg_value;

fn fake_game(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("140.exe"), "MZ").unwrap();
}

#[test]
fn test_validate_requires_signature() {
    let dir = tempfile::tempdir().unwrap();
    let err = InstallationPath::validate(dir.path()).unwrap_err();
    assert!(err.contains("140.exe"));

    fake_game(dir.path());
    let found = InstallationPath::validate(dir.path()).unwrap();
    assert_eq!(found.as_path(), dir.path().canonicalize().unwrap());
}

#[test]
fn test_explicit_path_does_not_fall_back() {
    let good = tempfile::tempdir().unwrap();
    fake_game(good.path());
    let bad = tempfile::tempdir().unwrap();

    let resolver = PathResolver::new(vec![Box::new(DefaultLocationScan::new(vec![
        good.path().to_path_buf(),
    ]))]);
    let err = resolver
        .resolve(&Settings::with_path(bad.path()))
        .unwrap_err();
    assert!(matches!(err, LocateError::PathInvalid { .. }));

    assert!(resolver.resolve(&Settings::default()).is_ok());
}

#[test]
fn test_missing_explicit_path() {
    let resolver = PathResolver::new(Vec::new());
    let err = resolver
        .resolve(&Settings::with_path("/definitely/not/here"))
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"/definitely/not/here is not a 140 installation: directory does not exist"
    );
}

#[test]
fn test_not_found_when_no_strategy_matches() {
    let empty = tempfile::tempdir().unwrap();
    let resolver = PathResolver::new(vec![
        Box::new(PackageManagerLookup::new(vec![empty.path().to_path_buf()])),
        Box::new(DefaultLocationScan::new(vec![empty.path().to_path_buf()])),
    ]);
    assert!(matches!(
        resolver.resolve(&Settings::default()),
        Err(LocateError::NotFound)
    ));
}

#[test]
fn test_strategies_tried_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fake_game(first.path());
    fake_game(second.path());
    let resolver = PathResolver::new(vec![
        Box::new(ExplicitPath::new(first.path())),
        Box::new(DefaultLocationScan::new(vec![second.path().to_path_buf()])),
    ]);
    let found = resolver.discover().unwrap();
    assert_eq!(found.as_path(), first.path().canonicalize().unwrap());
}

#[test]
fn test_default_scan_probes_140_child() {
    let games = tempfile::tempdir().unwrap();
    fake_game(&games.path().join("140"));
    let scan = DefaultLocationScan::new(vec![games.path().to_path_buf()]);
    let resolver = PathResolver::new(vec![Box::new(scan)]);
    let found = resolver.discover().unwrap();
    assert!(found.as_path().ends_with("140"));
}

#[test]
fn test_steam_library_lookup() {
    let steam = tempfile::tempdir().unwrap();
    let library = tempfile::tempdir().unwrap();
    let apps = steam.path().join("steamapps");
    std::fs::create_dir_all(&apps).unwrap();
    std::fs::write(
        apps.join("libraryfolders.vdf"),
        format!(
            "\"libraryfolders\"\n{{\n\t\"1\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n}}\n",
            library.path().display()
        ),
    )
    .unwrap();
    let lib_apps = library.path().join("steamapps");
    std::fs::create_dir_all(&lib_apps).unwrap();
    std::fs::write(
        lib_apps.join("appmanifest_242820.acf"),
        "\"AppState\"\n{\n\t\"appid\"\t\t\"242820\"\n\t\"installdir\"\t\t\"One Forty\"\n}\n",
    )
    .unwrap();
    fake_game(&lib_apps.join("common").join("One Forty"));

    let lookup = PackageManagerLookup::new(vec![steam.path().to_path_buf()]);
    let resolver = PathResolver::new(vec![Box::new(lookup)]);
    let found = resolver.discover().unwrap();
    assert!(found.as_path().ends_with("common/One Forty"));
}

#[test]
fn test_parse_library_folders_both_layouts() {
    let current = r#"
"libraryfolders"
{
	"0"
	{
		"path"		"C:\\Program Files (x86)\\Steam"
		"label"		""
	}
	"1"
	{
		"path"		"D:\\SteamLibrary"
	}
}
"#;
    assert_eq!(
        parse_library_folders(current),
        vec![
            PathBuf::from(r"C:\Program Files (x86)\Steam"),
            PathBuf::from(r"D:\SteamLibrary"),
        ]
    );

    let legacy = "\"LibraryFolders\"\n{\n\t\"TimeNextStatsReport\"\t\t\"1234\"\n\t\"1\"\t\t\"/mnt/games/steam\"\n}\n";
    assert_eq!(
        parse_library_folders(legacy),
        vec![PathBuf::from("/mnt/games/steam")]
    );
}

#[test]
fn test_parse_install_dir() {
    assert_eq!(
        parse_install_dir("\"AppState\"\n{\n\t\"installdir\"\t\t\"140\"\n}"),
        Some("140".to_string())
    );
    assert_eq!(parse_install_dir("\"AppState\"\n{\n}"), None);
}

#[test]
fn test_parse_reg_value() {
    let output = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\Steam App 242820\r\n    InstallLocation    REG_SZ    C:\\Games\\Steam\\steamapps\\common\\140\r\n\r\n";
    assert_eq!(
        parse_reg_value(output, "InstallLocation").as_deref(),
        Some(r"C:\Games\Steam\steamapps\common\140")
    );
    assert_eq!(parse_reg_value(output, "InstallPath"), None);
}
