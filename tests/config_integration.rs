use std::path::PathBuf;

use synapse::config::{ConfigFlags, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".synapserc");
    let content = r"
# comment
--no-autosave

--vault notes

--render-debug-log=render.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_autosave);
    assert_eq!(flags.vault, Some(PathBuf::from("notes")));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".synapserc");
    let content = "--autosave-ms 2000\n--server http://localhost:8000\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "synapse".to_string(),
        "--server".to_string(),
        "http://vault.internal:9000".to_string(),
        "--perf".to_string(),
        "today.md".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert_eq!(effective.autosave_ms, Some(2000), "file flags should remain");
    assert!(effective.perf, "cli flags should be applied");
    assert_eq!(
        effective.server.as_deref(),
        Some("http://vault.internal:9000"),
        "cli should override server"
    );
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "synapse".to_string(),
        "--keymap=keys.json".to_string(),
        "--render-debug-log=render.log".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.keymap, Some(PathBuf::from("keys.json")));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        no_autosave: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        perf: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.no_autosave);
    assert!(merged.perf);
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
}
