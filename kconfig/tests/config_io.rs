use std::fs;

use kconfig::{Kconfig, Tristate};

const KCONFIG: &str = "\
config BOOL
\tbool \"bool\"
\tdefault y

menu \"Strings\"
config STR
\tstring \"str\"
\tdefault \"plain\"
config NUM
\thex \"num\"
\tdefault 0x10
endmenu

config PROMPTLESS
\tbool
\tdefault BOOL
";

#[test]
fn test_config_round_trip_with_escaping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".config");

    let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
    let s = kconf.lookup("STR").unwrap();
    let b = kconf.lookup("BOOL").unwrap();
    kconf.set_value(s, r#"say "hi" \ bye"#);
    kconf.set_value(b, "n");

    let msg = kconf.write_config(Some(path.as_path()), None, false).unwrap();
    assert!(msg.starts_with("Configuration saved to"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains(r#"CONFIG_STR="say \"hi\" \\ bye""#), "{text}");
    assert!(text.contains("# CONFIG_BOOL is not set\n"));
    assert!(text.contains("#\n# Strings\n#\n"));
    assert!(text.contains("# end of Strings\n"));

    let mut other = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
    other.load_config(Some(path.as_path()), true).unwrap();
    let s2 = other.lookup("STR").unwrap();
    assert_eq!(other.str_value(s2), r#"say "hi" \ bye"#);
    assert_eq!(other.tri_value(other.lookup("BOOL").unwrap()), Tristate::N);
    assert_eq!(other.config_contents(None), text);
}

#[test]
fn test_unchanged_config_is_not_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".config");
    let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();

    kconf.write_config(Some(path.as_path()), None, true).unwrap();
    let msg = kconf.write_config(Some(path.as_path()), None, true).unwrap();
    assert!(msg.starts_with("No change to configuration"));

    let num = kconf.lookup("NUM").unwrap();
    kconf.set_value(num, "0x20");
    kconf.write_config(Some(path.as_path()), None, true).unwrap();

    let old = fs::read_to_string(dir.path().join(".config.old")).unwrap();
    assert!(old.contains("CONFIG_NUM=0x10"));
    let new = fs::read_to_string(&path).unwrap();
    assert!(new.contains("CONFIG_NUM=0x20"));
}

#[test]
fn test_min_config_lists_only_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("defconfig");
    let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();

    assert_eq!(kconf.min_config_contents(None), "");

    let num = kconf.lookup("NUM").unwrap();
    kconf.set_value(num, "0x20");
    kconf.write_min_config(&path, None).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "CONFIG_NUM=0x20\n");

    // Loading the minimal config reproduces the full one
    let mut other = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
    other.load_config(Some(path.as_path()), true).unwrap();
    assert_eq!(other.config_contents(None), kconf.config_contents(None));
}

#[test]
fn test_replace_and_merge_loading() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::write(&first, "CONFIG_NUM=0x30\n").unwrap();
    fs::write(&second, "CONFIG_STR=\"other\"\nCONFIG_UNKNOWN=y\n").unwrap();

    let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
    let num = kconf.lookup("NUM").unwrap();
    let s = kconf.lookup("STR").unwrap();

    kconf.load_config(Some(first.as_path()), true).unwrap();
    let msg = kconf.load_config(Some(second.as_path()), false).unwrap();
    assert!(msg.starts_with("Loaded configuration"));
    assert_eq!(kconf.str_value(num), "0x30");
    assert_eq!(kconf.str_value(s), "other");
    assert!(
        kconf
            .missing_syms()
            .iter()
            .any(|(name, val)| name == "UNKNOWN" && val == "y")
    );

    let msg = kconf.load_config(Some(second.as_path()), true).unwrap();
    assert!(msg.starts_with("Replaced configuration"));
    assert_eq!(kconf.str_value(num), "0x10");
}

#[test]
fn test_choice_selection_round_trip() {
    let text = "\
choice
\tprompt \"pick one\"
config FIRST
\tbool \"first\"
config SECOND
\tbool \"second\"
endchoice
";
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".config");

    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let second = kconf.lookup("SECOND").unwrap();
    assert!(kconf.set_value(second, "y"));
    kconf.write_config(Some(path.as_path()), Some(""), false).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, "# CONFIG_FIRST is not set\nCONFIG_SECOND=y\n");

    let mut other = Kconfig::from_text(text, "Kconfig").unwrap();
    let choice = other.unique_choices()[0];
    let first = other.lookup("FIRST").unwrap();
    let second = other.lookup("SECOND").unwrap();
    assert_eq!(other.choice_selection(choice), Some(first));

    other.load_config(Some(path.as_path()), true).unwrap();
    assert_eq!(other.choice_selection(choice), Some(second));
    assert_eq!(other.choice(choice).user_selection(), Some(second));
    assert_eq!(other.tri_value(first), Tristate::N);
    assert_eq!(other.tri_value(second), Tristate::Y);
    assert!(!other.config_outdated());
}

#[test]
fn test_autoconf_header() {
    let mut kconf = Kconfig::from_text(KCONFIG, "Kconfig").unwrap();
    let s = kconf.lookup("STR").unwrap();
    kconf.set_value(s, "a\"b");

    let header = kconf.autoconf_contents(None);
    assert!(header.contains("#define CONFIG_BOOL 1\n"));
    assert!(header.contains("#define CONFIG_PROMPTLESS 1\n"));
    assert!(header.contains("#define CONFIG_STR \"a\\\"b\"\n"));
    assert!(header.contains("#define CONFIG_NUM 0x10\n"));
}
