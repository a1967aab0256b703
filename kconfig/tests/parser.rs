use std::fs;

use kconfig::{Error, Kconfig, LoadOptions, Tristate};
use tempfile::TempDir;

const QUALIFIED_DEP: &str = "\
config X
\tbool \"x\"
config Y
\tbool \"y\"
config A
\tbool \"a\"
\tdefault y
\tdepends on X if Y
";

fn load_tree(files: &[(&str, &str)]) -> kconfig::Result<(TempDir, Kconfig)> {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
    let opts = LoadOptions {
        srctree: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let kconf = Kconfig::load_with("Kconfig", opts)?;
    Ok((dir, kconf))
}

#[test]
fn test_qualified_depends_on() {
    let mut kconf = Kconfig::from_text(QUALIFIED_DEP, "Kconfig").unwrap();
    let x = kconf.lookup("X").unwrap();
    let y = kconf.lookup("Y").unwrap();
    let a = kconf.lookup("A").unwrap();

    // Condition false: the dependency does not apply
    assert_eq!(kconf.tri_value(a), Tristate::Y);

    kconf.set_value(y, "y");
    assert_eq!(kconf.tri_value(a), Tristate::N);

    kconf.set_value(x, "y");
    assert_eq!(kconf.tri_value(a), Tristate::Y);
}

#[test]
fn test_multiple_if_qualifiers_rejected() {
    let text = "config A\n\tbool \"a\"\n\tdepends on X if Y if Z\n";
    let err = Kconfig::from_text(text, "Kconfig").err().unwrap();
    assert!(matches!(err, Error::Parse { .. }));
    assert!(
        err.to_string()
            .contains("multiple 'if' qualifiers on a single 'depends on'")
    );
}

#[test]
fn test_parse_errors_carry_location() {
    let err = Kconfig::from_text("config A\n\tbool\nbogus line\n", "Kconfig")
        .err()
        .unwrap();
    let msg = err.to_string();
    assert!(msg.starts_with("Kconfig:3: error:"), "{msg}");
    assert!(msg.contains("unrecognized construct"));

    let err = Kconfig::from_text("endmenu\n", "Kconfig").err().unwrap();
    assert!(err.to_string().contains("no corresponding 'menu'"));
}

#[test]
fn test_mainmenu_and_menus() {
    let text = "mainmenu \"Test Configuration\"\n\
                menu \"Drivers\"\nconfig D\n\tbool \"d\"\nendmenu\n";
    let kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    assert_eq!(kconf.mainmenu_text(), "Test Configuration");
    assert_eq!(kconf.menus().len(), 1);
    let menu = kconf.node(kconf.menus()[0]);
    assert_eq!(menu.prompt_text(), Some("Drivers"));
}

#[test]
fn test_source_variants() {
    let (_dir, kconf) = load_tree(&[
        ("Kconfig", "source \"sub/Kconfig\"\nosource \"missing/Kconfig\"\n"),
        ("sub/Kconfig", "config SUB\n\tbool \"sub\"\nrsource \"inner/Kconfig\"\n"),
        ("sub/inner/Kconfig", "config INNER\n\tbool \"inner\"\n"),
    ])
    .unwrap();

    assert!(kconf.sym(kconf.lookup("SUB").unwrap()).is_defined());
    assert!(kconf.sym(kconf.lookup("INNER").unwrap()).is_defined());
    assert!(
        kconf
            .kconfig_filenames()
            .iter()
            .any(|f| f == "sub/inner/Kconfig")
    );
}

#[test]
fn test_missing_source_is_an_error() {
    let err = load_tree(&[("Kconfig", "source \"nowhere/Kconfig\"\n")])
        .err()
        .unwrap();
    assert!(err.to_string().contains("'nowhere/Kconfig' not found"));
}

#[test]
fn test_recursive_source() {
    let err = load_tree(&[
        ("Kconfig", "source \"a/Kconfig\"\n"),
        ("a/Kconfig", "source \"Kconfig\"\n"),
    ])
    .err()
    .unwrap();
    assert!(matches!(err, Error::RecursiveSource { .. }), "{err}");
}

#[test]
fn test_if_block_propagates_dependency() {
    let text = "config COND\n\tbool \"cond\"\n\
                if COND\nconfig INSIDE\n\tbool \"inside\"\n\tdefault y\nendif\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let cond = kconf.lookup("COND").unwrap();
    let inside = kconf.lookup("INSIDE").unwrap();

    assert_eq!(kconf.tri_value(inside), Tristate::N);
    kconf.set_value(cond, "y");
    assert_eq!(kconf.tri_value(inside), Tristate::Y);
}
