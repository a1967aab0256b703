use std::{fs, path::Path};

use kconftool::{
    ctx::AppContext,
    tools::{AllConfigMode, Tool, allconfig, defconfig},
};
use tempfile::TempDir;

const KCONFIG: &str = "\
mainmenu \"Tools test\"

config NET
\tbool \"networking\"
\tdefault y

config NET_DEBUG
\tbool \"network debugging\"
\tdepends on NET

config NAME
\tstring \"host name\"
\tdefault \"box\"
";

fn workspace() -> (TempDir, AppContext) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Kconfig"), KCONFIG).unwrap();
    let ctx = AppContext::new(
        dir.path().to_path_buf(),
        Some(dir.path().join("Kconfig")),
        Some(dir.path().join(".config")),
        None,
    )
    .unwrap();
    (dir, ctx)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_allnoconfig_then_setconfig() {
    let (dir, ctx) = workspace();
    allconfig::run(&ctx, AllConfigMode::No).unwrap();
    let config = read(&dir.path().join(".config"));
    assert!(config.contains("# CONFIG_NET is not set\n"), "{config}");

    Tool::Setconfig {
        assignments: vec!["NET=y".into(), "NET_DEBUG=y".into()],
        no_check_exists: false,
        no_check_value: false,
    }
    .run(&ctx)
    .unwrap();
    let config = read(&dir.path().join(".config"));
    assert!(config.contains("CONFIG_NET=y\n"));
    assert!(config.contains("CONFIG_NET_DEBUG=y\n"));
    assert!(dir.path().join(".config.old").exists());
}

#[test]
fn test_savedefconfig_and_defconfig() {
    let (dir, ctx) = workspace();
    fs::write(dir.path().join(".config"), "CONFIG_NAME=\"server\"\n").unwrap();

    let out = dir.path().join("defconfig");
    defconfig::savedefconfig(&ctx, &out).unwrap();
    assert_eq!(read(&out), "CONFIG_NAME=\"server\"\n");

    fs::remove_file(dir.path().join(".config")).unwrap();
    defconfig::defconfig(&ctx, &out).unwrap();
    let config = read(&dir.path().join(".config"));
    assert!(config.contains("CONFIG_NAME=\"server\"\n"));
    assert!(config.contains("CONFIG_NET=y\n"));
}

#[test]
fn test_genconfig_writes_header_and_file_list() {
    let (dir, ctx) = workspace();
    let header = dir.path().join("include/generated/autoconf.h");
    let list = dir.path().join("files.txt");

    defconfig::genconfig(&ctx, Some(header.as_path()), None, Some(list.as_path())).unwrap();
    let text = read(&header);
    assert!(text.contains("#define CONFIG_NET 1\n"));
    assert!(text.contains("#define CONFIG_NAME \"box\"\n"));
    assert!(!text.contains("NET_DEBUG"));
    assert!(read(&list).trim_end().ends_with("Kconfig"));
}

#[test]
fn test_settings_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/Kconfig"), KCONFIG).unwrap();
    fs::write(
        dir.path().join(".kconftool.toml"),
        "kconfig = \"${workspaceFolder}/src/Kconfig\"\nconfig = \"out.config\"\n\
         header = \"# managed\\n\"\n",
    )
    .unwrap();

    let ctx = AppContext::new(dir.path().to_path_buf(), None, None, None).unwrap();
    assert_eq!(ctx.config, dir.path().join("out.config"));
    defconfig::olddefconfig(&ctx).unwrap();
    assert!(read(&dir.path().join("out.config")).starts_with("# managed\n"));
}
