use kconfig::{Error, Kconfig};

#[test]
#[ntest::timeout(10000)]
fn test_three_symbol_loop_is_reported() {
    let text = "\
config A
\tbool \"a\"
\tdepends on B
config B
\tbool \"b\"
\tdepends on C
config C
\tbool \"c\"
\tdepends on A
";
    let err = Kconfig::from_text(text, "Kconfig").err().unwrap();
    let Error::DependencyLoop(report) = &err else {
        panic!("expected a dependency loop, got {err}");
    };
    let expected = "
Dependency loop
===============

A (defined at Kconfig:1), with definition...

config A
\tbool \"a\"
\tdepends on B

...depends on B (defined at Kconfig:4), with definition...

config B
\tbool \"b\"
\tdepends on C

...depends on C (defined at Kconfig:7), with definition...

config C
\tbool \"c\"
\tdepends on A

...depends again on A (defined at Kconfig:1)";
    assert_eq!(report, expected);
}

#[test]
#[ntest::timeout(10000)]
fn test_select_loop_is_reported() {
    let text = "config A\n\tbool \"a\"\n\tselect B\nconfig B\n\tbool \"b\"\n\tdepends on A\n\
                config C\n\tbool \"c\"\n\tselect A\n\tdepends on B\n";
    let err = Kconfig::from_text(text, "Kconfig").err().unwrap();
    assert!(matches!(err, Error::DependencyLoop(_)), "{err}");
}

#[test]
#[ntest::timeout(10000)]
fn test_long_chain_is_not_a_loop() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut text = String::from("config S0\n\tbool \"s0\"\n\tdefault y\n");
    for i in 1..64 {
        text.push_str(&format!(
            "config S{i}\n\tbool \"s{i}\"\n\tdefault y\n\tdepends on S{}\n",
            i - 1
        ));
    }
    let mut kconf = Kconfig::from_text(&text, "Kconfig").unwrap();
    let last = kconf.lookup("S63").unwrap();
    assert_eq!(kconf.str_value(last), "y");

    let first = kconf.lookup("S0").unwrap();
    kconf.set_value(first, "n");
    assert_eq!(kconf.str_value(last), "n");
}
