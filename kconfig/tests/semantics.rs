use kconfig::{BinOp, Kconfig, Tristate, join_expr, split_expr};

const CHOICE: &str = "\
config DEP
\tbool \"dep\"

choice
\tprompt \"pick one\"
config X
\tbool \"x\"
config Y
\tbool \"y\"
\tdepends on DEP
endchoice
";

#[test]
fn test_select_forces_value() {
    let text = "config A\n\tbool \"a\"\n\tdefault y\n\tselect B\nconfig B\n\tbool \"b\"\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let a = kconf.lookup("A").unwrap();
    let b = kconf.lookup("B").unwrap();

    assert_eq!(kconf.tri_value(b), Tristate::Y);
    // Selected symbols cannot go below the select
    assert_eq!(kconf.assignable(b), &[Tristate::Y]);

    kconf.set_value(a, "n");
    assert_eq!(kconf.tri_value(b), Tristate::N);
}

#[test]
fn test_imply_is_weak() {
    let text = "config A\n\tbool \"a\"\n\tdefault y\n\timply B\nconfig B\n\tbool \"b\"\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let b = kconf.lookup("B").unwrap();

    assert_eq!(kconf.tri_value(b), Tristate::Y);
    kconf.set_value(b, "n");
    assert_eq!(kconf.tri_value(b), Tristate::N);
}

#[test]
fn test_split_and_join_preserve_value() {
    let text = "config A\n\tbool \"a\"\nconfig B\n\tbool \"b\"\nconfig C\n\tbool \"c\"\n\
                config D\n\tbool \"d\"\n\tdepends on A && B || C\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let d = kconf.lookup("D").unwrap();
    let dep = kconf.sym(d).direct_dep().clone();

    let ors = split_expr(&dep, BinOp::Or);
    assert_eq!(ors.len(), 2);
    assert_eq!(split_expr(&ors[0], BinOp::And).len(), 2);
    let joined = join_expr(&ors, BinOp::Or).unwrap();

    for assignment in [("A", "y"), ("B", "y"), ("C", "y"), ("A", "n")] {
        let sym = kconf.lookup(assignment.0).unwrap();
        kconf.set_value(sym, assignment.1);
        assert_eq!(kconf.eval(&dep), kconf.eval(&joined));
    }
    assert!(join_expr(&[], BinOp::And).is_none());
}

#[test]
fn test_values_are_stable_across_reads() {
    let text = "config A\n\tbool \"a\"\n\tdefault y\nconfig B\n\tint \"b\"\n\tdefault 3\n\
                config UNRELATED\n\tbool \"u\"\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let a = kconf.lookup("A").unwrap();
    let b = kconf.lookup("B").unwrap();

    let first = (kconf.tri_value(a), kconf.str_value(b));
    assert_eq!(first, (kconf.tri_value(a), kconf.str_value(b)));

    let unrelated = kconf.lookup("UNRELATED").unwrap();
    kconf.set_value(unrelated, "y");
    assert_eq!(first, (kconf.tri_value(a), kconf.str_value(b)));
    assert_eq!(first, (Tristate::Y, "3".to_string()));
}

#[test]
fn test_choice_selection_follows_visibility_and_user() {
    let mut kconf = Kconfig::from_text(CHOICE, "Kconfig").unwrap();
    let choice = kconf.unique_choices()[0];
    let dep = kconf.lookup("DEP").unwrap();
    let x = kconf.lookup("X").unwrap();
    let y = kconf.lookup("Y").unwrap();

    assert_eq!(kconf.choice_selection(choice), Some(x));

    // Making Y visible does not change the default
    kconf.set_value(dep, "y");
    assert_eq!(kconf.choice_selection(choice), Some(x));

    assert!(kconf.set_value(y, "y"));
    assert_eq!(kconf.choice_selection(choice), Some(y));
    assert_eq!(kconf.tri_value(y), Tristate::Y);
    assert_eq!(kconf.tri_value(x), Tristate::N);

    // The user selection is ignored while it is invisible
    kconf.set_value(dep, "n");
    assert_eq!(kconf.choice_selection(choice), Some(x));
}

#[test]
fn test_ranges_clamp_defaults() {
    let text = "config N\n\tint \"n\"\n\trange 1 10\n\tdefault 42\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let n = kconf.lookup("N").unwrap();

    assert_eq!(kconf.str_value(n), "10");
    kconf.set_value(n, "5");
    assert_eq!(kconf.str_value(n), "5");
    // Out of range user values fall back on the default
    kconf.set_value(n, "50");
    assert_eq!(kconf.str_value(n), "10");
}

#[test]
fn test_modules_gate_tristates() {
    let text = "config MODULES\n\tbool \"modules\"\n\toption modules\n\
                config T\n\ttristate \"t\"\n\tdefault m\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let modules = kconf.lookup("MODULES").unwrap();
    let t = kconf.lookup("T").unwrap();

    // Without modules, m behaves like y
    assert_eq!(kconf.tri_value(t), Tristate::Y);
    kconf.set_value(modules, "y");
    assert_eq!(kconf.tri_value(t), Tristate::M);
}

#[test]
fn test_eval_string() {
    let text = "config A\n\tbool \"a\"\n\tdefault y\nconfig S\n\tstring \"s\"\n\tdefault \"foo\"\n";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();

    assert_eq!(kconf.eval_string("A && !n").unwrap(), Tristate::Y);
    assert_eq!(kconf.eval_string("S = \"foo\"").unwrap(), Tristate::Y);
    assert_eq!(kconf.eval_string("S != \"foo\" || !A").unwrap(), Tristate::N);
    assert!(kconf.eval_string("A &&").is_err());
}

#[test]
fn test_choice_default_follows_its_condition() {
    let text = "\
config DEP
\tbool \"dep\"

choice
\tprompt \"pick one\"
\tdefault Y if DEP
config X
\tbool \"x\"
config Y
\tbool \"y\"
endchoice
";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let choice = kconf.unique_choices()[0];
    let dep = kconf.lookup("DEP").unwrap();
    let x = kconf.lookup("X").unwrap();
    let y = kconf.lookup("Y").unwrap();

    assert_eq!(kconf.choice_selection(choice), Some(x));
    assert_eq!(kconf.tri_value(x), Tristate::Y);

    kconf.set_value(dep, "y");
    assert_eq!(kconf.choice_selection(choice), Some(y));
    assert_eq!(kconf.tri_value(x), Tristate::N);
    assert_eq!(kconf.tri_value(y), Tristate::Y);

    kconf.set_value(dep, "n");
    assert_eq!(kconf.choice_selection(choice), Some(x));
    assert_eq!(kconf.tri_value(y), Tristate::N);
}

#[test]
fn test_menu_visible_if_hides_prompts_only() {
    let text = "\
config SHOW
\tbool \"show\"

menu \"Options\"
\tvisible if SHOW

config OPT
\tbool \"opt\"
\tdefault y

config NAME
\tstring \"name\"
\tdefault \"v\"

endmenu
";
    let mut kconf = Kconfig::from_text(text, "Kconfig").unwrap();
    let show = kconf.lookup("SHOW").unwrap();
    let opt = kconf.lookup("OPT").unwrap();
    let name = kconf.lookup("NAME").unwrap();

    assert_eq!(kconf.visibility(opt), Tristate::N);
    assert_eq!(kconf.visibility(name), Tristate::N);
    // Values still come from the defaults
    assert_eq!(kconf.tri_value(opt), Tristate::Y);
    assert_eq!(kconf.str_value(name), "v");

    // User values wait until the prompts are visible
    kconf.set_value(opt, "n");
    kconf.set_value(name, "w");
    assert_eq!(kconf.tri_value(opt), Tristate::Y);
    assert_eq!(kconf.str_value(name), "v");

    kconf.set_value(show, "y");
    assert_eq!(kconf.visibility(opt), Tristate::Y);
    assert_eq!(kconf.tri_value(opt), Tristate::N);
    assert_eq!(kconf.str_value(name), "w");
}
