use super::*;

fn filter(exclude: &[&str]) -> FileFilter {
    FileFilter::new(
        vec![VcsPath::new("/proj"), VcsPath::new("/proj/nested")],
        &["node_modules", ".git"],
        exclude,
        CaseSensitivity::Sensitive,
    )
    .unwrap()
}

#[test]
fn test_content_roots() {
    let filter = filter(&[]);
    assert!(filter.is_under_content_root(&VcsPath::new("/proj/src/a.rs")));
    assert!(filter.is_under_content_root(&VcsPath::new("/proj")));
    assert!(!filter.is_under_content_root(&VcsPath::new("/other/a.rs")));
    assert!(!filter.is_under_content_root(&VcsPath::new("/project/a.rs")));
}

#[test]
fn test_root_of_picks_longest() {
    let filter = filter(&[]);
    assert_eq!(
        filter.root_of(&VcsPath::new("/proj/nested/x")),
        Some(&VcsPath::new("/proj/nested"))
    );
}

#[test]
fn test_ignored_names_apply_to_any_component() {
    let filter = filter(&[]);
    assert!(!filter.is_allowed(&VcsPath::new("/proj/.git/HEAD"), false));
    assert!(!filter.is_allowed(&VcsPath::new("/proj/web/node_modules"), true));
    assert!(filter.is_allowed(&VcsPath::new("/proj/src/git.rs"), false));
}

#[test]
fn test_ignored_names_above_root_do_not_count() {
    let filter = FileFilter::new(
        vec![VcsPath::new("/work/target/proj")],
        &["target"],
        &[],
        CaseSensitivity::Sensitive,
    )
    .unwrap();
    assert!(filter.is_allowed(&VcsPath::new("/work/target/proj/a.rs"), false));
    assert!(!filter.is_allowed(&VcsPath::new("/work/target/proj/target/a.o"), false));
}

#[test]
fn test_exclude_globs() {
    let filter = filter(&["**/*.log", "/proj/tmp/**"]);
    assert!(!filter.is_allowed(&VcsPath::new("/proj/out/build.log"), false));
    assert!(!filter.is_allowed(&VcsPath::new("/proj/tmp/a/b.txt"), false));
    assert!(filter.is_allowed(&VcsPath::new("/proj/src/main.rs"), false));
}

#[test]
fn test_case_insensitive_filter() {
    let filter = FileFilter::new(
        vec![VcsPath::new("/Proj")],
        &["Node_Modules"],
        &["**/*.LOG"],
        CaseSensitivity::Insensitive,
    )
    .unwrap();
    assert!(filter.is_under_content_root(&VcsPath::new("/proj/a")));
    assert!(!filter.is_allowed(&VcsPath::new("/proj/node_modules/x"), false));
    assert!(!filter.is_allowed(&VcsPath::new("/proj/a.log"), false));
}

#[test]
fn test_invalid_glob_is_an_error() {
    let result = FileFilter::new(
        vec![VcsPath::new("/proj")],
        &[],
        &["a[b"],
        CaseSensitivity::Sensitive,
    );
    assert!(result.is_err());
}
