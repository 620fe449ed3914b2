use std::str::FromStr;

use indoc::indoc;
use insta::assert_snapshot;
use test_case::test_case;

use pexl_normalize::ExtraName;

use crate::{
    ExtraOperator, MarkerEnvironment, MarkerExpression, MarkerTree, MarkerValueVersion, StringVersion,
};

fn env(python_version: &str, sys_platform: &str) -> MarkerEnvironment {
    MarkerEnvironment {
        implementation_name: "cpython".to_string(),
        implementation_version: StringVersion::from_str("3.11.4").unwrap(),
        os_name: "posix".to_string(),
        platform_machine: "x86_64".to_string(),
        platform_python_implementation: "CPython".to_string(),
        platform_release: "6.1.0".to_string(),
        platform_system: "Linux".to_string(),
        platform_version: "#1 SMP PREEMPT_DYNAMIC".to_string(),
        python_full_version: StringVersion::from_str(&format!("{python_version}.4")).unwrap(),
        python_version: StringVersion::from_str(python_version).unwrap(),
        sys_platform: sys_platform.to_string(),
    }
}

fn evaluate(marker: &str, env: &MarkerEnvironment, extras: &[&str]) -> bool {
    let extras = extras
        .iter()
        .map(|extra| ExtraName::new(extra).unwrap())
        .collect::<Vec<_>>();
    MarkerTree::from_str(marker).unwrap().evaluate(env, &extras)
}

#[test]
fn version_comparisons() {
    let env37 = env("3.7", "linux");
    let env311 = env("3.11", "linux");
    for (marker, on_37, on_311) in [
        (r#"python_version >= "3.8""#, false, true),
        (r#"python_version < '3.8'"#, true, false),
        (r#"python_version == "3.*""#, true, true),
        (r#"python_full_version ~= "3.11.0""#, false, true),
        (r#""3.9" <= python_version"#, false, true),
        (r#"python_version != "3.7""#, false, true),
    ] {
        assert_eq!(evaluate(marker, &env37, &[]), on_37, "{marker} on 3.7");
        assert_eq!(evaluate(marker, &env311, &[]), on_311, "{marker} on 3.11");
    }
}

#[test]
fn string_comparisons() {
    let linux = env("3.11", "linux");
    let windows = env("3.11", "win32");
    assert!(evaluate("sys_platform == 'linux'", &linux, &[]));
    assert!(!evaluate("sys_platform == 'linux'", &windows, &[]));
    assert!(evaluate("'win' in sys_platform", &windows, &[]));
    assert!(evaluate("'win' not in sys_platform", &linux, &[]));
    assert!(evaluate("sys.platform == 'linux'", &linux, &[]));
    assert!(evaluate("python_version in '3.10 3.11 3.12'", &linux, &[]));
}

#[test]
fn boolean_operators() {
    let linux = env("3.11", "linux");
    let marker = indoc! {r#"
        (sys_platform == "win32" or sys_platform == "linux")
        and python_version >= "3.8"
        and os_name == "posix"
    "#};
    assert!(evaluate(marker, &linux, &[]));
    assert!(!evaluate(
        r#"sys_platform == "win32" or python_version < "3""#,
        &linux,
        &[]
    ));
}

#[test]
fn extras_are_normalized() {
    let linux = env("3.11", "linux");
    assert!(evaluate("extra == 'Test_Suite'", &linux, &["test-suite"]));
    assert!(!evaluate("extra == 'docs'", &linux, &["test-suite"]));
    assert!(evaluate("extra != 'docs'", &linux, &[]));
    assert!(!evaluate("extra == 'docs'", &linux, &[]));
}

#[test]
fn invalid_comparisons_are_false() {
    let linux = env("3.11", "linux");
    assert!(!evaluate("python_version >= 'not-a-version'", &linux, &[]));
    assert!(!evaluate("sys_platform ~= 'linux'", &linux, &[]));
    assert!(!evaluate("os_name == python_version", &linux, &[]));
}

#[test]
fn references_extra() {
    let marker = MarkerTree::from_str("python_version > '3' and extra == 'test'").unwrap();
    assert!(marker.references_extra());
    let marker = MarkerTree::from_str("python_version > '3'").unwrap();
    assert!(!marker.references_extra());
}

#[test]
fn display() {
    let marker = MarkerTree::from_str(
        r#"os_name=='nt' and (python_version<"3.8" or platform_machine == 'x86_64') or extra=='a'"#,
    )
    .unwrap();
    assert_snapshot!(
        marker,
        @r#"(os_name == "nt" and (python_version < "3.8" or platform_machine == "x86_64")) or extra == "a""#
    );
}

#[test]
fn and_flattens() {
    let left = MarkerTree::from_str("os_name == 'nt' and sys_platform == 'win32'").unwrap();
    let right = MarkerTree::from_str("extra == 'test'").unwrap();
    let MarkerTree::And(trees) = left.and(right) else {
        panic!("expected a conjunction");
    };
    assert_eq!(trees.len(), 3);
}

#[test]
fn parse_errors() {
    let err = MarkerTree::from_str("python_version >= '3.8' and").unwrap_err();
    assert_snapshot!(err, @r"
    Expected a marker name or a quoted string, found end of input
    python_version >= '3.8' and
                               ^
    ");

    let err = MarkerTree::from_str("python_version => '3.8'").unwrap_err();
    assert_snapshot!(err, @r"
    Expected a marker operator such as '>=' or 'not in', found '=>'
    python_version => '3.8'
                   ^^
    ");

    let err = MarkerTree::from_str("pyton_version >= '3.8'").unwrap_err();
    assert_snapshot!(err, @r"
    'pyton_version' is not a marker name
    pyton_version >= '3.8'
    ^^^^^^^^^^^^^
    ");

    let err = MarkerTree::from_str("os_name == 'nt").unwrap_err();
    assert_snapshot!(err, @r"
    Missing closing `'`
    os_name == 'nt
               ^
    ");

    let err = MarkerTree::from_str("os_name not 'nt'").unwrap_err();
    assert_snapshot!(err, @r"
    Expected 'in' after 'not', found '''
    os_name not 'nt'
                ^
    ");

    let err = MarkerTree::from_str("(os_name == 'nt'").unwrap_err();
    assert_snapshot!(err, @r"
    Missing closing `)`
    (os_name == 'nt'
    ^
    ");
}

#[test_case(r#""3.9" <= python_version"#, r#"python_version >= "3.9""#)]
#[test_case("'3.8' > python_full_version", r#"python_full_version < "3.8""#)]
#[test_case("'linux' == sys_platform", r#"sys_platform == "linux""#)]
#[test_case("'win' in sys_platform", r#""win" in sys_platform"#)]
#[test_case("'3.1' not in python_version", r#""3.1" not in python_version"#)]
#[test_case("extra == 'Test_Suite'", r#"extra == "test-suite""#)]
#[test_case("python_version == '3.*'", r#"python_version == "3.*""#)]
#[test_case("os_name == python_version", "os_name == python_version")]
fn normalized_display(marker: &str, expected: &str) {
    assert_eq!(MarkerTree::from_str(marker).unwrap().to_string(), expected);
}

#[test]
fn expressions_are_typed() {
    let MarkerTree::Expression(expression) =
        MarkerTree::from_str("'3.8' <= python_version").unwrap()
    else {
        panic!("expected a single expression");
    };
    let MarkerExpression::Version { key, specifier } = expression else {
        panic!("expected a version comparison");
    };
    assert_eq!(key, MarkerValueVersion::PythonVersion);
    assert_eq!(specifier.to_string(), ">=3.8");

    let MarkerTree::Expression(expression) = MarkerTree::from_str("extra != 'Docs'").unwrap()
    else {
        panic!("expected a single expression");
    };
    assert_eq!(
        expression,
        MarkerExpression::Extra {
            operator: ExtraOperator::NotEqual,
            name: ExtraName::new("docs").unwrap(),
        }
    );

    for marker in [
        "os_name == python_version",
        "python_version >= 'not-a-version'",
        "'3.8' ~= python_version",
        "extra > 'a'",
    ] {
        let tree = MarkerTree::from_str(marker).unwrap();
        assert!(
            matches!(
                tree,
                MarkerTree::Expression(MarkerExpression::Arbitrary { .. })
            ),
            "{marker}: {tree:?}"
        );
        assert!(!tree.evaluate(&env("3.11", "linux"), &[]), "{marker}");
    }
}

#[test]
fn reversed_containment() {
    let windows = env("3.11", "win32");
    assert!(evaluate("'win' in sys_platform", &windows, &[]));
    assert!(!evaluate("'linux' in sys_platform", &windows, &[]));
    assert!(evaluate("'3.1' in python_version", &windows, &[]));
    assert!(!evaluate("'3.12' in python_version", &windows, &[]));
}

#[test]
fn environment_serde() {
    let linux = env("3.11", "linux");
    let json = serde_json::to_string(&linux).unwrap();
    assert!(json.contains(r#""python_version":"3.11""#));
    let parsed: MarkerEnvironment = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, linux);
}
