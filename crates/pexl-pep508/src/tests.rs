use std::str::FromStr;

use indoc::indoc;
use insta::assert_snapshot;

use pexl_normalize::{ExtraName, PackageName};
use pexl_pep440::{Version, VersionSpecifiers};

use crate::{MarkerTree, Requirement, VersionOrUrl};

fn assert_err(input: &str, expected: &str) {
    assert_eq!(
        Requirement::from_str(input).unwrap_err().to_string(),
        expected
    );
}

#[test]
fn full_requirement() {
    let requirement = Requirement::from_str(
        r#" requests [security,tests] >= 2.8.1, == 2.8.* ; python_version > "3.8" "#,
    )
    .unwrap();
    assert_eq!(requirement.name, PackageName::new("requests").unwrap());
    assert_eq!(
        requirement.extras,
        vec![
            ExtraName::new("security").unwrap(),
            ExtraName::new("tests").unwrap()
        ]
    );
    assert_eq!(
        requirement.version_or_url,
        Some(VersionOrUrl::VersionSpecifier(
            VersionSpecifiers::from_str(">=2.8.1, ==2.8.*").unwrap()
        ))
    );
    assert_eq!(
        requirement.marker,
        Some(MarkerTree::from_str(r#"python_version > "3.8""#).unwrap())
    );
    assert_snapshot!(requirement, @r#"requests[security,tests]>=2.8.1,==2.8.*; python_version > "3.8""#);
}

#[test]
fn name_only() {
    let requirement = Requirement::from_str("Foo.Bar_baz").unwrap();
    assert_eq!(requirement.name.as_str(), "foo-bar-baz");
    assert!(requirement.extras.is_empty());
    assert!(requirement.version_or_url.is_none());
    assert!(requirement.marker.is_none());
}

#[test]
fn parenthesized_specifiers() {
    let requirement = Requirement::from_str("name (>= 1.0, < 2)").unwrap();
    let specifiers = requirement.specifiers().unwrap();
    assert!(specifiers.contains(&Version::new([1, 5])));
    assert!(!specifiers.contains(&Version::new([2])));
    assert_eq!(requirement.to_string(), "name>=1.0,<2");
}

#[test]
fn direct_reference_with_marker() {
    let requirement = Requirement::from_str(
        "pip @ https://github.com/pypa/pip/archive/1.3.1.zip ; sys_platform == 'linux'",
    )
    .unwrap();
    assert_eq!(
        requirement.url().map(url::Url::as_str),
        Some("https://github.com/pypa/pip/archive/1.3.1.zip")
    );
    assert_snapshot!(requirement, @r#"pip @ https://github.com/pypa/pip/archive/1.3.1.zip ; sys_platform == "linux""#);
    assert_eq!(
        Requirement::from_str(&requirement.to_string()).unwrap(),
        requirement
    );
}

#[test]
fn round_trip() {
    for input in [
        "foo",
        "foo[bar]",
        "foo[bar,baz]>=1.0",
        "foo>=1.0,!=1.5.*",
        r#"foo; extra == "test" and (python_version < "3.8" or os_name == "nt")"#,
        "foo===1.0+local",
        "foo @ file:///tmp/foo-1.0.tar.gz",
    ] {
        let requirement = Requirement::from_str(input).unwrap();
        let reparsed = Requirement::from_str(&requirement.to_string()).unwrap();
        assert_eq!(requirement, reparsed, "{input}");
    }
}

#[test]
fn empty_extras() {
    let requirement = Requirement::from_str("black[]").unwrap();
    assert!(requirement.extras.is_empty());
}

#[test]
fn error_empty() {
    assert_err(
        "",
        indoc! {"
            Expected a package name, found end of input

            ^"
        },
    );
}

#[test]
fn error_start() {
    assert_err(
        "_name",
        indoc! {"
            Package names must start with a letter or digit, found '_'
            _name
            ^"
        },
    );
}

#[test]
fn error_end() {
    assert_err(
        "name_",
        indoc! {"
            Package names must end with a letter or digit, found '_'
            name_
                ^"
        },
    );
}

#[test]
fn error_extras_unclosed() {
    assert_err(
        "black[d",
        indoc! {"
            Missing closing `]`
            black[d
                 ^"
        },
    );
}

#[test]
fn error_extras_separator() {
    assert_err(
        "black[d jupyter]",
        indoc! {"
            Expected ',' or ']' after extra `d`, found 'j'
            black[d jupyter]
                    ^"
        },
    );
}

#[test]
fn error_invalid_url() {
    let err = Requirement::from_str("name @ not-a-url").unwrap_err();
    assert_snapshot!(err, @r"
    relative URL without a base
    name @ not-a-url
           ^^^^^^^^^
    ");
}

#[test]
fn error_trailing() {
    assert_err(
        "name==1.0 ; os_name == 'nt' garbage",
        indoc! {"
            Expected 'and' or 'or' between marker expressions, found 'g'
            name==1.0 ; os_name == 'nt' garbage
                                        ^^^^^^^"
        },
    );
}

#[test]
fn error_unexpected_token() {
    assert_err(
        "name 1.0",
        indoc! {"
            Expected a version specifier, `@ <url>` or `;`, found '1'
            name 1.0
                 ^"
        },
    );
}

#[test]
fn error_specifier_points_at_clause() {
    assert_err(
        "name >=1.0, <2.0.*",
        indoc! {"
            `<` does not accept a wildcard version
            name >=1.0, <2.0.*
                        ^^^^^^"
        },
    );
}

#[test]
fn error_unclosed_parentheses() {
    assert_err(
        "name (>=1.0",
        indoc! {"
            Missing closing `)`
            name (>=1.0
                 ^"
        },
    );
}

#[test]
fn error_trailing_after_url() {
    assert_err(
        "pip @ https://example.org/pip.zip extra",
        indoc! {"
            Expected ';' or the end of the requirement, found 'e'
            pip @ https://example.org/pip.zip extra
                                              ^^^^^"
        },
    );
}

#[test]
fn error_wide_characters() {
    let err = Requirement::from_str("名前").unwrap_err();
    assert_snapshot!(err, @r"
    Expected a package name, found '名'
    名前
    ^^
    ");
}

#[test]
fn serde_string() {
    let requirement = Requirement::from_str("foo[bar]>=1").unwrap();
    let json = serde_json::to_string(&requirement).unwrap();
    assert_eq!(json, r#""foo[bar]>=1""#);
    let parsed: Requirement = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, requirement);
}
