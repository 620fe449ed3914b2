use std::cmp::Ordering;
use std::str::FromStr;

use crate::{LocalSegment, Prerelease, PrereleaseKind, Version, VersionParseError};

/// <https://github.com/pypa/packaging/blob/237ff3aa348486cf835a980592af3a59fccd6101/tests/test_version.py#L24-L81>
const SORTED_VERSIONS: &[&str] = &[
    "1.0.dev456",
    "1.0a1",
    "1.0a2.dev456",
    "1.0a12.dev456",
    "1.0a12",
    "1.0b1.dev456",
    "1.0b2",
    "1.0b2.post345.dev456",
    "1.0b2.post345",
    "1.0rc1.dev456",
    "1.0rc1",
    "1.0",
    "1.0+abc.5",
    "1.0+abc.7",
    "1.0+5",
    "1.0.post456.dev34",
    "1.0.post456",
    "1.1.dev1",
    "1!0.1",
];

#[test]
fn ordering() {
    let versions = SORTED_VERSIONS
        .iter()
        .map(|version| Version::from_str(version).unwrap())
        .collect::<Vec<_>>();
    for (index, left) in versions.iter().enumerate() {
        for (other, right) in versions.iter().enumerate() {
            assert_eq!(
                left.cmp(right),
                index.cmp(&other),
                "{left} vs {right}"
            );
        }
    }
}

#[test]
fn normalization() {
    let cases = [
        ("1.0", "1.0"),
        ("v1.0", "1.0"),
        ("  1.0\t", "1.0"),
        ("1.0.ALPHA1", "1.0a1"),
        ("1.0-beta.2", "1.0b2"),
        ("1.0c1", "1.0rc1"),
        ("1.0pre", "1.0rc0"),
        ("1.0-1", "1.0.post1"),
        ("1.0.rev2", "1.0.post2"),
        ("1.0post", "1.0.post0"),
        ("1.0-dev", "1.0.dev0"),
        ("0!1.0", "1.0"),
        ("2!1.0", "2!1.0"),
        ("1.0+ABC-1_2", "1.0+abc.1.2"),
    ];
    for (input, normalized) in cases {
        assert_eq!(
            Version::from_str(input).unwrap().to_string(),
            normalized,
            "{input}"
        );
    }
}

#[test]
fn equality_ignores_trailing_zeros() {
    use std::collections::HashSet;

    let short = Version::from_str("1.2").unwrap();
    let long = Version::from_str("1.2.0.0").unwrap();
    assert_eq!(short, long);
    assert_eq!(short.cmp(&long), Ordering::Equal);

    let set = HashSet::from([short]);
    assert!(set.contains(&long));
}

#[test]
fn invalid_versions() {
    for version in ["french toast", "1.0+", "1.0.", "1.0-", "", "1.*.2", "1.0+local.*"] {
        assert!(Version::from_str(version).is_err(), "{version}");
    }
    assert_eq!(
        Version::from_str("1.0.*").unwrap_err(),
        VersionParseError::Wildcard("1.0.*".to_string())
    );
    insta::assert_snapshot!(
        Version::from_str("french toast").unwrap_err(),
        @"Version `french toast` doesn't match PEP 440 rules"
    );
}

#[test]
fn accessors() {
    let version = Version::from_str("3!1.2.3rc4.post5.dev6+ubuntu.7").unwrap();
    assert_eq!(version.epoch(), 3);
    assert_eq!(version.release(), &[1, 2, 3]);
    assert_eq!(
        version.pre(),
        Some(Prerelease {
            kind: PrereleaseKind::Rc,
            number: 4
        })
    );
    assert_eq!(version.post(), Some(5));
    assert_eq!(version.dev(), Some(6));
    assert_eq!(
        version.local(),
        &[
            LocalSegment::String("ubuntu".to_string()),
            LocalSegment::Number(7)
        ]
    );
    assert!(version.any_prerelease());
    assert_eq!(
        version.clone().without_local().to_string(),
        "3!1.2.3rc4.post5.dev6"
    );
}

#[test]
fn builder() {
    let version = Version::new([1, 0])
        .with_pre(Some(Prerelease {
            kind: PrereleaseKind::Beta,
            number: 1,
        }))
        .with_dev(Some(0));
    assert_eq!(version.to_string(), "1.0b1.dev0");
    assert_eq!(version, Version::from_str("1.0b1.dev0").unwrap());
}

#[test]
fn serde() {
    let version: Version = serde_json::from_str("\"1.0.POST1\"").unwrap();
    assert_eq!(serde_json::to_string(&version).unwrap(), "\"1.0.post1\"");
}
