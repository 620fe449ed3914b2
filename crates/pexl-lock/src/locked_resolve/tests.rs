use std::str::FromStr;

use insta::assert_snapshot;

use pexl_normalize::PackageName;
use pexl_pep508::{MarkerEnvironment, StringVersion};
use pexl_requirement::{DistVersion, Requirement};

use crate::{Artifact, ArtifactUrl, Fingerprint, LockedRequirement, LockedResolve, Pin};

fn marker_env(sys_platform: &str) -> MarkerEnvironment {
    MarkerEnvironment {
        implementation_name: "cpython".to_string(),
        implementation_version: StringVersion::from_str("3.11.4").unwrap(),
        os_name: "posix".to_string(),
        platform_machine: "x86_64".to_string(),
        platform_python_implementation: "CPython".to_string(),
        platform_release: String::new(),
        platform_system: "Linux".to_string(),
        platform_version: String::new(),
        python_full_version: StringVersion::from_str("3.11.4").unwrap(),
        python_version: StringVersion::from_str("3.11").unwrap(),
        sys_platform: sys_platform.to_string(),
    }
}

fn locked(name: &str, version: &str, requires_dists: &[&str]) -> LockedRequirement {
    let url = format!("https://files.example.com/{name}-{version}-py3-none-any.whl");
    LockedRequirement::new(
        Pin::new(PackageName::new(name).unwrap(), DistVersion::new(version)),
        Artifact::file(ArtifactUrl::parse(&url).unwrap(), Fingerprint::new("sha256", name)),
    )
    .with_requires_dists(
        requires_dists
            .iter()
            .map(|requirement| Requirement::parse(requirement).unwrap()),
    )
}

fn requirements(requirements: &[&str]) -> Vec<Requirement> {
    requirements
        .iter()
        .map(|requirement| Requirement::parse(requirement).unwrap())
        .collect()
}

fn reachable(resolve: &LockedResolve, roots: &[&str], sys_platform: &str) -> Vec<String> {
    let mut reachable = resolve
        .reachable(&requirements(roots), &marker_env(sys_platform))
        .unwrap()
        .into_iter()
        .map(|project_name| project_name.to_string())
        .collect::<Vec<_>>();
    reachable.sort();
    reachable
}

#[test]
fn reachable_follows_markers_and_extras() {
    let resolve = LockedResolve::new(
        None,
        [
            locked(
                "app",
                "1.0",
                &[
                    "requests",
                    "colorama; sys_platform == 'win32'",
                    "pytest; extra == 'test'",
                ],
            ),
            locked("requests", "2.31.0", &["urllib3", "PySocks; extra == 'socks'"]),
            locked("urllib3", "2.0.7", &[]),
            locked("colorama", "0.4.6", &[]),
            locked("pytest", "7.4.0", &[]),
            locked("pysocks", "1.7.1", &[]),
        ],
    );

    assert_eq!(reachable(&resolve, &["app"], "linux"), ["app", "requests", "urllib3"]);
    assert_eq!(
        reachable(&resolve, &["app"], "win32"),
        ["app", "colorama", "requests", "urllib3"]
    );
    assert_eq!(
        reachable(&resolve, &["app[test]", "requests[socks]"], "linux"),
        ["app", "pysocks", "pytest", "requests", "urllib3"]
    );
    // Extras requested after a project was first reached still activate their dependencies.
    assert_eq!(
        reachable(&resolve, &["requests", "app", "requests[socks]"], "linux"),
        ["app", "pysocks", "requests", "urllib3"]
    );
    assert!(reachable(&resolve, &["colorama; sys_platform == 'win32'"], "linux").is_empty());
}

#[test]
fn reachable_missing_dependency() {
    let resolve = LockedResolve::new(None, [locked("app", "1.0", &["requests"])]);
    let err = resolve
        .reachable(&requirements(&["app"]), &marker_env("linux"))
        .unwrap_err();
    assert_snapshot!(err, @"The locked resolve does not contain `requests`, required by app 1.0.");

    let err = resolve
        .reachable(&requirements(&["missing"]), &marker_env("linux"))
        .unwrap_err();
    assert_snapshot!(err, @"The locked resolve does not contain `missing`, required by the lock requirements.");
}

#[test]
fn sorted_by_pin() {
    let resolve = LockedResolve::new(
        Some("cp311-cp311-manylinux_2_17_x86_64".to_string()),
        [locked("b", "1.0", &[]), locked("a", "2.0", &[]), locked("a", "1.0", &[])],
    );
    assert_eq!(
        resolve
            .locked_requirements
            .iter()
            .map(|locked_requirement| locked_requirement.pin.to_string())
            .collect::<Vec<_>>(),
        ["a 1.0", "a 2.0", "b 1.0"]
    );
    assert!(resolve.find(&PackageName::new("B").unwrap()).is_some());
}

#[test]
fn pin_requirement() {
    let pin = Pin::new(PackageName::new("Foo").unwrap(), DistVersion::new("1.0"));
    assert_eq!(pin.as_requirement().to_string(), "foo==1.0");
    assert!(pin.as_requirement().matches(&pin));
    assert!(Requirement::parse("foo>=1").unwrap().matches(&pin));
    assert!(!Requirement::parse("bar>=1").unwrap().matches(&pin));

    let legacy = Pin::new(PackageName::new("foo").unwrap(), DistVersion::new("1.0-SNAPSHOT"));
    assert_eq!(legacy.as_requirement().to_string(), "foo===1.0-SNAPSHOT");
}

#[test]
fn artifact_urls() {
    let url = ArtifactUrl::parse("HTTPS://Files.Example.com/foo-1.0.tar.gz#sha256=abc").unwrap();
    assert_eq!(url.download_url(), "HTTPS://Files.Example.com/foo-1.0.tar.gz");
    assert_eq!(url.normalized_url(), "https://files.example.com/foo-1.0.tar.gz");
    assert_eq!(
        url,
        ArtifactUrl::parse("https://files.example.com/foo-1.0.tar.gz").unwrap()
    );

    let artifact = Artifact::file(url, Fingerprint::new("sha256", "abc"));
    assert_eq!(artifact.key(), "foo-1.0.tar.gz");
    assert_eq!(
        artifact.artifact_key(),
        artifact.clone().with_verified(true).artifact_key()
    );
}
