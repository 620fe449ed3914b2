use insta::assert_snapshot;

use pexl_requirement::DistVersion;

use crate::{Artifact, ArtifactChange, ArtifactUrl, ArtifactsUpdate, Fingerprint};

fn file(url: &str, hash: &str) -> Artifact {
    Artifact::file(ArtifactUrl::parse(url).unwrap(), Fingerprint::new("sha256", hash))
}

fn calculate(original: &[Artifact], updated: &[Artifact]) -> ArtifactsUpdate {
    ArtifactsUpdate::calculate(DistVersion::new("1.0"), original, updated)
}

const WHEEL: &str = "https://files.example.com/packages/foo-1.0-py3-none-any.whl";
const MIRROR_WHEEL: &str = "https://mirror.example.com/simple/foo-1.0-py3-none-any.whl";
const SDIST: &str = "https://files.example.com/packages/foo-1.0.tar.gz";

#[test]
fn verification_is_not_a_change() {
    let update = calculate(
        &[file(WHEEL, "abc")],
        &[file(WHEEL, "abc").with_verified(true)],
    );
    assert!(update.is_empty());
}

#[test]
fn fragment_is_not_a_change() {
    let update = calculate(
        &[file(WHEEL, "abc")],
        &[file(&format!("{WHEEL}#sha256=abc"), "abc")],
    );
    assert!(update.is_empty());
}

#[test]
fn url_update() {
    let update = calculate(&[file(WHEEL, "abc")], &[file(MIRROR_WHEEL, "abc")]);
    let [ArtifactChange::Url(change)] = update.updated.as_slice() else {
        panic!("expected a URL update: {update:?}");
    };
    assert_snapshot!(change.render_update(), @"https://files.example.com/packages/foo-1.0-py3-none-any.whl -> https://mirror.example.com/simple/foo-1.0-py3-none-any.whl");
    assert!(update.added.is_empty() && update.removed.is_empty());
}

#[test]
fn fingerprint_update() {
    let update = calculate(&[file(WHEEL, "abc")], &[file(WHEEL, "def")]);
    let [ArtifactChange::Fingerprint(change)] = update.updated.as_slice() else {
        panic!("expected a fingerprint update: {update:?}");
    };
    assert_eq!(change.source, "foo-1.0-py3-none-any.whl");
    assert_snapshot!(change.render_update(), @"foo-1.0-py3-none-any.whl sha256:abc -> sha256:def");
}

#[test]
fn artifact_update() {
    let update = calculate(&[file(WHEEL, "abc")], &[file(MIRROR_WHEEL, "def")]);
    let [change @ ArtifactChange::Artifact(_)] = update.updated.as_slice() else {
        panic!("expected an artifact update: {update:?}");
    };
    assert_snapshot!(change.render_update(), @"https://files.example.com/packages/foo-1.0-py3-none-any.whl#sha256:abc -> https://mirror.example.com/simple/foo-1.0-py3-none-any.whl#sha256:def");
}

#[test]
fn url_artifacts_are_keyed_by_url() {
    let vcs = |url: &str, hash: &str| {
        Artifact::url(ArtifactUrl::parse(url).unwrap(), Fingerprint::new("sha256", hash))
    };
    let update = calculate(
        &[vcs("https://github.com/example/foo/archive/abc123.zip", "abc")],
        &[vcs("https://GitHub.com/example/foo/archive/abc123.zip", "def")],
    );
    assert!(matches!(
        update.updated.as_slice(),
        [ArtifactChange::Fingerprint(_)]
    ));
}

#[test]
fn added_and_removed() {
    let other_wheel = "https://files.example.com/packages/foo-1.0-cp311-cp311-win_amd64.whl";
    let update = calculate(
        &[file(WHEEL, "abc"), file(SDIST, "def")],
        &[file(WHEEL, "abc"), file(other_wheel, "ghi")],
    );
    assert!(update.updated.is_empty());
    assert_eq!(
        update
            .added
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        [format!("{other_wheel}#sha256:ghi")]
    );
    assert_eq!(
        update
            .removed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        [format!("{SDIST}#sha256:def")]
    );
}

#[test]
fn serialize() {
    let update = calculate(&[file(WHEEL, "abc")], &[file(WHEEL, "def")]);
    assert_snapshot!(serde_json::to_string_pretty(&update).unwrap(), @r#"
    {
      "version": "1.0",
      "added": [],
      "updated": [
        {
          "type": "fingerprint",
          "source": "foo-1.0-py3-none-any.whl",
          "original": {
            "algorithm": "sha256",
            "hash": "abc"
          },
          "updated": {
            "algorithm": "sha256",
            "hash": "def"
          }
        }
      ],
      "removed": []
    }
    "#);
}
