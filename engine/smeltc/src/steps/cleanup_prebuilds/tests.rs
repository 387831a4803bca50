use std::fs;
use std::thread;

use pretty_assertions::assert_eq;

use smelt_tools::ToolBox;

use super::*;

struct Fixture {
    _dir: tempfile::TempDir,
    config: BuildConfig,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BuildConfig::new("proj", dir.path(), ToolBox::new());
    config.prepare().unwrap();
    Fixture { _dir: dir, config }
}

fn touch(config: &BuildConfig, name: &str) -> PathBuf {
    let path = config.prebuild_folder().join(name);
    fs::write(&path, b"x").unwrap();
    path
}

fn remaining(config: &BuildConfig) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(config.prebuild_folder())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn no_policy_removes_everything_unused() {
    let mut fixture = fixture();
    let used = touch(&fixture.config, "used.1a.o");
    touch(&fixture.config, "unused.2b.o");
    touch(&fixture.config, "unused.3c.mod");
    fixture.config.artefacts.add_current_prebuilds([used]);

    let deleted = cleanup_prebuilds(&mut fixture.config, &CleanupArgs::default()).unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(remaining(&fixture.config), vec!["used.1a.o"]);
}

#[test]
fn age_policy_only_deletes_old_files() {
    let mut fixture = fixture();
    touch(&fixture.config, "old.1a.o");
    thread::sleep(Duration::from_millis(60));
    touch(&fixture.config, "new.2b.o");

    let args = CleanupArgs {
        older_than: Some(Duration::from_millis(30)),
        n_versions: None,
    };
    let deleted = cleanup_prebuilds(&mut fixture.config, &args).unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(remaining(&fixture.config), vec!["new.2b.o"]);
}

#[test]
fn version_policy_keeps_the_newest_of_each_group() {
    let mut fixture = fixture();
    touch(&fixture.config, "foo.1a.o");
    thread::sleep(Duration::from_millis(20));
    touch(&fixture.config, "foo.2b.o");
    thread::sleep(Duration::from_millis(20));
    touch(&fixture.config, "foo.3c.o");
    touch(&fixture.config, "bar.9f.mod");

    let args = CleanupArgs {
        older_than: None,
        n_versions: Some(2),
    };
    let deleted = cleanup_prebuilds(&mut fixture.config, &args).unwrap();

    assert_eq!(deleted, 1, "only the oldest foo variant goes");
    assert_eq!(
        remaining(&fixture.config),
        vec!["bar.9f.mod", "foo.2b.o", "foo.3c.o"]
    );
}

#[test]
fn current_prebuilds_survive_every_policy() {
    let mut fixture = fixture();
    let used = touch(&fixture.config, "used.1a.o");
    thread::sleep(Duration::from_millis(40));
    fixture.config.artefacts.add_current_prebuilds([used]);

    let args = CleanupArgs {
        older_than: Some(Duration::from_millis(1)),
        n_versions: Some(0),
    };
    let deleted = cleanup_prebuilds(&mut fixture.config, &args).unwrap();

    assert_eq!(deleted, 0);
    assert_eq!(remaining(&fixture.config), vec!["used.1a.o"]);
}

#[test]
fn groups_strip_the_hash_component() {
    let files = vec![
        PathBuf::from("/pre/foo.1a.o"),
        PathBuf::from("/pre/foo.2b.o"),
        PathBuf::from("/pre/bar.3c.mod"),
        PathBuf::from("/pre/nohash.o"),
    ];
    let groups = get_prebuild_file_groups(&files);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups["foo.*.o"].len(), 2);
    assert_eq!(groups["bar.*.mod"].len(), 1);
}
