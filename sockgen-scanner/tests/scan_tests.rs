use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use sockgen_core::types::VhostName;
use sockgen_scanner::{scan, ScanConfig};

fn config_for(root: &Path) -> ScanConfig {
    ScanConfig {
        roots: vec![root.to_path_buf()],
        override_dir: None,
        socket_permissions: None,
    }
}

fn make_host_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).expect("create host dir");
    dir
}

fn bind_socket(dir: &Path) -> (PathBuf, UnixListener) {
    let path = dir.join("sock");
    let listener = UnixListener::bind(&path).expect("bind unix socket");
    (path, listener)
}

#[test]
fn socket_and_yaml_name_yield_directory_keyed_host() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    let (sock, _listener) = bind_socket(&dir);
    fs::write(dir.join("host.yml"), "name: myapp\n").unwrap();

    let hosts = scan(&config_for(root.path()));

    assert_eq!(hosts.len(), 1);
    let host = hosts.get(&VhostName::from("app1")).expect("host under dir name");
    assert_eq!(host.name, "myapp");
    assert_eq!(host.socket_path, sock);
    assert_eq!(host.config.get("host").map(String::as_str), Some("app1"));
}

#[test]
fn yaml_host_key_rekeys_the_final_map() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    let (_sock, _listener) = bind_socket(&dir);
    fs::write(dir.join("host.yml"), "host: canonical-name\n").unwrap();

    let hosts = scan(&config_for(root.path()));

    assert!(hosts.contains_key(&VhostName::from("canonical-name")));
    assert!(!hosts.contains_key(&VhostName::from("app1")));
    let host = &hosts[&VhostName::from("canonical-name")];
    assert_eq!(
        host.config.get("host").map(String::as_str),
        Some("canonical-name")
    );
}

#[test]
fn host_file_single_line_sets_display_name() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "web");
    fs::write(dir.join("host"), "pretty-name\n").unwrap();

    let hosts = scan(&config_for(root.path()));
    assert_eq!(hosts[&VhostName::from("web")].name, "pretty-name");
}

#[test]
fn host_file_with_extra_lines_is_ignored() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "web");
    fs::write(dir.join("host"), "one\ntwo\n").unwrap();

    let hosts = scan(&config_for(root.path()));
    // Name falls back to the directory basename.
    assert_eq!(hosts[&VhostName::from("web")].name, "web");
}

#[test]
fn yaml_name_key_wins_over_host_file() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "web");
    fs::write(dir.join("host"), "from-file\n").unwrap();
    fs::write(dir.join("host.yml"), "name: from-yaml\n").unwrap();

    let hosts = scan(&config_for(root.path()));
    assert_eq!(hosts[&VhostName::from("web")].name, "from-yaml");
}

#[test]
fn socket_only_directory_yields_default_host() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "bare");
    let (sock, _listener) = bind_socket(&dir);

    let hosts = scan(&config_for(root.path()));

    let host = &hosts[&VhostName::from("bare")];
    assert_eq!(host.name, "bare");
    assert_eq!(host.socket_path, sock);
    assert_eq!(host.config.get("host").map(String::as_str), Some("bare"));
}

#[test]
fn metadata_only_directory_still_yields_a_host() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "pending");
    fs::write(dir.join("host.yml"), "port: '9000'\n").unwrap();

    let hosts = scan(&config_for(root.path()));

    let host = &hosts[&VhostName::from("pending")];
    assert_eq!(host.socket_path, PathBuf::new(), "no socket discovered yet");
    assert_eq!(host.config.get("port").map(String::as_str), Some("9000"));
}

#[test]
fn malformed_yaml_is_skipped_not_fatal() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "broken");
    let (_sock, _listener) = bind_socket(&dir);
    fs::write(dir.join("host.yml"), "not: [valid: yaml").unwrap();

    let hosts = scan(&config_for(root.path()));

    // The host survives with defaults; only the yaml channel is dropped.
    let host = &hosts[&VhostName::from("broken")];
    assert_eq!(host.name, "broken");
    assert_eq!(host.config.len(), 1, "only the defaulted host key");
}

#[test]
fn overrides_are_published_under_the_provisional_key() {
    let root = TempDir::new().unwrap();
    let override_dir = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    let (_sock, _listener) = bind_socket(&dir);
    fs::write(dir.join("override.conf"), "client_max_body_size 1g;").unwrap();

    let config = ScanConfig {
        roots: vec![root.path().to_path_buf()],
        override_dir: Some(override_dir.path().to_path_buf()),
        socket_permissions: None,
    };
    let hosts = scan(&config);

    let expected = override_dir.path().join("app1.conf");
    assert_eq!(hosts[&VhostName::from("app1")].overrides, vec![expected.clone()]);
    assert_eq!(
        fs::read_to_string(&expected).unwrap(),
        "client_max_body_size 1g;"
    );
}

#[test]
fn override_publishing_is_idempotent() {
    let root = TempDir::new().unwrap();
    let override_dir = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    fs::write(dir.join("override.conf"), "content").unwrap();

    let config = ScanConfig {
        roots: vec![root.path().to_path_buf()],
        override_dir: Some(override_dir.path().to_path_buf()),
        socket_permissions: None,
    };
    scan(&config);
    let dest = override_dir.path().join("app1.conf");
    let mtime_1 = fs::metadata(&dest).unwrap().modified().unwrap();

    scan(&config);
    let mtime_2 = fs::metadata(&dest).unwrap().modified().unwrap();
    assert_eq!(mtime_2, mtime_1, "unchanged override must not be re-copied");
}

#[test]
fn overrides_without_override_dir_are_not_exposed() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    fs::write(dir.join("override.conf"), "content").unwrap();

    let hosts = scan(&config_for(root.path()));
    assert!(
        hosts[&VhostName::from("app1")].overrides.is_empty(),
        "only published copies appear in the override list"
    );
}

#[test]
fn colliding_final_keys_resolve_last_write_wins() {
    let root = TempDir::new().unwrap();
    let first = make_host_dir(root.path(), "aaa");
    let second = make_host_dir(root.path(), "bbb");
    fs::write(first.join("host.yml"), "host: shared\nname: first\n").unwrap();
    fs::write(second.join("host.yml"), "host: shared\nname: second\n").unwrap();

    let hosts = scan(&config_for(root.path()));

    assert_eq!(hosts.len(), 1);
    // Provisional keys are visited in sorted order, so `bbb` wins.
    assert_eq!(hosts[&VhostName::from("shared")].name, "second");
}

#[test]
fn every_host_carries_a_nonempty_host_config_key() {
    let root = TempDir::new().unwrap();
    for name in ["one", "two", "three"] {
        let dir = make_host_dir(root.path(), name);
        fs::write(dir.join("host.yml"), "x: y\n").unwrap();
    }

    let hosts = scan(&config_for(root.path()));
    assert_eq!(hosts.len(), 3);
    for (key, host) in &hosts {
        let value = host.config.get("host").expect("host key present");
        assert!(!value.is_empty());
        assert_eq!(&VhostName::from(value.as_str()), key);
    }
}

#[test]
fn missing_root_yields_empty_map() {
    let root = TempDir::new().unwrap();
    let config = config_for(&root.path().join("does-not-exist"));
    assert!(scan(&config).is_empty());
}

#[test]
fn multiple_roots_are_merged() {
    let root_a = TempDir::new().unwrap();
    let root_b = TempDir::new().unwrap();
    make_host_dir(root_a.path(), "alpha");
    make_host_dir(root_b.path(), "beta");
    fs::write(root_a.path().join("alpha").join("host.yml"), "a: b\n").unwrap();
    fs::write(root_b.path().join("beta").join("host.yml"), "c: d\n").unwrap();

    let config = ScanConfig {
        roots: vec![root_a.path().to_path_buf(), root_b.path().to_path_buf()],
        override_dir: None,
        socket_permissions: None,
    };
    let hosts = scan(&config);
    assert!(hosts.contains_key(&VhostName::from("alpha")));
    assert!(hosts.contains_key(&VhostName::from("beta")));
}

#[test]
fn files_directly_under_the_root_are_ignored() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("stray.txt"), "noise").unwrap();
    make_host_dir(root.path(), "app1");
    fs::write(root.path().join("app1").join("host.yml"), "k: v\n").unwrap();

    let hosts = scan(&config_for(root.path()));
    assert_eq!(hosts.len(), 1);
    assert!(hosts.contains_key(&VhostName::from("app1")));
}

#[test]
fn socket_permissions_are_widened_additively() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    let (sock, _listener) = bind_socket(&dir);
    fs::set_permissions(&sock, fs::Permissions::from_mode(0o600)).unwrap();

    let config = ScanConfig {
        roots: vec![root.path().to_path_buf()],
        override_dir: None,
        socket_permissions: Some(0o066),
    };
    scan(&config);

    let mode = fs::metadata(&sock).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o666, "override bits added, owner bits kept");
}

#[test]
fn satisfied_socket_permissions_are_left_alone() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    let (sock, _listener) = bind_socket(&dir);
    fs::set_permissions(&sock, fs::Permissions::from_mode(0o666)).unwrap();

    let config = ScanConfig {
        roots: vec![root.path().to_path_buf()],
        override_dir: None,
        socket_permissions: Some(0o066),
    };
    scan(&config);

    let mode = fs::metadata(&sock).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o666);
}

#[test]
fn config_map_round_trips_through_host() {
    let root = TempDir::new().unwrap();
    let dir = make_host_dir(root.path(), "app1");
    fs::write(
        dir.join("host.yml"),
        "host: app1\nname: My App\nport: '3000'\nscheme: https\n",
    )
    .unwrap();

    let hosts = scan(&config_for(root.path()));
    let expected: BTreeMap<String, String> = [
        ("host", "app1"),
        ("name", "My App"),
        ("port", "3000"),
        ("scheme", "https"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(hosts[&VhostName::from("app1")].config, expected);
}
