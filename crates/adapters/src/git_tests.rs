// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn porcelain_output_maps_branches_to_paths() {
    let porcelain = "\
worktree /repo/acme
HEAD 1111111111111111111111111111111111111111
branch refs/heads/main

worktree /home/u/.conductor/acme/tokyo
HEAD 2222222222222222222222222222222222222222
branch refs/heads/feat/x

worktree /home/u/.conductor/acme/detached
HEAD 3333333333333333333333333333333333333333
detached
";
    let map = parse_worktree_list(porcelain);
    assert_eq!(map.len(), 2);
    assert_eq!(map["main"], PathBuf::from("/repo/acme"));
    assert_eq!(
        map["feat/x"],
        PathBuf::from("/home/u/.conductor/acme/tokyo")
    );
}

#[test]
fn porcelain_empty_input_yields_empty_map() {
    assert!(parse_worktree_list("").is_empty());
}

#[parameterized(
    ssh = { "git@github.com:acme/svc.git", Some(("acme", "svc")) },
    https = { "https://github.com/acme/svc", Some(("acme", "svc")) },
    https_dot_git = { "https://github.com/acme/svc.git", Some(("acme", "svc")) },
    ssh_scheme = { "ssh://git@github.com/acme/svc.git", Some(("acme", "svc")) },
    gitlab = { "git@gitlab.com:acme/svc.git", None },
    nested = { "https://github.com/acme/group/svc", None },
    bare = { "https://github.com/acme", None },
)]
fn github_remote_parsing(url: &str, expected: Option<(&str, &str)>) {
    let parsed = parse_github_remote(url);
    let expected = expected.map(|(o, r)| (o.to_string(), r.to_string()));
    assert_eq!(parsed, expected);
}
