use gotagger::boundary::BoundaryWarning;

#[test]
fn test_boundary_warning_no_new_commits_display() {
    let warning = BoundaryWarning::NoNewCommits {
        latest_tag: "v1.0.0".to_string(),
        current_commit_hash: "abc1234def5678".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("No new commits"),
        "Message should contain 'No new commits', got: {}",
        display_msg
    );
    assert!(display_msg.contains("v1.0.0"));
    assert!(
        display_msg.contains("abc1234") && !display_msg.contains("abc1234d"),
        "Message should contain shortened commit hash 'abc1234', got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_short_hash_kept() {
    let warning = BoundaryWarning::NoNewCommits {
        latest_tag: "bar/v0.1.0".to_string(),
        current_commit_hash: "abc".to_string(),
    };
    assert!(warning.to_string().contains("(current: abc)"));
}

#[test]
fn test_boundary_warning_unparsable_tag_display() {
    let warning = BoundaryWarning::UnparsableTag {
        tag: "vnext".to_string(),
        reason: "not a semantic version".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(display_msg.contains("Cannot parse tag"));
    assert!(display_msg.contains("vnext"));
    assert!(display_msg.contains("not a semantic version"));
}

#[test]
fn test_boundary_warning_incompatible_tag_display() {
    let warning = BoundaryWarning::IncompatibleTag {
        tag: "v3.0.0".to_string(),
        module: "foo/v2".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(display_msg.contains("v3.0.0"));
    assert!(display_msg.contains("foo/v2"));
}

#[test]
fn test_boundary_warning_dirty_worktree_display() {
    let warning = BoundaryWarning::DirtyWorktree {
        increment: "minor".to_string(),
    };
    assert!(warning.to_string().contains("minor increment"));
}

#[test]
fn test_boundary_warning_paths_ignored_display() {
    let warning = BoundaryWarning::PathsIgnored {
        paths: vec!["api".to_string(), "web".to_string()],
    };
    assert!(warning.to_string().contains("api, web"));
}

#[test]
fn test_boundary_warning_emit_without_subscriber() {
    // with no subscriber installed emitting is a no-op
    BoundaryWarning::DirtyWorktree {
        increment: "patch".to_string(),
    }
    .emit();
}
