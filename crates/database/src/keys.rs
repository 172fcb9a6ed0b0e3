//! Partition/row key derivation for the table store.
//!
//! Keys are built by joining identifiers with `_`. They are never split back
//! apart: anything that needs a key rebuilds it from the original identifiers
//! with the same builder.

const SEPARATOR: &str = "_";

/// Characters the table backend refuses in a partition key.
fn is_disallowed(c: char) -> bool {
    matches!(c, '/' | '\\' | '#' | '?') || c.is_control()
}

/// Replaces every character the table backend disallows with `_`.
///
/// Applying it twice gives the same result as applying it once.
pub fn encode_key(text: &str) -> String {
    text.chars()
        .map(|c| if is_disallowed(c) { '_' } else { c })
        .collect()
}

/// Turns every `_` back into `/`.
///
/// This is lossy: an identifier that legitimately contained `_` comes back
/// with a `/` in its place. Use it for display only, never to recover the
/// identifiers a key was built from.
pub fn decode_key(text: &str) -> String {
    text.replace(SEPARATOR, "/")
}

fn join(parts: &[&str]) -> String {
    parts.join(SEPARATOR)
}

pub fn azure_devops_build_partition_key(organization: &str, project: &str, build_name: &str) -> String {
    join(&[organization, project, build_name])
}

pub fn azure_devops_pull_request_partition_key(organization: &str, project: &str) -> String {
    join(&[organization, project])
}

pub fn azure_devops_pull_request_commit_partition_key(organization: &str, project: &str) -> String {
    join(&[organization, project])
}

pub fn azure_devops_settings_key(
    organization: &str,
    project: &str,
    repository: &str,
    build_name: &str,
) -> String {
    join(&[organization, project, repository, build_name])
}

pub fn github_run_partition_key(owner: &str, repo: &str, workflow_name: &str) -> String {
    join(&[owner, repo, workflow_name])
}

pub fn github_pull_request_partition_key(owner: &str, repo: &str) -> String {
    join(&[owner, repo])
}

pub fn github_pull_request_commit_partition_key(owner: &str, repo: &str) -> String {
    join(&[owner, repo])
}

pub fn github_settings_key(owner: &str, repo: &str, workflow_name: &str) -> String {
    join(&[owner, repo, workflow_name])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_replaces_slashes() {
        assert_eq!(encode_key("a/b_c"), "a_b_c");
        assert_eq!(encode_key("refs/heads/main"), "refs_heads_main");
        assert_eq!(encode_key("plain"), "plain");
    }

    #[test]
    fn encode_replaces_other_disallowed_characters() {
        assert_eq!(encode_key("a\\b#c?d"), "a_b_c_d");
        assert_eq!(encode_key("tab\there\nnewline"), "tab_here_newline");
        assert_eq!(encode_key("del\u{7f}c1\u{85}"), "del_c1_");
    }

    #[test]
    fn encode_is_idempotent() {
        let once = encode_key("org/project#1");
        assert_eq!(encode_key(&once), once);
    }

    #[test]
    fn decode_is_lossy_for_underscores() {
        assert_eq!(decode_key(&encode_key("a/b")), "a/b");

        // An identifier with a real underscore does not survive the round trip.
        let original = "my_repo/ci";
        assert_eq!(encode_key(original), "my_repo_ci");
        assert_eq!(decode_key(&encode_key(original)), "my/repo/ci");
        assert_ne!(decode_key(&encode_key(original)), original);
    }

    #[test]
    fn builders_join_with_underscores() {
        assert_eq!(
            azure_devops_build_partition_key("contoso", "Web", "Web.CI"),
            "contoso_Web_Web.CI"
        );
        assert_eq!(azure_devops_pull_request_partition_key("contoso", "Web"), "contoso_Web");
        assert_eq!(
            azure_devops_pull_request_commit_partition_key("contoso", "Web"),
            "contoso_Web"
        );
        assert_eq!(
            azure_devops_settings_key("contoso", "Web", "web-app", "Web.CI"),
            "contoso_Web_web-app_Web.CI"
        );
        assert_eq!(github_run_partition_key("octo", "app", "CI"), "octo_app_CI");
        assert_eq!(github_pull_request_partition_key("octo", "app"), "octo_app");
        assert_eq!(github_pull_request_commit_partition_key("octo", "app"), "octo_app");
        assert_eq!(github_settings_key("octo", "app", "CI"), "octo_app_CI");
    }

    #[test]
    fn builders_are_deterministic() {
        let first = github_run_partition_key("octo", "app", "Build and deploy");
        for _ in 0..10 {
            assert_eq!(github_run_partition_key("octo", "app", "Build and deploy"), first);
        }
    }

    #[test]
    fn builders_do_not_validate_empty_inputs() {
        assert_eq!(github_pull_request_partition_key("", ""), "_");
    }
}
