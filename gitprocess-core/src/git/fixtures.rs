//! Scratch repositories for tests

use git2::{Commit, Oid, Repository, Signature};
use tempfile::TempDir;

/// Create a commit with an empty tree and point `update_ref` at it
pub(crate) fn commit(repo: &Repository, update_ref: &str, parents: &[Oid], message: &str) -> Oid {
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parents: Vec<Commit> = parents
        .iter()
        .map(|id| repo.find_commit(*id).unwrap())
        .collect();
    let parent_refs: Vec<&Commit> = parents.iter().collect();

    repo.commit(Some(update_ref), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// A repository with `main` and a `develop` branch one commit ahead of it
pub(crate) struct Origin {
    pub dir: TempDir,
    pub repo: Repository,
    pub root: Oid,
    pub develop: Oid,
}

impl Origin {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let root = commit(&repo, "refs/heads/main", &[], "initial commit");
        let develop = commit(&repo, "refs/heads/develop", &[root], "develop work");
        repo.set_head("refs/heads/main").unwrap();

        Self {
            dir,
            repo,
            root,
            develop,
        }
    }

    /// Location usable as a clone URL
    pub(crate) fn url(&self) -> String {
        self.dir.path().to_string_lossy().to_string()
    }
}
