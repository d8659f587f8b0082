use std::path::Path;

use git2::Repository;

pub fn init_repo(path: &Path) -> Result<Repository, String> {
    let repo =
        Repository::init(path).map_err(|err| format!("git init failed for {path:?}: {err}"))?;
    configure_test_repo(&repo)?;
    Ok(repo)
}

pub fn add_origin_remote(repo: &Repository, url: &str) -> Result<(), String> {
    repo.remote("origin", url)
        .map_err(|err| format!("git remote add origin failed: {err}"))?;
    Ok(())
}

fn configure_test_repo(repo: &Repository) -> Result<(), String> {
    let mut cfg = repo
        .config()
        .map_err(|err| format!("open repo config failed: {err}"))?;
    cfg.set_str("user.name", "Test")
        .map_err(|err| format!("set user.name failed: {err}"))?;
    cfg.set_str("user.email", "test@test.com")
        .map_err(|err| format!("set user.email failed: {err}"))?;
    Ok(())
}
