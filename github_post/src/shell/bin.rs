// Binary entry point for github-post
// This is a thin wrapper that delegates to the library implementation

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = github_post::shell::run().await {
        eprintln!("github-post fatal error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
