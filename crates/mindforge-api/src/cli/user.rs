//! `mindforge user create`.

use crate::http::extractors::auth::issue_api_key;
use crate::state::AppState;

/// Create a user and print their first API key.
pub async fn create_user(state: &AppState, name: &str) -> anyhow::Result<()> {
    let user = state.users.create_user(name).await?;
    let key = issue_api_key(&state.users, &user.id).await?;
    tracing::info!(user_id = %user.id, "user created");

    println!();
    println!("  User '{}' created (id {})", user.name, user.id);
    println!("  API key (save this -- it won't be shown again):");
    println!();
    println!("  {key}");
    println!();
    Ok(())
}
