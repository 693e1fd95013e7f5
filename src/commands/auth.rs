use super::{require_session, CliError};
use crate::core_state::CoreState;

pub async fn login(state: &CoreState, username: &str, password: &str) -> Result<(), CliError> {
    let user = state.client().login(username, password).await?;
    let user = match user {
        Some(user) => user,
        None => state.client().current_user().await?,
    };
    println!("Signed in as {} ({})", user.display_name(), user.role);
    Ok(())
}

pub fn logout(state: &CoreState) -> Result<(), CliError> {
    let was_signed_in = state.session().is_authenticated();
    state.session().logout();
    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

pub async fn whoami(state: &CoreState) -> Result<(), CliError> {
    require_session(state)?;
    let user = state.client().current_user().await?;
    println!("{} <{}> {}", user.display_name(), user.username, user.role);
    Ok(())
}
