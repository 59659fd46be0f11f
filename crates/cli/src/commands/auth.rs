//! Session commands: register, login, logout, whoami.

use dishly_client::{AppError, AppState};

pub async fn register(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    state.session().register(email, password).await?;
    println!("Account created for {email}. Log in with `dishly login`.");
    Ok(())
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(), AppError> {
    let user = state.session().login(email, password).await?;
    println!("Logged in as {}", user.email);
    Ok(())
}

pub fn logout(state: &AppState) -> Result<(), AppError> {
    state.session().logout()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(state: &AppState) -> Result<(), AppError> {
    match state.session().user() {
        Some(user) => {
            println!("{} ({})", user.email, user.role);
            if let Some(phone) = &user.phone {
                println!("Phone:   {phone}");
            }
            if let Some(address) = &user.address {
                println!("Address: {address}");
            }
        }
        None => println!("Not logged in."),
    }
    Ok(())
}
