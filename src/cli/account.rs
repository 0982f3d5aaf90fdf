use std::str::FromStr;

use inquire::{Password, Text};
use serde::Serialize;

use crate::auth::{NewAccount, PasswordHasher, register};
use crate::store::Store;
use crate::types::{AccountPatch, AccountStatus, Role};

use super::init_store;

pub fn run_account_create(
    data_dir: String,
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
    role: String,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let role = Role::from_str(&role)?;

    let email = match email {
        Some(email) => email,
        None if non_interactive => anyhow::bail!("--email is required in non-interactive mode"),
        None => Text::new("Email:").prompt()?,
    };
    let name = match name {
        Some(name) => name,
        None if non_interactive => anyhow::bail!("--name is required in non-interactive mode"),
        None => Text::new("Name:").prompt()?,
    };
    let password = match password {
        Some(password) => password,
        None if non_interactive => anyhow::bail!("--password is required in non-interactive mode"),
        None => Password::new("Password:").prompt()?,
    };

    let hasher = PasswordHasher::new();
    let account = register(&store, &hasher, &NewAccount { email, name, password })?;

    // Operator-created accounts skip the activation queue.
    let account = store.update_account(
        &account.id,
        &AccountPatch {
            role: Some(role),
            status: Some(AccountStatus::Active),
            ..Default::default()
        },
    )?;

    store.close()?;

    println!();
    println!("Created {} account '{}' ({})", account.role, account.email, account.id);
    println!();

    Ok(())
}

pub fn run_account_activate(data_dir: String, email: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let account = store
        .get_account_by_email(&email)?
        .ok_or_else(|| anyhow::anyhow!("No account with email '{email}'"))?;

    if account.status == AccountStatus::Active {
        println!("Account '{email}' is already active.");
        return Ok(());
    }

    store.update_account(
        &account.id,
        &AccountPatch {
            status: Some(AccountStatus::Active),
            ..Default::default()
        },
    )?;

    store.close()?;
    println!("Activated account '{email}'");
    Ok(())
}

pub fn run_account_set_role(data_dir: String, email: String, role: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let role = Role::from_str(&role)?;

    let account = store
        .get_account_by_email(&email)?
        .ok_or_else(|| anyhow::anyhow!("No account with email '{email}'"))?;

    store.update_account(
        &account.id,
        &AccountPatch {
            role: Some(role),
            ..Default::default()
        },
    )?;

    store.close()?;
    println!("Account '{email}' is now {role}");
    Ok(())
}

#[derive(Serialize)]
struct AccountOutput {
    id: String,
    email: String,
    name: String,
    role: Role,
    status: AccountStatus,
    created_at: String,
}

pub fn run_account_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let accounts = store.list_accounts()?;

    if json {
        let outputs: Vec<AccountOutput> = accounts
            .into_iter()
            .map(|a| AccountOutput {
                id: a.id,
                email: a.email,
                name: a.name,
                role: a.role,
                status: a.status,
                created_at: a.created_at.to_rfc3339(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        println!();
        for account in &accounts {
            println!(
                "{:<36}  {:<30}  {:<9}  {}",
                account.id,
                account.email,
                account.role.as_str(),
                account.status.as_str()
            );
        }
        println!();
        println!("{} account(s)", accounts.len());
        println!();
    }

    Ok(())
}
