use serde::Serialize;

use crate::store::{Store, current_version};

use super::init_store;

#[derive(Serialize)]
struct StoreStatus {
    schema_version: i64,
    accounts: i64,
    categories: i64,
    posts: i64,
    comments: i64,
    ai_configs: i64,
}

pub fn run_status(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let schema_version = current_version(&store.connection())?;
    let counts = store.counts()?;

    let status = StoreStatus {
        schema_version,
        accounts: counts.accounts,
        categories: counts.categories,
        posts: counts.posts,
        comments: counts.comments,
        ai_configs: counts.ai_configs,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!();
        println!("Pressbase Store Status");
        println!("{}", "─".repeat(22));
        println!("Schema version: {}", status.schema_version);
        println!("Accounts:       {}", status.accounts);
        println!("Categories:     {}", status.categories);
        println!("Posts:          {}", status.posts);
        println!("Comments:       {}", status.comments);
        println!("AI configs:     {}", status.ai_configs);
        println!();
    }

    Ok(())
}
