use serde::Deserialize;
use serde_json::json;
use slintmodel::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let orm = OrmStruct::connect(ConnectionConfig::from_env()).await?;

    let users = orm
        .define(
            "users",
            [
                ("name", AttributeDefinition::new(DataType::String).required()),
                ("email", AttributeDefinition::new(DataType::String).required()),
                ("age", AttributeDefinition::new(DataType::Integer)),
            ],
            DeclareOptions {
                sync: SyncOptions {
                    enabled: true,
                    force: true,
                },
                ..Default::default()
            },
        )
        .await?;

    let ada = users
        .create(&json!({"name": "Ada", "email": "ada@mail.com", "age": 36}))
        .await?;
    users
        .create(&json!({"name": "Grace", "email": "grace@mail.com", "age": "45"}))
        .await?;
    println!("created {:?}", ada);

    let found: Option<User> = users
        .find_one_as(FindParams::new().r#where(json!({"email": "ada@mail.com"})))
        .await?;
    println!("{:?}", found);

    users
        .update(&json!({"id": ada["id"], "name": "Ada Lovelace"}))
        .await?;
    users.delete(ada["id"].clone()).await?;

    let remaining: Vec<User> = users
        .find_all_as(
            FindParams::new()
                .raw_where("age > 18")
                .sort_by(SortBy::asc("name")),
        )
        .await?;
    println!("All users: {:?}", remaining);

    if let Err(err) = users.create(&json!({"name": "Bad", "age": "old"})).await {
        println!("{} ({})", err, err.status_code());
    }

    Ok(())
}
