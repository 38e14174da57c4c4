use mongodb::bson::doc;
use mongodb::error::Error;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};

use crate::models::user::UserModel;

pub async fn init_db(uri: &str) -> Result<Client, Error> {
    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.app_name = Some("AnonBox".to_string());
    Client::with_options(client_options)
}

/// Creates the unique indexes backing username/email uniqueness. Safe to call
/// on every start; MongoDB ignores indexes that already exist.
pub async fn ensure_indexes(collection: &Collection<UserModel>) -> Result<(), Error> {
    let unique = || IndexOptions::builder().unique(true).build();
    let indexes = vec![
        IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(unique())
            .build(),
        IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique())
            .build(),
    ];
    collection.create_indexes(indexes, None).await?;
    Ok(())
}
