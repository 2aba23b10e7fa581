use golf_persistence_sqlite::{create_db_pool, migrate};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var not set");

    let pool = create_db_pool(&database_url)
        .await
        .expect("Failed to create pool");
    migrate(&pool).await.expect("Failed to create tables");

    println!("Created tables in [{}]", database_url);
}
