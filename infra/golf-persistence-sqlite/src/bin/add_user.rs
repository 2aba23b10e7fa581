use golf_handicap_app::domain::{UserId, user::User};
use golf_persistence_sqlite::{create_db_pool, users::SqliteUserRepository};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: add_user <display name>");
        std::process::exit(1);
    }

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var not set");
    let pool = create_db_pool(&database_url)
        .await
        .expect("Failed to create pool");

    let user = User::new(UserId::new(), args[1].as_str());
    SqliteUserRepository::new(pool)
        .create_user(&user)
        .await
        .expect("Failed to insert new user");

    println!("Created user [{}] with id [{}]", user.display_name, user.id);
}
