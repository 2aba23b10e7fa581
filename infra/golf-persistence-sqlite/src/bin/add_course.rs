use std::{collections::HashMap, str::FromStr, time::Duration};

use golf_core::Tee;
use golf_handicap_app::{domain::CourseId, ports::course_lookup::Course};
use golf_persistence_sqlite::{courses::SqliteCourseLookup, create_db_pool};

/// Parses `<tee>:<rating>:<slope>`, e.g. `white:72.1:129`.
fn parse_tee(arg: &str) -> Result<(Tee, f64, f64), String> {
    let parts: Vec<&str> = arg.split(':').collect();
    let [tee, rating, slope] = parts.as_slice() else {
        return Err(format!("expected <tee>:<rating>:<slope>, got '{}'", arg));
    };
    let tee = Tee::from_str(tee).map_err(|e| e.to_string())?;
    let rating = rating
        .parse::<f64>()
        .map_err(|e| format!("invalid rating '{}': {}", rating, e))?;
    let slope = slope
        .parse::<f64>()
        .map_err(|e| format!("invalid slope '{}': {}", slope, e))?;
    if slope <= 0.0 {
        return Err(format!("slope must be positive, got {}", slope));
    }
    Ok((tee, rating, slope))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: add_course <name> <tee>:<rating>:<slope> [<tee>:<rating>:<slope> ...]");
        std::process::exit(1);
    }

    let mut rating = HashMap::new();
    let mut slope = HashMap::new();
    for arg in &args[2..] {
        match parse_tee(arg) {
            Ok((tee, tee_rating, tee_slope)) => {
                rating.insert(tee, tee_rating);
                slope.insert(tee, tee_slope);
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL env var not set");
    let pool = create_db_pool(&database_url)
        .await
        .expect("Failed to create pool");

    let course = Course {
        id: CourseId(uuid::Uuid::new_v4()),
        name: args[1].clone(),
        rating,
        slope,
    };
    SqliteCourseLookup::new(pool, Duration::from_secs(60))
        .create_course(&course)
        .await
        .expect("Failed to insert new course");

    println!("Created course [{}] with id [{}]", course.name, course.id);
}
