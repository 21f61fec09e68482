//! Fake data for local development.
//!
//! Generation runs on the rayon pool; inserts go through `UNNEST` batches.
//! All seeded rows live under [`models::SEED_DOMAIN`] so they can be cleared
//! without touching real data.
//!
//! ```ignore
//! seed_all(&db, SeedConfig { schools: 5, ..SeedConfig::default() }).await?;
//! ```

pub mod models;
pub mod schools;
pub mod users;

pub use models::SeedConfig;

use bcrypt::hash;
use sqlx::PgPool;
use std::time::Instant;

use models::SEED_PASSWORD;

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> anyhow::Result<()> {
    let start_time = Instant::now();

    println!("🌱 Starting database seeding...");
    println!(
        "   - {} schools, {} classes each, {} students per class",
        config.schools, config.classes_per_school, config.students_per_class
    );

    // One low-cost hash shared by every seeded account.
    let password_hash = hash(SEED_PASSWORD, 4)?;

    let school_ids = schools::seed_schools(db, config.schools).await?;
    let classes = schools::seed_classes(db, &school_ids, config.classes_per_school).await?;

    println!("👥 Seeding staff...");
    let staff = users::generate_staff(&school_ids, &config);
    users::insert_users(db, &staff, &password_hash).await?;

    println!("👪 Seeding parents and students...");
    let parents = users::generate_parents(&classes, config.students_per_class);
    let parent_rows = users::insert_users(db, &parents, &password_hash).await?;
    let students = users::generate_students(&classes, config.students_per_class, &parent_rows);
    users::insert_users(db, &students, &password_hash).await?;

    println!(
        "\n✅ Seeding complete! {} users in {:?}",
        config.total_users(),
        start_time.elapsed()
    );
    println!("📝 Password for all seeded users: {}", SEED_PASSWORD);

    Ok(())
}

pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let users = users::clear_users(db).await?;
    let schools = schools::clear_schools(db).await?;

    println!(
        "✅ Removed {} users and {} schools in {:?}",
        users,
        schools,
        start_time.elapsed()
    );
    Ok(())
}
