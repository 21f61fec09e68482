use fake::Fake;
use fake::faker::address::en::{CityName, StreetName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::models::{ClassSeed, SEED_DOMAIN, SchoolSeed};

const BATCH_SIZE: usize = 500;

pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|i| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            SchoolSeed {
                name: format!("{} Academy {}", city, i + 1),
                address: format!("{} {}, {}", (1u16..999).fake::<u16>(), street, city),
                email: format!("office{}@{}", i + 1, SEED_DOMAIN),
                latitude: (-60.0f64..60.0).fake(),
                longitude: (-170.0f64..170.0).fake(),
            }
        })
        .collect()
}

pub fn generate_classes(school_ids: &[Uuid], per_school: usize) -> Vec<ClassSeed> {
    school_ids
        .par_iter()
        .flat_map(|&school_id| {
            (0..per_school)
                .map(|i| ClassSeed {
                    name: format!("Grade {}", i + 1),
                    school_id,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_schools(db: &PgPool, count: usize) -> anyhow::Result<Vec<Uuid>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} schools...", count);

    let schools = generate_schools(count);
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(schools.len());
    for chunk in schools.chunks(BATCH_SIZE) {
        ids.extend(insert_schools_chunk(&mut tx, chunk).await?);
    }
    tx.commit().await?;

    println!("   ✓ Inserted {} schools in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}

async fn insert_schools_chunk(
    tx: &mut Transaction<'_, Postgres>,
    schools: &[SchoolSeed],
) -> anyhow::Result<Vec<Uuid>> {
    let names: Vec<&str> = schools.iter().map(|s| s.name.as_str()).collect();
    let addresses: Vec<&str> = schools.iter().map(|s| s.address.as_str()).collect();
    let emails: Vec<&str> = schools.iter().map(|s| s.email.as_str()).collect();
    let latitudes: Vec<f64> = schools.iter().map(|s| s.latitude).collect();
    let longitudes: Vec<f64> = schools.iter().map(|s| s.longitude).collect();

    let ids = sqlx::query_scalar(
        "INSERT INTO schools (name, address, email, latitude, longitude)
         SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::float8[], $5::float8[])
         RETURNING id",
    )
    .bind(&names)
    .bind(&addresses)
    .bind(&emails)
    .bind(&latitudes)
    .bind(&longitudes)
    .fetch_all(&mut **tx)
    .await?;

    Ok(ids)
}

/// Returns `(class_id, school_id)` pairs in insertion order.
pub async fn seed_classes(
    db: &PgPool,
    school_ids: &[Uuid],
    per_school: usize,
) -> anyhow::Result<Vec<(Uuid, Uuid)>> {
    let start_time = Instant::now();
    let classes = generate_classes(school_ids, per_school);
    println!("📚 Seeding {} classes ({} per school)...", classes.len(), per_school);

    let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
    let schools: Vec<Uuid> = classes.iter().map(|c| c.school_id).collect();

    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "INSERT INTO classes (name, school_id)
         SELECT * FROM UNNEST($1::text[], $2::uuid[])
         RETURNING id, school_id",
    )
    .bind(&names)
    .bind(&schools)
    .fetch_all(db)
    .await?;

    println!("   ✓ Inserted {} classes in {:?}", rows.len(), start_time.elapsed());
    Ok(rows)
}

pub async fn clear_schools(db: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM schools WHERE email LIKE ('%@' || $1)")
        .bind(SEED_DOMAIN)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
