use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

use super::models::{SEED_DOMAIN, SeedConfig, UserSeed};

const BATCH_SIZE: usize = 1000;

fn seed_email(first: &str, last: &str, tag: &str, school_idx: usize, n: usize) -> String {
    format!(
        "{}.{}.{}{}.{}@{}",
        first.to_lowercase(),
        last.to_lowercase(),
        tag,
        school_idx,
        n,
        SEED_DOMAIN
    )
    .replace(['\'', ' '], "")
}

fn person(
    role: &'static str,
    tag: &str,
    school_idx: usize,
    n: usize,
    school_id: Uuid,
) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();
    UserSeed {
        email: seed_email(&first_name, &last_name, tag, school_idx, n),
        first_name,
        last_name,
        role,
        school_id,
        class_id: None,
        roll_number: None,
        parent_id: None,
    }
}

/// School admins, teachers and non-teaching staff for every school.
pub fn generate_staff(school_ids: &[Uuid], config: &SeedConfig) -> Vec<UserSeed> {
    school_ids
        .par_iter()
        .enumerate()
        .flat_map(|(school_idx, &school_id)| {
            let roles = std::iter::repeat_n(("school_admin", "a"), config.admins_per_school)
                .chain(std::iter::repeat_n(("teacher", "t"), config.teachers_per_school))
                .chain(std::iter::repeat_n(("staff", "s"), config.staff_per_school));
            roles
                .enumerate()
                .map(|(n, (role, tag))| person(role, tag, school_idx, n, school_id))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// One parent per student; the parent shares the student's last name.
pub fn generate_parents(classes: &[(Uuid, Uuid)], students_per_class: usize) -> Vec<UserSeed> {
    classes
        .par_iter()
        .enumerate()
        .flat_map(|(class_idx, &(_, school_id))| {
            (0..students_per_class)
                .map(|n| person("parent", "p", class_idx, n, school_id))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Students in class order, each linked to the parent at the same index.
pub fn generate_students(
    classes: &[(Uuid, Uuid)],
    students_per_class: usize,
    parents: &[(Uuid, String)],
) -> Vec<UserSeed> {
    classes
        .par_iter()
        .enumerate()
        .flat_map(|(class_idx, &(class_id, school_id))| {
            (0..students_per_class)
                .map(|n| {
                    let parent = parents.get(class_idx * students_per_class + n);
                    let first_name: String = FirstName().fake();
                    let last_name = parent
                        .map(|(_, last)| last.clone())
                        .unwrap_or_else(|| LastName().fake());
                    UserSeed {
                        email: seed_email(&first_name, &last_name, "st", class_idx, n),
                        first_name,
                        last_name,
                        role: "student",
                        school_id,
                        class_id: Some(class_id),
                        roll_number: Some(format!("{:03}", n + 1)),
                        parent_id: parent.map(|(id, _)| *id),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Inserts users in batches and returns `(id, last_name)` in input order.
pub async fn insert_users(
    db: &PgPool,
    users: &[UserSeed],
    password_hash: &str,
) -> anyhow::Result<Vec<(Uuid, String)>> {
    let start_time = Instant::now();
    let mut tx = db.begin().await?;
    let mut inserted = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        inserted.extend(insert_users_chunk(&mut tx, chunk, password_hash).await?);
    }

    tx.commit().await?;
    println!(
        "   ✓ Inserted {} users in {:?}",
        inserted.len(),
        start_time.elapsed()
    );
    Ok(inserted)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
    password_hash: &str,
) -> anyhow::Result<Vec<(Uuid, String)>> {
    let first: Vec<&str> = users.iter().map(|u| u.first_name.as_str()).collect();
    let last: Vec<&str> = users.iter().map(|u| u.last_name.as_str()).collect();
    let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
    let roles: Vec<&str> = users.iter().map(|u| u.role).collect();
    let schools: Vec<Uuid> = users.iter().map(|u| u.school_id).collect();
    let classes: Vec<Option<Uuid>> = users.iter().map(|u| u.class_id).collect();
    let rolls: Vec<Option<&str>> = users.iter().map(|u| u.roll_number.as_deref()).collect();
    let parents: Vec<Option<Uuid>> = users.iter().map(|u| u.parent_id).collect();

    let rows: Vec<(Uuid, String, String)> = sqlx::query_as(
        "INSERT INTO users (first_name, last_name, email, password, role, school_id,
                            class_id, roll_number, parent_id)
         SELECT f, l, e, $4, r::user_role, s, c, rn, p
         FROM UNNEST($1::text[], $2::text[], $3::text[], $5::text[], $6::uuid[],
                     $7::uuid[], $8::text[], $9::uuid[])
              AS t(f, l, e, r, s, c, rn, p)
         RETURNING id, email, last_name",
    )
    .bind(&first)
    .bind(&last)
    .bind(&emails)
    .bind(password_hash)
    .bind(&roles)
    .bind(&schools)
    .bind(&classes)
    .bind(&rolls)
    .bind(&parents)
    .fetch_all(&mut **tx)
    .await?;

    // RETURNING order is not guaranteed; map back through the unique email.
    let mut by_email: HashMap<String, (Uuid, String)> = rows
        .into_iter()
        .map(|(id, email, last)| (email, (id, last)))
        .collect();

    users
        .iter()
        .map(|u| {
            by_email
                .remove(&u.email)
                .ok_or_else(|| anyhow::anyhow!("seeded user {} was not inserted", u.email))
        })
        .collect()
}

pub async fn clear_users(db: &PgPool) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE role <> 'admin' AND email LIKE ('%@' || $1)")
        .bind(SEED_DOMAIN)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_roles_per_school() {
        let config = SeedConfig {
            schools: 1,
            classes_per_school: 1,
            admins_per_school: 1,
            teachers_per_school: 3,
            staff_per_school: 2,
            students_per_class: 1,
        };
        let staff = generate_staff(&[Uuid::new_v4()], &config);
        assert_eq!(staff.len(), 6);
        assert_eq!(staff.iter().filter(|u| u.role == "teacher").count(), 3);
        assert_eq!(staff.iter().filter(|u| u.role == "school_admin").count(), 1);
    }

    #[test]
    fn test_students_link_to_parents_and_classes() {
        let school = Uuid::new_v4();
        let classes = vec![(Uuid::new_v4(), school), (Uuid::new_v4(), school)];
        let parents: Vec<(Uuid, String)> =
            (0..4).map(|i| (Uuid::new_v4(), format!("Family{i}"))).collect();

        let students = generate_students(&classes, 2, &parents);
        assert_eq!(students.len(), 4);
        assert_eq!(students[2].class_id, Some(classes[1].0));
        assert_eq!(students[2].parent_id, Some(parents[2].0));
        assert_eq!(students[2].last_name, "Family2");
        assert_eq!(students[3].roll_number.as_deref(), Some("002"));
    }

    #[test]
    fn test_seed_emails_are_unique_and_clean() {
        let email = seed_email("Mary Ann", "O'Neil", "t", 3, 7);
        assert_eq!(email, format!("maryann.oneil.t3.7@{}", SEED_DOMAIN));
    }
}
