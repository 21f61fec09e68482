use uuid::Uuid;

/// Every seeded school and user gets an address under this domain so
/// `clear-seed` never touches real accounts.
pub const SEED_DOMAIN: &str = "seed.scholaris.test";

pub const SEED_PASSWORD: &str = "Password@123";

pub struct SchoolSeed {
    pub name: String,
    pub address: String,
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
}

pub struct ClassSeed {
    pub name: String,
    pub school_id: Uuid,
}

pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: &'static str,
    pub school_id: Uuid,
    pub class_id: Option<Uuid>,
    pub roll_number: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub schools: usize,
    pub classes_per_school: usize,
    pub admins_per_school: usize,
    pub teachers_per_school: usize,
    pub staff_per_school: usize,
    pub students_per_class: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            schools: 3,
            classes_per_school: 6,
            admins_per_school: 1,
            teachers_per_school: 8,
            staff_per_school: 3,
            students_per_class: 25,
        }
    }
}

impl SeedConfig {
    pub fn staff_per_school(&self) -> usize {
        self.admins_per_school + self.teachers_per_school + self.staff_per_school
    }

    /// Students plus one parent each.
    pub fn families_per_school(&self) -> usize {
        self.classes_per_school * self.students_per_class
    }

    pub fn total_users(&self) -> usize {
        self.schools * (self.staff_per_school() + 2 * self.families_per_school())
    }
}
