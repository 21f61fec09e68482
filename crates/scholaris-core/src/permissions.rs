//! Permission constants and the static role to permission table.
//!
//! Permissions are embedded in access tokens at login, so handlers check them
//! without touching the database:
//!
//! ```ignore
//! use scholaris_core::permissions;
//!
//! if auth_user.has_permission(permissions::HOSTEL_WRITE) {
//!     // allocate a room
//! }
//! ```
//!
//! Role names match the `user_role` Postgres enum.

// =============================================================================
// Tenancy and people
// =============================================================================

pub const SCHOOLS_MANAGE: &str = "schools:manage";
pub const USERS_READ: &str = "users:read";
pub const USERS_WRITE: &str = "users:write";
pub const STUDENTS_READ: &str = "students:read";
pub const STUDENTS_WRITE: &str = "students:write";
pub const TEACHERS_READ: &str = "teachers:read";
pub const TEACHERS_WRITE: &str = "teachers:write";

// =============================================================================
// Academics
// =============================================================================

pub const CLASSES_READ: &str = "classes:read";
pub const CLASSES_WRITE: &str = "classes:write";
pub const ATTENDANCE_READ: &str = "attendance:read";
pub const ATTENDANCE_MARK: &str = "attendance:mark";
pub const ATTENDANCE_CHECK_IN: &str = "attendance:check_in";
pub const EXAMS_READ: &str = "exams:read";
pub const EXAMS_WRITE: &str = "exams:write";
pub const RESULTS_WRITE: &str = "results:write";
pub const CONTENTS_READ: &str = "contents:read";
pub const CONTENTS_WRITE: &str = "contents:write";
pub const CERTIFICATES_READ: &str = "certificates:read";
pub const CERTIFICATES_WRITE: &str = "certificates:write";

// =============================================================================
// Facilities
// =============================================================================

pub const LIBRARY_READ: &str = "library:read";
pub const LIBRARY_WRITE: &str = "library:write";
pub const HOSTEL_READ: &str = "hostel:read";
pub const HOSTEL_WRITE: &str = "hostel:write";
pub const INVENTORY_READ: &str = "inventory:read";
pub const INVENTORY_WRITE: &str = "inventory:write";
pub const TRANSPORT_READ: &str = "transport:read";
pub const TRANSPORT_WRITE: &str = "transport:write";

// =============================================================================
// Communication
// =============================================================================

pub const MESSAGES_SEND: &str = "messages:send";
pub const BROADCAST_SEND: &str = "broadcast:send";
pub const NOTICES_READ: &str = "notices:read";
pub const NOTICES_WRITE: &str = "notices:write";

// =============================================================================
// Leave workflow
// =============================================================================

pub const LEAVES_READ: &str = "leaves:read";
pub const LEAVES_REQUEST: &str = "leaves:request";
pub const LEAVES_PARENT_DECIDE: &str = "leaves:parent_decide";
pub const LEAVES_SCHOOL_DECIDE: &str = "leaves:school_decide";
pub const GATE_PASSES_VERIFY: &str = "gate_passes:verify";

// =============================================================================
// E-learning radio, uploads, finance
// =============================================================================

pub const RADIO_READ: &str = "radio:read";
pub const RADIO_WRITE: &str = "radio:write";
pub const UPLOADS_WRITE: &str = "uploads:write";
pub const TALLY_ACCESS: &str = "tally:access";

const SCHOOL_ADMIN: &[&str] = &[
    USERS_READ,
    USERS_WRITE,
    STUDENTS_READ,
    STUDENTS_WRITE,
    TEACHERS_READ,
    TEACHERS_WRITE,
    CLASSES_READ,
    CLASSES_WRITE,
    ATTENDANCE_READ,
    ATTENDANCE_MARK,
    ATTENDANCE_CHECK_IN,
    EXAMS_READ,
    EXAMS_WRITE,
    RESULTS_WRITE,
    CONTENTS_READ,
    CONTENTS_WRITE,
    CERTIFICATES_READ,
    CERTIFICATES_WRITE,
    LIBRARY_READ,
    LIBRARY_WRITE,
    HOSTEL_READ,
    HOSTEL_WRITE,
    INVENTORY_READ,
    INVENTORY_WRITE,
    TRANSPORT_READ,
    TRANSPORT_WRITE,
    MESSAGES_SEND,
    BROADCAST_SEND,
    NOTICES_READ,
    NOTICES_WRITE,
    LEAVES_READ,
    LEAVES_SCHOOL_DECIDE,
    GATE_PASSES_VERIFY,
    RADIO_READ,
    RADIO_WRITE,
    UPLOADS_WRITE,
    TALLY_ACCESS,
];

const TEACHER: &[&str] = &[
    STUDENTS_READ,
    TEACHERS_READ,
    CLASSES_READ,
    ATTENDANCE_READ,
    ATTENDANCE_MARK,
    ATTENDANCE_CHECK_IN,
    EXAMS_READ,
    EXAMS_WRITE,
    RESULTS_WRITE,
    CONTENTS_READ,
    CONTENTS_WRITE,
    CERTIFICATES_READ,
    LIBRARY_READ,
    HOSTEL_READ,
    TRANSPORT_READ,
    MESSAGES_SEND,
    BROADCAST_SEND,
    NOTICES_READ,
    LEAVES_READ,
    RADIO_READ,
    RADIO_WRITE,
    UPLOADS_WRITE,
];

const STAFF: &[&str] = &[
    STUDENTS_READ,
    CLASSES_READ,
    ATTENDANCE_CHECK_IN,
    LIBRARY_READ,
    LIBRARY_WRITE,
    HOSTEL_READ,
    HOSTEL_WRITE,
    INVENTORY_READ,
    INVENTORY_WRITE,
    TRANSPORT_READ,
    TRANSPORT_WRITE,
    MESSAGES_SEND,
    NOTICES_READ,
    GATE_PASSES_VERIFY,
    UPLOADS_WRITE,
];

const STUDENT: &[&str] = &[
    CLASSES_READ,
    ATTENDANCE_READ,
    EXAMS_READ,
    CONTENTS_READ,
    CERTIFICATES_READ,
    LIBRARY_READ,
    MESSAGES_SEND,
    NOTICES_READ,
    LEAVES_READ,
    LEAVES_REQUEST,
    RADIO_READ,
    UPLOADS_WRITE,
];

const PARENT: &[&str] = &[
    ATTENDANCE_READ,
    EXAMS_READ,
    CONTENTS_READ,
    CERTIFICATES_READ,
    MESSAGES_SEND,
    NOTICES_READ,
    LEAVES_READ,
    LEAVES_REQUEST,
    LEAVES_PARENT_DECIDE,
    RADIO_READ,
];

/// Returns the permissions granted to a role name.
///
/// The global `admin` role gets every school-admin permission plus
/// [`SCHOOLS_MANAGE`]. Unknown roles get nothing.
#[must_use]
pub fn permissions_for_role(role: &str) -> Vec<String> {
    let granted: &[&str] = match role {
        "admin" | "school_admin" => SCHOOL_ADMIN,
        "teacher" => TEACHER,
        "staff" => STAFF,
        "student" => STUDENT,
        "parent" => PARENT,
        _ => &[],
    };

    let mut permissions: Vec<String> = granted.iter().map(|p| (*p).to_string()).collect();
    if role == "admin" {
        permissions.push(SCHOOLS_MANAGE.to_string());
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_manages_schools() {
        assert!(permissions_for_role("admin").contains(&SCHOOLS_MANAGE.to_string()));
        for role in ["school_admin", "teacher", "staff", "student", "parent"] {
            assert!(!permissions_for_role(role).contains(&SCHOOLS_MANAGE.to_string()));
        }
    }

    #[test]
    fn test_leave_decisions_are_split() {
        let parent = permissions_for_role("parent");
        let school_admin = permissions_for_role("school_admin");
        assert!(parent.contains(&LEAVES_PARENT_DECIDE.to_string()));
        assert!(!parent.contains(&LEAVES_SCHOOL_DECIDE.to_string()));
        assert!(school_admin.contains(&LEAVES_SCHOOL_DECIDE.to_string()));
        assert!(!school_admin.contains(&LEAVES_PARENT_DECIDE.to_string()));
    }

    #[test]
    fn test_unknown_role_has_no_permissions() {
        assert!(permissions_for_role("janitor").is_empty());
    }

    #[test]
    fn test_students_cannot_write_inventory() {
        assert!(!permissions_for_role("student").contains(&INVENTORY_WRITE.to_string()));
        assert!(permissions_for_role("staff").contains(&INVENTORY_WRITE.to_string()));
    }
}
