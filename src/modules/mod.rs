pub mod attendance;
pub mod auth;
pub mod certificates;
pub mod classes;
pub mod contents;
pub mod exams;
pub mod health;
pub mod hostel;
pub mod inventory;
pub mod leaves;
pub mod library;
pub mod messaging;
pub mod notices;
pub mod radio;
pub mod schools;
pub mod students;
pub mod tally;
pub mod teachers;
pub mod transport;
pub mod uploads;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::users::model::User;
