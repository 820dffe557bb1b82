pub mod instructor;
pub mod user;
