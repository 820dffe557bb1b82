pub mod course;
pub mod enrollment;
pub mod instructor;
pub mod money;
pub mod progress;
pub mod review;
pub mod subject;
pub mod user;
