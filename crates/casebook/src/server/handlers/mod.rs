pub mod cases;
pub mod logs;
pub mod status;
