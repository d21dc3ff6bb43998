pub mod local;
pub mod mysql;
pub mod s3;
