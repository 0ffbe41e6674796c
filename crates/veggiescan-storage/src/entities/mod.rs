pub mod scan_record;
pub mod user;
