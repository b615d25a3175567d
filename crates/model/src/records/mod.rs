pub mod raw;
pub mod record;
pub mod result_set;
