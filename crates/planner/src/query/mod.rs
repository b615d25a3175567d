pub mod page;
pub mod template;
