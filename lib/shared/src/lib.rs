pub mod collection;
pub mod transfer;
