pub mod child;
pub mod exec;
pub mod pipe;
pub mod status;
