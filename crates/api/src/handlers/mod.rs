pub mod account;
pub mod lifecycle;
pub mod project;
pub mod vocabulary;
