pub mod admin;
pub mod chat_group;
