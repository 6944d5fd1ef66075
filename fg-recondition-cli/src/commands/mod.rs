pub mod command;
pub mod recondition;
