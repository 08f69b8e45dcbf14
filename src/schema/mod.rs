pub mod channel;
pub mod condition;
pub mod event;
pub mod intent;
pub mod presentation;
pub mod rule;
