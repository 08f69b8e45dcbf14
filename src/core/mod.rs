pub mod assembler;
pub mod bidder;
pub mod condition;
pub mod dispatcher;
pub mod location;
pub mod pipeline;
pub mod registry;
pub mod router;
pub mod ruleset;
pub mod scripted;
pub mod template;
pub mod waterfall;
