mod end_to_end;
mod export;
mod fetch;
mod resolver;

pub mod common;
