//! gatherly_client - command-line front end for the gatherly data layer.

pub mod cli;
pub mod output;
