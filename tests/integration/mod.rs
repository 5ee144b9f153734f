//! Integration tests for the bookmark tree controller and its stores

mod chromium_store;
mod cli_contracts;
mod controller_flow;
mod support;
