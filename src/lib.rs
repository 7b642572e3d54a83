// Library root
// -----------
// A blocking client for the Beeminder API plus the terminal navigator built
// on top of it. The binary (`main.rs`) wires configuration, logging and the
// terminal together.
//
// Module responsibilities:
// - `models`: typed Goal/Datapoint/User records and their JSON conversions.
// - `api`: HTTP calls against the Beeminder endpoints.
// - `config` / `error`: explicit client configuration and the error taxonomy.
// - `app`: the list/detail state machine, free of I/O.
// - `render`: turns the state into screen rows.
// - `ui`: the event loop that performs API calls and prompts.
// - `terminal`: crossterm/dialoguer implementation of the loop's console.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod terminal;
pub mod ui;

pub use api::{ApiClient, DatapointQuery, GoalsApi};
pub use config::Config;
pub use error::BeeminderError;
pub use models::{Datapoint, DatapointBatch, Goal, NewDatapoint, User};
