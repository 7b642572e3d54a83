// UI driver: feeds key presses into the state machine and performs the
// effects it asks for, one blocking API call at a time. Terminal specifics
// live behind `Console` so the loop runs the same against a fake in tests.

use anyhow::Result;

use crate::api::GoalsApi;
use crate::app::{AppState, Effect, Event, Input};
use crate::config::Config;
use crate::error::BeeminderError;
use crate::models;

#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

/// Everything the loop needs from the outside world besides the API.
/// Errors returned here are terminal failures and end the session.
pub trait Console {
    fn draw(&mut self, state: &AppState) -> Result<()>;

    /// Block until the next mapped key (or resize).
    fn next_input(&mut self) -> Result<Input>;

    /// Shown while a blocking call is in flight.
    fn busy(&mut self, message: &str) -> Result<()>;

    /// Ask for a datapoint value. `None` means the user gave up.
    fn prompt_value(&mut self, slug: &str) -> Result<Option<String>>;

    /// Tell the user why `input` was refused before asking again.
    fn reject_value(&mut self, input: &str, reason: &BeeminderError) -> Result<()>;

    /// Optional comment; `None` when left blank.
    fn prompt_comment(&mut self) -> Result<Option<String>>;

    fn open_url(&mut self, url: &str) -> std::io::Result<()>;
}

/// Run until the user quits. Returns the final state.
pub fn run<A, C>(api: &A, console: &mut C, config: &Config) -> Result<AppState>
where
    A: GoalsApi,
    C: Console,
{
    log::info!("starting session for {}", config.resolve_user(None));
    let mut state = AppState::default();
    let mut pending = Some(Effect::FetchGoals);

    loop {
        while let Some(effect) = pending.take() {
            log::debug!("effect {effect:?}");
            let event = perform(api, console, config, effect)?;
            (state, pending) = state.transition(event);
        }
        if !state.running {
            break;
        }

        console.draw(&state)?;
        let input = console.next_input()?;
        (state, pending) = state.transition(Event::Input(input));
    }

    log::info!("session ended");
    Ok(state)
}

fn perform<A, C>(api: &A, console: &mut C, config: &Config, effect: Effect) -> Result<Event>
where
    A: GoalsApi,
    C: Console,
{
    Ok(match effect {
        Effect::FetchGoals => {
            console.busy("Loading goals...")?;
            Event::GoalsLoaded(api.get_all_goals(None))
        }
        Effect::FetchGoal(slug) => {
            console.busy(&format!("Loading {slug}..."))?;
            Event::GoalLoaded(api.get_goal(&slug, None, true))
        }
        Effect::CreateDatapoint(slug) => create_datapoint(api, console, slug)?,
        Effect::OpenBrowser(slug) => open_browser(api, console, config, slug.as_deref())?,
    })
}

/// Input sub-flow. Non-numeric values are refused here and never reach the
/// API client.
fn create_datapoint<A, C>(api: &A, console: &mut C, slug: String) -> Result<Event>
where
    A: GoalsApi,
    C: Console,
{
    let value = loop {
        let Some(input) = console.prompt_value(&slug)? else {
            return Ok(Event::PromptCancelled);
        };
        match models::parse_value(&input) {
            Ok(value) => break value,
            Err(err) => console.reject_value(&input, &err)?,
        }
    };
    let comment = console.prompt_comment()?;

    console.busy(&format!("Adding {value} to {slug}..."))?;
    let result = api.create_datapoint(&slug, value, comment.as_deref(), None, None);
    Ok(Event::DatapointCreated { slug, result })
}

/// The page URL needs a real username; ask the service when none is
/// configured.
fn open_browser<A, C>(api: &A, console: &mut C, config: &Config, slug: Option<&str>) -> Result<Event>
where
    A: GoalsApi,
    C: Console,
{
    let username = match config.username() {
        Some(username) => username.to_string(),
        None => {
            console.busy("Looking up your username...")?;
            match api.get_user(None) {
                Ok(user) => user.username,
                Err(err) => return Ok(Event::UserLookupFailed(err)),
            }
        }
    };

    let url = config.profile_url(&username, slug);
    log::debug!("opening {url}");
    let opened = console.open_url(&url).map(|_| url).map_err(|e| e.to_string());
    Ok(Event::BrowserOpened(opened))
}
