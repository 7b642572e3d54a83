// Terminal interface state machine. `AppState::transition` is a pure
// function from (state, event) to (state, effect); the caller performs the
// effect (API call, prompt, browser) and feeds the outcome back in as the
// next event. No I/O happens here.

use crate::error::BeeminderError;
use crate::models::{Datapoint, Goal};

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;

/// User input, already decoded from raw key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    /// `i`
    Detail,
    /// `b`
    Back,
    /// `r`
    Refresh,
    /// `c`
    Create,
    /// `w`
    Web,
    /// `q`
    Quit,
    /// The terminal changed size; redraw only.
    Resize,
}

#[derive(Debug)]
pub enum Event {
    Input(Input),
    GoalsLoaded(Result<Vec<Goal>, BeeminderError>),
    GoalLoaded(Result<Goal, BeeminderError>),
    DatapointCreated {
        slug: String,
        result: Result<Datapoint, BeeminderError>,
    },
    /// The input sub-flow was abandoned before submission.
    PromptCancelled,
    /// The username needed for a page URL could not be looked up.
    UserLookupFailed(BeeminderError),
    BrowserOpened(Result<String, String>),
}

/// Work the driver must do on behalf of the state machine. Each effect is at
/// most one API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchGoals,
    FetchGoal(String),
    /// Run the input sub-flow and create a datapoint on this goal.
    CreateDatapoint(String),
    /// Open the user's page, or a goal page when a slug is given.
    OpenBrowser(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    List,
    Detail {
        goal: Goal,
        /// Index of the first datapoint shown.
        scroll: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub goals: Vec<Goal>,
    pub selected: usize,
    pub view: View,
    pub status: Option<Status>,
    /// Set once the service rejects the API key; further calls are refused.
    pub credentials_rejected: bool,
    pub running: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            goals: Vec::new(),
            selected: 0,
            view: View::List,
            status: None,
            credentials_rejected: false,
            running: true,
        }
    }
}

impl AppState {
    pub fn selected_goal(&self) -> Option<&Goal> {
        self.goals.get(self.selected)
    }

    pub fn in_detail(&self) -> bool {
        matches!(self.view, View::Detail { .. })
    }

    /// Goal the input sub-flow and browser act on in the current view.
    fn current_slug(&self) -> Option<String> {
        match &self.view {
            View::List => self.selected_goal().map(|g| g.slug.clone()),
            View::Detail { goal, .. } => Some(goal.slug.clone()),
        }
    }

    pub fn transition(mut self, event: Event) -> (AppState, Option<Effect>) {
        let effect = match event {
            Event::Input(input) => self.on_input(input),
            Event::GoalsLoaded(result) => {
                self.on_goals(result);
                None
            }
            Event::GoalLoaded(result) => {
                self.on_goal(result);
                None
            }
            Event::DatapointCreated { slug, result } => self.on_created(slug, result),
            Event::PromptCancelled => {
                self.status = Some(Status::Info("Cancelled".into()));
                None
            }
            Event::UserLookupFailed(err) => {
                self.fail(err);
                None
            }
            Event::BrowserOpened(Ok(url)) => {
                self.status = Some(Status::Info(format!("Opened {url}")));
                None
            }
            Event::BrowserOpened(Err(err)) => {
                self.status = Some(Status::Error(format!("Could not open browser: {err}")));
                None
            }
        };
        (self, effect)
    }

    fn on_input(&mut self, input: Input) -> Option<Effect> {
        match input {
            Input::Quit => {
                self.running = false;
                None
            }
            Input::Resize => None,
            Input::Up => {
                self.move_cursor(-1);
                None
            }
            Input::Down => {
                self.move_cursor(1);
                None
            }
            Input::Back => {
                if self.in_detail() {
                    self.view = View::List;
                    self.status = None;
                }
                None
            }
            Input::Detail => {
                if self.in_detail() {
                    return None;
                }
                let slug = self.selected_goal()?.slug.clone();
                self.request(Effect::FetchGoal(slug))
            }
            Input::Refresh => {
                if self.in_detail() {
                    let slug = self.current_slug()?;
                    self.request(Effect::FetchGoal(slug))
                } else {
                    self.request(Effect::FetchGoals)
                }
            }
            Input::Create => {
                let slug = self.current_slug()?;
                self.request(Effect::CreateDatapoint(slug))
            }
            Input::Web => {
                let slug = self.current_slug().filter(|_| self.in_detail());
                self.request(Effect::OpenBrowser(slug))
            }
        }
    }

    /// Cursor movement is clamped; at either boundary it is a no-op.
    fn move_cursor(&mut self, delta: isize) {
        let (position, len) = match &mut self.view {
            View::List => (&mut self.selected, self.goals.len()),
            View::Detail { goal, scroll } => (scroll, datapoint_count(goal)),
        };
        if len == 0 {
            *position = 0;
            return;
        }
        let next = position.saturating_add_signed(delta);
        *position = next.min(len - 1);
    }

    /// Gate every outgoing effect once the key has been rejected.
    fn request(&mut self, effect: Effect) -> Option<Effect> {
        if self.credentials_rejected {
            self.status = Some(Status::Error(
                "API key rejected by Beeminder; restart with a valid BEEMINDER_API_KEY".into(),
            ));
            return None;
        }
        Some(effect)
    }

    fn fail(&mut self, err: BeeminderError) {
        log::warn!("{err}");
        if err.is_auth() {
            self.credentials_rejected = true;
        }
        self.status = Some(Status::Error(err.to_string()));
    }

    /// A successful load supersedes a stale error; info messages stay.
    fn clear_error(&mut self) {
        if matches!(self.status, Some(Status::Error(_))) {
            self.status = None;
        }
    }

    /// Replace the list wholesale, keeping the selection on the same slug when
    /// it is still present.
    fn on_goals(&mut self, result: Result<Vec<Goal>, BeeminderError>) {
        match result {
            Ok(goals) => {
                let previous = self.selected_goal().map(|g| g.slug.clone());
                self.selected = previous
                    .and_then(|slug| goals.iter().position(|g| g.slug == slug))
                    .unwrap_or(self.selected)
                    .min(goals.len().saturating_sub(1));
                self.clear_error();
                self.goals = goals;
            }
            Err(err) => self.fail(err),
        }
    }

    /// Enter (or stay in) the detail view. Re-fetching the same goal keeps the
    /// scroll position.
    fn on_goal(&mut self, result: Result<Goal, BeeminderError>) {
        match result {
            Ok(goal) => {
                let scroll = match &self.view {
                    View::Detail { goal: shown, scroll } if shown.slug == goal.slug => {
                        (*scroll).min(datapoint_count(&goal).saturating_sub(1))
                    }
                    _ => 0,
                };
                self.clear_error();
                self.view = View::Detail { goal, scroll };
            }
            Err(err) => self.fail(err),
        }
    }

    /// After a successful create, refresh whatever view we are in.
    fn on_created(
        &mut self,
        slug: String,
        result: Result<Datapoint, BeeminderError>,
    ) -> Option<Effect> {
        match result {
            Ok(point) => {
                let refresh = match &self.view {
                    View::Detail { goal, .. } if goal.slug == slug => Effect::FetchGoal(slug.clone()),
                    _ => Effect::FetchGoals,
                };
                self.status = Some(Status::Info(format!("Added {} to {slug}", point.value)));
                self.request(refresh)
            }
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }
}

fn datapoint_count(goal: &Goal) -> usize {
    goal.datapoints.as_ref().map_or(0, Vec::len)
}
