//! Request-scoped application state
//!
//! Every render builds its own [`Store`] from the configured initial state,
//! lets the page dispatch whatever its prefetch step produced, and then
//! renders from an immutable snapshot. Nothing outlives the request.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::StateConfig;

/// A known user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

/// A post as kept in state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
}

/// A post record as returned by a data source; extra fields are dropped
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPost {
    pub id: u64,
    pub title: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// State snapshot handed to pages and serialized into the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl State {
    /// Initial state from configuration, with seed users dispatched
    pub fn from_config(config: &StateConfig) -> Self {
        let mut store = Store::new(State {
            users: config.users.clone(),
            posts: Vec::new(),
        });
        for name in &config.seed_users {
            store.dispatch(Action::AddUser(name.clone()));
        }
        store.into_state()
    }
}

/// State transitions
#[derive(Debug, Clone)]
pub enum Action {
    AddUser(String),
    PostsFetched(Vec<RawPost>),
}

/// Apply an action to a state, returning the next state
pub fn reduce(mut state: State, action: Action) -> State {
    match action {
        Action::AddUser(name) => state.users.push(User { name }),
        Action::PostsFetched(data) => {
            state.posts = data
                .into_iter()
                .map(|RawPost { id, title, .. }| Post { id, title })
                .collect();
        }
    }
    state
}

/// Capability handed to prefetch steps
pub trait Dispatch: Send {
    fn dispatch(&mut self, action: Action);
}

/// Request-scoped state container
#[derive(Debug, Default)]
pub struct Store {
    state: State,
}

impl Store {
    pub fn new(initial: State) -> Self {
        Self { state: initial }
    }

    /// Current state, borrowed
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> State {
        self.state.clone()
    }

    pub fn into_state(self) -> State {
        self.state
    }
}

impl Dispatch for Store {
    fn dispatch(&mut self, action: Action) {
        trace!(?action, "dispatch");
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }
}
