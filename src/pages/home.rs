//! Landing page listing the known users

use crate::render::Head;
use crate::state::State;

use super::{layout, list, Page};

pub struct HomePage;

impl Page for HomePage {
    fn name(&self) -> &str {
        "home"
    }

    fn render(&self, state: &State, head: &mut Head) -> String {
        head.title("Home");
        head.meta("description", "Users known to this server");

        let users = list(state.users.iter().map(|user| user.name.as_str()));
        layout(&format!("<h3>Users</h3>{}", users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::User;

    #[test]
    fn test_renders_users() {
        let state = State {
            users: vec![User { name: "Joe".to_string() }, User { name: "xxx".to_string() }],
            posts: Vec::new(),
        };
        let mut head = Head::new();

        let body = HomePage.render(&state, &mut head);
        assert!(body.contains("<ul><li>Joe</li><li>xxx</li></ul>"));
        assert_eq!(head.get_title(), Some("Home"));
    }
}
