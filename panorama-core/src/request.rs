//! Request - What the host scheduler hands to a handler

use serde::{Deserialize, Serialize};

use crate::progress::CallbackContext;

/// Lifecycle operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Read => "READ",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
            Action::List => "LIST",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One handler invocation
///
/// On resumption the host passes back the resource model and callback context
/// from the previous IN_PROGRESS event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerRequest<M> {
    pub action: Action,
    pub desired_resource_state: M,
    /// Only supplied for Update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_resource_state: Option<M>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_context: Option<CallbackContext>,
    /// Only meaningful for List
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl<M> HandlerRequest<M> {
    pub fn new(action: Action, desired: M) -> Self {
        Self {
            action,
            desired_resource_state: desired,
            previous_resource_state: None,
            callback_context: None,
            next_token: None,
        }
    }

    pub fn with_previous(mut self, previous: M) -> Self {
        self.previous_resource_state = Some(previous);
        self
    }

    pub fn with_callback_context(mut self, context: CallbackContext) -> Self {
        self.callback_context = Some(context);
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request_json() {
        let json = r#"{
            "action": "UPDATE",
            "desiredResourceState": {"name": "new"},
            "previousResourceState": {"name": "old"}
        }"#;
        let request: HandlerRequest<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(request.action, Action::Update);
        assert_eq!(request.desired_resource_state["name"], "new");
        assert!(request.previous_resource_state.is_some());
        assert!(request.callback_context.is_none());
        assert!(request.next_token.is_none());
    }
}
