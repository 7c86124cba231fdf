//! Operation log - A logger scoped to one handler invocation
//!
//! Passed by reference through every pipeline stage so each line carries the
//! resource type, action and identifier it belongs to.

use std::fmt::Display;

use crate::request::Action;

const TARGET: &str = "panorama";

#[derive(Debug, Clone)]
pub struct OperationLog {
    type_name: &'static str,
    action: Action,
    identifier: Option<String>,
}

impl OperationLog {
    pub fn new(type_name: &'static str, action: Action) -> Self {
        Self {
            type_name,
            action,
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        self.identifier = if identifier.is_empty() {
            None
        } else {
            Some(identifier)
        };
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn action(&self) -> Action {
        self.action
    }

    fn prefix(&self) -> String {
        match &self.identifier {
            Some(id) => format!("[{} {} {}]", self.type_name, self.action, id),
            None => format!("[{} {}]", self.type_name, self.action),
        }
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!(target: TARGET, "{} {}", self.prefix(), message);
    }

    pub fn info(&self, message: impl Display) {
        log::info!(target: TARGET, "{} {}", self.prefix(), message);
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!(target: TARGET, "{} {}", self.prefix(), message);
    }

    pub fn error(&self, message: impl Display) {
        log::error!(target: TARGET, "{} {}", self.prefix(), message);
    }
}
