// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Actions and the transitions they produce

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StateId;

/// How an element is located in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum How {
    /// `id` attribute
    Id,
    /// XPath expression
    XPath,
    /// CSS selector
    Css,
    /// Absolute link target
    Href,
    /// Visible link text
    Text,
}

/// Element identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identification {
    pub how: How,
    pub value: String,
}

impl Identification {
    pub fn new(how: How, value: impl Into<String>) -> Self {
        Self {
            how,
            value: value.into(),
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(How::Id, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(How::XPath, value)
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(How::Css, value)
    }

    pub fn href(value: impl Into<String>) -> Self {
        Self::new(How::Href, value)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(How::Text, value)
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.how {
            How::Id => write!(f, "#{}", self.value),
            How::XPath => write!(f, "xpath:{}", self.value),
            How::Css => write!(f, "css:{}", self.value),
            How::Href => write!(f, "href:{}", self.value),
            How::Text => write!(f, "text:{}", self.value),
        }
    }
}

/// Kind of user-interaction event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Hover,
    Submit,
    Enter,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Click => "click",
            EventKind::Hover => "hover",
            EventKind::Submit => "submit",
            EventKind::Enter => "enter",
        };
        f.write_str(name)
    }
}

/// An event fired on one element. Two actions are the same action when
/// both the event and the element identification match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub event: EventKind,
    pub element: Identification,
}

impl Action {
    pub fn new(event: EventKind, element: Identification) -> Self {
        Self { event, element }
    }

    /// Click on an element
    pub fn click(element: Identification) -> Self {
        Self::new(EventKind::Click, element)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event, self.element)
    }
}

/// Transition identifier, dense in recording order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionId(pub u32);

/// A recorded edge: `action` fired at `source` produced `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: TransitionId,
    pub source: StateId,
    pub target: StateId,
    pub action: Action,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.action, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display() {
        let action = Action::click(Identification::id("save-btn"));
        assert_eq!(action.to_string(), "click #save-btn");

        let action = Action::new(EventKind::Hover, Identification::xpath("/html/body/div[2]"));
        assert_eq!(action.to_string(), "hover xpath:/html/body/div[2]");
    }

    #[test]
    fn test_action_identity() {
        let a = Action::click(Identification::id("a"));
        let b = Action::click(Identification::id("a"));
        let hover = Action::new(EventKind::Hover, Identification::id("a"));

        assert_eq!(a, b);
        assert_ne!(a, hover);
    }

    #[test]
    fn test_transition_display() {
        let t = Transition {
            id: TransitionId(0),
            source: StateId(0),
            target: StateId(1),
            action: Action::click(Identification::text("Next")),
        };
        assert_eq!(t.to_string(), "state0 -[click text:Next]-> state1");
    }
}
