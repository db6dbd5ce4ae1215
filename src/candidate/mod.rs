// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Candidate action discovery
//!
//! A selector looks at the current snapshot and proposes the actions a
//! worker should try, in a stable order.

mod anchor;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::state::{Action, Snapshot};

pub use anchor::AnchorSelector;

/// Proposes candidate actions for a snapshot
pub trait CandidateSelector: Send + Sync {
    fn candidates(&self, snapshot: &Snapshot) -> Vec<Action>;
}

impl<F> CandidateSelector for F
where
    F: Fn(&Snapshot) -> Vec<Action> + Send + Sync,
{
    fn candidates(&self, snapshot: &Snapshot) -> Vec<Action> {
        self(snapshot)
    }
}

/// Raw `href` values of every `<a>` element, in document order
pub fn hrefs(html: &str) -> Vec<String> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut out = Vec::new();
    collect_hrefs(&dom.document, &mut out);
    out
}

fn collect_hrefs(handle: &Handle, out: &mut Vec<String>) {
    if let NodeData::Element {
        ref name,
        ref attrs,
        ..
    } = handle.data
    {
        if &*name.local == "a" {
            if let Some(href) = attrs
                .borrow()
                .iter()
                .find(|a| &*a.name.local == "href")
            {
                out.push(href.value.to_string());
            }
        }
    }

    for child in handle.children.borrow().iter() {
        collect_hrefs(child, out);
    }
}
