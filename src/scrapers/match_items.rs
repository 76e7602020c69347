//! Shared parsing for `.match-item` blocks on the matches and results pages.
//!
//! The listing groups items under date headers (`.wf-label.mod-large`) that
//! are siblings of the item cards rather than their ancestors. The date of
//! an item is therefore the last header that precedes it in document order
//! among the labels that share its nearest `.col-container` ancestor. Items
//! and labels outside every container form one more group.

use crate::utils::{clean_text, element_text, max_page_number, region_from_classes, safe_time, UNKNOWN};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

static ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse(MATCH_ITEM_MARKER).unwrap());
static CONTAINER: Lazy<Selector> = Lazy::new(|| Selector::parse(".col-container").unwrap());
static DATE_LABEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".wf-label.mod-large").unwrap());
static DATE_OR_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".wf-label.mod-large, .match-item").unwrap());
static TEAM_NAME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".match-item-vs-team-name .text-of").unwrap());
static FLAG: Lazy<Selector> = Lazy::new(|| Selector::parse(".flag").unwrap());
static SCORE: Lazy<Selector> = Lazy::new(|| Selector::parse(".match-item-vs-team-score").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse(".match-item-time").unwrap());
static EVENT: Lazy<Selector> = Lazy::new(|| Selector::parse(".match-item-event").unwrap());
static STATUS: Lazy<Selector> = Lazy::new(|| Selector::parse(".ml-status").unwrap());
static STATUS_FALLBACK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".match-item-vs-status").unwrap());
static PAGE_BUTTON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".action-container-pages .btn.mod-page").unwrap());

/// Content marker shared by matches and results.
pub const MATCH_ITEM_MARKER: &str = ".match-item";

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub region: String,
}

/// A `.match-item` block with every field already normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchItem {
    pub date: String,
    pub teams: Vec<Team>,
    pub scores: Vec<String>,
    pub time: String,
    pub event: String,
    pub status: String,
}

/// Why a match item was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// The item did not resolve to exactly two team names.
    TeamCount(usize),
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::TeamCount(n) => write!(f, "expected 2 teams, found {n}"),
        }
    }
}

impl MatchItem {
    /// Split off the two sides, rejecting any other team count.
    pub fn into_pair(mut self) -> Result<([Team; 2], Self), Malformed> {
        let teams = std::mem::take(&mut self.teams);
        let pair = <[Team; 2]>::try_from(teams).map_err(|teams| Malformed::TeamCount(teams.len()))?;
        Ok((pair, self))
    }
}

/// Every `.match-item` in the document, once each and in document order,
/// paired with its section date.
pub fn collect(document: &Html) -> Vec<MatchItem> {
    document
        .select(&ITEM)
        .map(|item| {
            let container = nearest_container(item);
            let scope = container.unwrap_or_else(|| document.root_element());
            parse_item(item, &date_before(scope, container, item))
        })
        .collect()
}

fn nearest_container<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| CONTAINER.matches(ancestor))
}

/// Text of the last date label before `item` that shares its nearest container.
fn date_before(scope: ElementRef<'_>, container: Option<ElementRef<'_>>, item: ElementRef<'_>) -> String {
    let container = container.map(|c| c.id());
    let mut date = String::new();
    for element in scope.select(&DATE_OR_ITEM) {
        if element.id() == item.id() {
            break;
        }
        if DATE_LABEL.matches(&element) && nearest_container(element).map(|c| c.id()) == container {
            date = element_text(element);
        }
    }
    date
}

fn parse_item(item: ElementRef<'_>, date: &str) -> MatchItem {
    let teams = item
        .select(&TEAM_NAME)
        .map(|name| Team {
            name: element_text(name),
            region: name
                .select(&FLAG)
                .next()
                .map(|flag| region_from_classes(flag.value().classes()))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        })
        .collect();

    let scores = item.select(&SCORE).map(element_text).collect();

    let status = first_text(item, &STATUS)
        .filter(|s| !s.is_empty())
        .or_else(|| first_text(item, &STATUS_FALLBACK))
        .unwrap_or_default();

    MatchItem {
        date: clean_text(date),
        teams,
        scores,
        time: item
            .select(&TIME)
            .next()
            .map(|t| safe_time(&t.text().collect::<String>()))
            .unwrap_or_default(),
        event: first_text(item, &EVENT).unwrap_or_default(),
        status,
    }
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

/// Largest numbered pagination button, or 1.
pub fn total_pages(document: &Html) -> u32 {
    max_page_number(
        document
            .select(&PAGE_BUTTON)
            .map(|button| button.text().collect::<String>()),
    )
}
