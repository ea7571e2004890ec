//! Candidate event names for the current ledger contents

use crate::grammar::{CHORD_JOIN, PRECISE_JOIN};
use crate::ledger::DownLedger;
use crate::names::{alternates, compare_names, event_name, ModifierClass};

/// Sort chord members into their canonical order.
pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| compare_names(a, b));
}

/// Every spelling of a chord joined with `join`.
///
/// Each member contributes its alternate names (`controlleft` also answers
/// to `ctrl`); the result is their product, most specific first and fully
/// generic last, without duplicates.
pub fn chord_names(names: &[String], join: &str) -> Vec<String> {
    let mut combos: Vec<String> = vec![String::new()];
    for (i, name) in names.iter().enumerate() {
        let spellings = alternates(name);
        combos = combos
            .iter()
            .flat_map(|prefix| {
                spellings.iter().map(move |spelling| {
                    if i == 0 {
                        spelling.clone()
                    } else {
                        format!("{}{}{}", prefix, join, spelling)
                    }
                })
            })
            .collect();
    }
    dedup(combos)
}

/// The specific and the generic spelling of a chord, joined with `join`.
/// Used for sequence steps, where the full product would grow with every
/// buffered chord.
pub fn chord_forms(names: &[String], join: &str) -> (String, String) {
    let specific: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let generic: Vec<String> = names.iter().map(|n| event_name(n)).collect();
    (specific.join(join), generic.join(join))
}

/// Every event name that describes exactly the set of inputs held right now.
///
/// Precise (`->`, press order) names come before simultaneous (`-`, sorted)
/// ones. When shift is held together with a key whose live name differs from
/// its press-time name (`?` pressed as `/`), shift is dropped from the live
/// view since the character already carries it, and the press-time view is
/// emitted as well (`shift-/`). With only two inputs held the precise form is
/// skipped, since `shift->?` says nothing that `?` does not.
pub fn down_events(ledger: &DownLedger) -> Vec<String> {
    let mut live: Vec<String> = ledger.live().to_vec();
    let mut unshifted: Vec<String> = ledger.press_time().to_vec();
    let mut events = Vec::new();
    if live.is_empty() {
        return events;
    }

    let mut shifted = false;
    if live.len() > 1 {
        let shift_index = if ledger.modifiers().shift {
            live.iter()
                .position(|name| ModifierClass::of(name) == Some(ModifierClass::Shift))
        } else {
            None
        };
        if let Some(index) = shift_index {
            shifted = ledger
                .entries()
                .any(|(live, press)| live.to_lowercase() != press.to_lowercase());
            if shifted {
                live.remove(index);
            }
        }
        let skip_precise = shifted && ledger.len() == 2;
        if !skip_precise {
            events.extend(chord_names(&live, PRECISE_JOIN));
            if shifted {
                events.extend(chord_names(&unshifted, PRECISE_JOIN));
            }
        }
    }

    sort_names(&mut live);
    events.extend(chord_names(&live, CHORD_JOIN));
    if shifted {
        sort_names(&mut unshifted);
        events.extend(chord_names(&unshifted, CHORD_JOIN));
    }
    dedup(events)
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn ledger_of(entries: &[(&str, Option<&str>)]) -> DownLedger {
        let mut ledger = DownLedger::new();
        for (name, alt) in entries {
            ledger.add(name, *alt);
        }
        ledger
    }

    #[test]
    fn test_sort_names_is_press_order_independent() {
        let mut first = strings(&["a", "ShiftLeft", "ControlLeft"]);
        let mut second = strings(&["ControlLeft", "a", "ShiftLeft"]);
        sort_names(&mut first);
        sort_names(&mut second);
        assert_eq!(first, second);
        assert_eq!(first, strings(&["ControlLeft", "ShiftLeft", "a"]));
    }

    #[test]
    fn test_chord_names_product() {
        let names = chord_names(&strings(&["ControlLeft", "ShiftLeft", "a"]), "-");
        assert_eq!(
            names,
            strings(&[
                "controlleft-shiftleft-a",
                "controlleft-shift-a",
                "ctrl-shiftleft-a",
                "ctrl-shift-a",
            ])
        );
    }

    #[test]
    fn test_chord_names_dedups_generic_only_members() {
        assert_eq!(chord_names(&strings(&["Shift", "a"]), "-"), strings(&["shift-a"]));
    }

    #[test]
    fn test_chord_forms() {
        let (specific, generic) = chord_forms(&strings(&["ControlLeft", "c"]), "-");
        assert_eq!(specific, "controlleft-c");
        assert_eq!(generic, "ctrl-c");
    }

    #[test]
    fn test_down_events_empty_and_single() {
        assert!(down_events(&DownLedger::new()).is_empty());
        let ledger = ledger_of(&[("a", None)]);
        assert_eq!(down_events(&ledger), strings(&["a"]));
    }

    #[test]
    fn test_down_events_precise_before_sorted() {
        let ledger = ledger_of(&[("a", None), ("ControlLeft", None)]);
        let events = down_events(&ledger);
        assert_eq!(events[0], "a->controlleft");
        assert_eq!(events[1], "a->ctrl");
        assert!(events.contains(&"ctrl-a".to_string()));
        let precise_last = events.iter().rposition(|e| e.contains("->")).unwrap();
        let sorted_first = events.iter().position(|e| !e.contains("->")).unwrap();
        assert!(precise_last < sorted_first);
    }

    #[test]
    fn test_two_key_shifted_chord_drops_shift() {
        let ledger = ledger_of(&[("ShiftLeft", None), ("?", Some("/"))]);
        let events = down_events(&ledger);
        assert_eq!(events, strings(&["?", "shiftleft-/", "shift-/"]));
    }

    #[test]
    fn test_three_key_shifted_chord_emits_both_views() {
        let ledger = ledger_of(&[("ControlLeft", None), ("ShiftLeft", None), ("?", Some("/"))]);
        let events = down_events(&ledger);
        assert!(events.contains(&"ctrl->?".to_string()));
        assert!(events.contains(&"ctrl->shift->/".to_string()));
        assert!(events.contains(&"ctrl-?".to_string()));
        assert!(events.contains(&"ctrl-shift-/".to_string()));
        assert!(!events.contains(&"ctrl-shift-?".to_string()));
    }

    #[test]
    fn test_case_only_difference_is_not_shifted() {
        let ledger = ledger_of(&[("ShiftLeft", None), ("A", Some("a"))]);
        let events = down_events(&ledger);
        assert!(events.contains(&"shift-a".to_string()));
        assert!(events.contains(&"shiftleft->a".to_string()));
    }

    #[test]
    fn test_no_duplicates() {
        let ledger = ledger_of(&[("Shift", None), ("Control", None), ("x", None)]);
        let events = down_events(&ledger);
        let mut unique = events.clone();
        unique.dedup();
        assert_eq!(events.len(), unique.len());
        assert!(events.contains(&"ctrl-shift-x".to_string()));
    }
}
