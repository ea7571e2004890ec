use crate::engine::{Core, Dispatch};
use crate::input::{Modality, RawEvent, SpeechInput};
use crate::registry::Payload;

use super::{InputHandler, Transition};

/// Recognized speech as momentary ledger entries.
///
/// Final transcripts become `speech:"<text>"` and take part in sequences.
/// Interim transcripts become `speech:rt:"<text>"`, fire once per distinct
/// text and stay out of the sequence buffer.
#[derive(Debug, Default)]
pub struct SpeechHandler {
    interim_seen: Vec<String>,
}

/// Distinct interim transcripts remembered between final results.
const INTERIM_MEMORY: usize = 32;

/// Hyphens would split the name into a chord; use en dashes instead.
fn quoted(transcript: &str) -> String {
    format!("\"{}\"", transcript.trim().replace('-', "\u{2013}"))
}

impl InputHandler for SpeechHandler {
    fn modality(&self) -> Modality {
        Modality::Speech
    }

    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch {
        let RawEvent::Speech(SpeechInput {
            transcript,
            is_final,
        }) = transition.event
        else {
            return Dispatch::default();
        };
        if transcript.trim().is_empty() {
            return Dispatch::default();
        }
        let accepted = core.accepts(transition.event);
        let payload = Payload::Speech {
            transcript: transcript.trim().to_string(),
        };
        let mut dispatch = Dispatch::default();

        if *is_final {
            self.interim_seen.clear();
            let name = format!("speech:{}", quoted(transcript));
            core.add_down(&name, None);
            if accepted {
                dispatch.extend(core.handle_down_events(&payload));
                dispatch.extend(core.handle_seq_events(transition.now));
            }
            core.remove_down(&name);
        } else {
            let name = format!("speech:rt:{}", quoted(transcript));
            if self.interim_seen.contains(&name) {
                return dispatch;
            }
            if self.interim_seen.len() >= INTERIM_MEMORY {
                self.interim_seen.clear();
            }
            self.interim_seen.push(name.clone());
            core.add_down(&name, None);
            if accepted {
                dispatch.extend(core.handle_down_events(&payload));
            }
            core.remove_down(&name);
        }
        dispatch
    }

    fn reset(&mut self) {
        self.interim_seen.clear();
    }
}
