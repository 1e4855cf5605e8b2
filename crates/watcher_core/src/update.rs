use std::collections::VecDeque;

use crate::state::CycleScratch;
use crate::{dedupe, Effect, Listing, Msg, NotifiedSet, NotifyPolicy, Phase, WatchState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Effect ordering invariant: within a cycle, every `Notify` effect is
/// emitted (and resolved) before the single `Persist` effect, and `Persist`
/// is only emitted when the batch produced at least one previously-unseen
/// identifier. Messages that do not match the current phase are ignored.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    let effects = match (state.phase(), msg) {
        (Phase::Idle, Msg::PollDue) | (Phase::Sleeping, Msg::SleepFinished) => {
            state.begin_cycle();
            vec![Effect::Fetch]
        }
        (Phase::Fetching, Msg::FetchSucceeded { batch }) => {
            // The page lists offers newest-first; notifications go out in
            // chronological order, so flip the batch before deduplicating.
            let oldest_first: Vec<_> = batch.into_iter().rev().collect();
            let outcome = dedupe(&oldest_first, state.notified());
            let baseline = state.notified().clone();

            // The in-memory set advances even if the save later fails, so a
            // listing is never re-notified within this process run.
            state.set_notified(outcome.updated.clone());

            let mut queue: VecDeque<_> = outcome.new_listings.into();
            match queue.pop_front() {
                None => {
                    state.set_phase(Phase::Sleeping);
                    vec![Effect::Sleep]
                }
                Some(first) => {
                    state.scratch = Some(CycleScratch {
                        queue,
                        pending: outcome.updated,
                        baseline,
                    });
                    state.set_phase(Phase::Notifying);
                    vec![Effect::Notify(first)]
                }
            }
        }
        (Phase::Fetching, Msg::FetchFailed) => {
            state.set_phase(Phase::Sleeping);
            vec![Effect::Sleep]
        }
        (
            Phase::Notifying,
            Msg::NotifyResolved {
                identifier,
                delivered,
            },
        ) => {
            let withdraw = !delivered && state.policy() == NotifyPolicy::RetryNextCycle;
            if withdraw {
                state.notified_mut().remove(&identifier);
            }

            let step = match state.scratch.as_mut() {
                None => None,
                Some(scratch) => {
                    if withdraw {
                        scratch.pending.remove(&identifier);
                    }
                    Some(match scratch.queue.pop_front() {
                        Some(next) => NotifyStep::Deliver(next),
                        None if scratch.pending != scratch.baseline => {
                            NotifyStep::Persist(scratch.pending.clone())
                        }
                        None => NotifyStep::NothingToPersist,
                    })
                }
            };

            match step {
                None => Vec::new(),
                Some(NotifyStep::Deliver(listing)) => vec![Effect::Notify(listing)],
                Some(NotifyStep::Persist(pending)) => {
                    state.scratch = None;
                    state.set_phase(Phase::Persisting);
                    vec![Effect::Persist(pending)]
                }
                Some(NotifyStep::NothingToPersist) => {
                    // Every delivery was withdrawn, so the set is unchanged.
                    state.scratch = None;
                    state.set_phase(Phase::Sleeping);
                    vec![Effect::Sleep]
                }
            }
        }
        (Phase::Persisting, Msg::PersistResolved { .. }) => {
            // A failed save is accepted as at-least-once delivery across
            // restarts; the runner logs it. In-memory state is already ahead.
            state.set_phase(Phase::Sleeping);
            vec![Effect::Sleep]
        }
        _ => Vec::new(),
    };

    (state, effects)
}

enum NotifyStep {
    Deliver(Listing),
    Persist(NotifiedSet),
    NothingToPersist,
}
