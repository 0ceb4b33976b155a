use num_traits::Float;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::config::Config;
use crate::error::{KspError, Result};
use crate::graph::{State, StateSet};

/// The ways a caller can name the states a path must end in.
#[derive(Debug, Clone, Copy)]
pub enum Targets<'a, T> {
    /// Every set bit is a target, reached with probability 1.
    States(&'a StateSet),
    State(State),
    List(&'a [State]),
    /// One probability of reaching the target per state; zero means "not a target".
    Vector(&'a [T]),
    /// Probability of reaching the target from the listed states.
    Map(&'a HashMap<State, T>),
}

/// Boundary edges of the virtual source and sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary<T> {
    /// States joined to the virtual source with zero-cost edges, ascending.
    pub initial_states: Vec<State>,
    /// States joined to the virtual sink and the probability of that final
    /// step, ascending by state. Every probability is positive.
    pub targets: Vec<(State, T)>,
}

/// Reduces the initial and target descriptions of a system with
/// `state_count` states to the boundary edges of one virtual source and one
/// virtual sink.
///
/// # Errors
/// * `MalformedModel` if a state is out of range, the probability vector has
///   the wrong length or a probability lies outside `[0, 1 + tolerance]`
/// * `EmptyInitialSet` if no initial state is given
/// * `EmptyTargetSet` if no state has a positive target probability
pub fn collapse<T>(
    state_count: usize,
    initial: &StateSet,
    targets: Targets<'_, T>,
    config: &Config<T>,
) -> Result<Boundary<T>>
where
    T: Float + Debug,
{
    let initial_states: Vec<State> = initial.iter_ones().collect();
    if let Some(&s) = initial_states.iter().find(|&&s| s >= state_count) {
        return Err(out_of_range("initial state", s, state_count));
    }
    if initial_states.is_empty() {
        return Err(KspError::EmptyInitialSet);
    }

    let mut weighted: Vec<(State, T)> = match targets {
        Targets::States(set) => set.iter_ones().map(|s| (s, T::one())).collect(),
        Targets::State(s) => vec![(s, T::one())],
        Targets::List(list) => list.iter().map(|&s| (s, T::one())).collect(),
        Targets::Vector(probabilities) => {
            if probabilities.len() != state_count {
                return Err(KspError::malformed(format!(
                    "target probability vector has {} entries, expected {}",
                    probabilities.len(),
                    state_count
                )));
            }
            probabilities.iter().copied().enumerate().collect()
        }
        Targets::Map(map) => map.iter().map(|(&s, &p)| (s, p)).collect(),
    };

    for &(s, p) in &weighted {
        if s >= state_count {
            return Err(out_of_range("target state", s, state_count));
        }
        if !p.is_finite() || p < T::zero() || p > T::one() + config.tolerance {
            return Err(KspError::malformed(format!(
                "target probability {:?} of state {} is not a probability",
                p, s
            )));
        }
    }

    weighted.retain(|&(_, p)| p > T::zero());
    weighted.sort_by_key(|&(s, _)| s);
    weighted.dedup_by_key(|&mut (s, _)| s);
    if weighted.is_empty() {
        return Err(KspError::EmptyTargetSet);
    }

    Ok(Boundary {
        initial_states,
        targets: weighted,
    })
}

fn out_of_range(what: &str, state: State, state_count: usize) -> KspError {
    KspError::malformed(format!(
        "{} {} outside a model with {} states",
        what, state, state_count
    ))
}
