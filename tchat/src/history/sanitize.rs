//! Structural repair of turn logs for strict alternation providers.

use tprovider::Turn;

/// Repairs `history` so it starts with a plain user turn, alternates roles,
/// answers every function call immediately and ends on a model answer.
///
/// Re-running on the output is a no-op.
pub fn sanitize(history: Vec<Turn>) -> Vec<Turn> {
    let mut accepted: Vec<Turn> = Vec::with_capacity(history.len());

    for turn in history {
        if turn.parts.is_empty() {
            continue;
        }

        let accept = match accepted.last() {
            None => turn.is_user_plain(),
            Some(last) if last.opens_call() => turn.is_function_response(),
            Some(last) if last.is_user() => {
                if turn.is_user_plain() {
                    pop_unanswered_group(&mut accepted);
                    true
                } else {
                    turn.is_model()
                }
            }
            Some(_) => turn.is_user_plain(),
        };

        if accept {
            accepted.push(turn);
        }
    }

    while accepted
        .last()
        .is_some_and(|last| last.is_user() || last.opens_call())
    {
        accepted.pop();
    }

    accepted
}

/// Drops every call and function-response turn, then re-sanitizes.
pub fn strip_tool_exchanges(history: Vec<Turn>) -> Vec<Turn> {
    sanitize(
        history
            .into_iter()
            .filter(|turn| !turn.opens_call() && !turn.is_function_response())
            .collect(),
    )
}

// A newer plain user turn replaces the whole unanswered group.
fn pop_unanswered_group(accepted: &mut Vec<Turn>) {
    while accepted.last().is_some_and(|last| !last.is_model_answer()) {
        accepted.pop();
    }
}
