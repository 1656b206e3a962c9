/// Creates a single [`Turn`](crate::Turn) from a role shorthand.
///
/// ```rust
/// use tandem::{Role, tandem_turn};
///
/// let turn = tandem_turn!(model => "Done.");
/// assert_eq!(turn.role, Role::Model);
/// assert_eq!(turn.text(), "Done.");
/// ```
#[macro_export]
macro_rules! tandem_turn {
    (user => $content:expr $(,)?) => {
        $crate::Turn::user($content)
    };
    (model => $content:expr $(,)?) => {
        $crate::Turn::model($content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use user or model");
    };
}

/// Creates a `Vec<Turn>` from role/content pairs.
///
/// ```rust
/// use tandem::{Role, tandem_turns};
///
/// let history = tandem_turns![
///     user => "What is Rust?",
///     model => "A systems programming language.",
/// ];
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history[0].role, Role::User);
/// assert_eq!(history[1].role, Role::Model);
/// ```
#[macro_export]
macro_rules! tandem_turns {
    () => {
        Vec::<$crate::Turn>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::tandem_turn!($role => $content)),+]
    };
}

/// Creates an [`ExchangeRequest`](crate::ExchangeRequest) against one or more Gemini models.
///
/// ```rust
/// use tandem::tandem_exchange;
///
/// let request = tandem_exchange!("chat-1", "hello", ["gemini-2.5-flash", "gemini-2.5-pro"]);
/// assert_eq!(request.candidates.len(), 2);
/// assert_eq!(request.query, "hello");
/// ```
#[macro_export]
macro_rules! tandem_exchange {
    ($conversation_id:expr, $query:expr, [$($model:expr),+ $(,)?] $(,)?) => {
        $crate::ExchangeRequest::new($conversation_id, $query)
            .with_candidates(vec![$($crate::ModelCandidate::gemini($model)),+])
    };
    ($conversation_id:expr, $query:expr, $model:expr $(,)?) => {
        $crate::ExchangeRequest::new($conversation_id, $query)
            .with_candidate($crate::ModelCandidate::gemini($model))
    };
}
