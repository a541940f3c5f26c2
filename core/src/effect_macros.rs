//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when reducers build `Effect` values.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use todos_core::async_effect;
///
/// async_effect! {
///     let items = gateway.list_all().await.ok()?;
///     Some(TodosAction::LoadSucceeded(items))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use todos_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(1),
///     action: TodosAction::Sort
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create a debounced delayed action
///
/// Expands to a `cancel_in_flight` cancellable `Effect::Delay`: every new
/// debounce under the same id restarts the timer, so only the last one fires.
///
/// # Example
///
/// ```rust,ignore
/// use todos_core::debounce;
///
/// debounce! {
///     id: SORT_DEBOUNCE,
///     duration: Duration::from_secs(1),
///     action: TodosAction::Sort
/// }
/// ```
#[macro_export]
macro_rules! debounce {
    (
        id: $id:expr,
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            cancel_in_flight: true,
            effect: ::std::boxed::Box::new($crate::delay! {
                duration: $duration,
                action: $action
            }),
        }
    };
}
