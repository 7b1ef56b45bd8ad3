//! Notification sink for cart failures.
//!
//! The cart store never returns errors to its callers. Failures are logged and
//! handed to a [`Notifier`] so a UI layer can surface them (a toast, a status
//! line) without the store knowing how.

use std::fmt;

/// Cart operation that can fail against a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    Add,
    Remove,
    Clear,
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Clear => "clear",
        })
    }
}

/// A failure the store absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    /// Initial load failed; the cart was reset to empty.
    LoadFailed { message: String },
    /// A mutation failed; the cart was left unchanged.
    MutationFailed {
        operation: CartOperation,
        message: String,
    },
}

impl fmt::Display for CartNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { message } => write!(f, "Could not load your cart: {message}"),
            Self::MutationFailed { operation, message } => {
                write!(f, "Could not {operation} cart item: {message}")
            }
        }
    }
}

/// Receives notices about absorbed cart failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &CartNotice);
}

/// Discards every notice; the store still logs them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notice: &CartNotice) {}
}

impl<F> Notifier for F
where
    F: Fn(&CartNotice) + Send + Sync,
{
    fn notify(&self, notice: &CartNotice) {
        self(notice);
    }
}
