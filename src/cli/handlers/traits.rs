//! Handler traits and common patterns
//!
//! Every command handler borrows the [`CliContext`]; the macro below wires a
//! handler's `new` into [`HandlerFactory`] so [`HandlerBuilder`] can create it.

use super::super::CliContext;

/// Trait for handlers that can be created from a CLI context
pub trait HandlerFactory<'a> {
    type Handler;

    /// Create a new handler instance from the given context
    fn create(context: &'a CliContext) -> Self::Handler;
}

/// Macro to reduce boilerplate for handlers that follow the standard pattern
macro_rules! impl_context_handler {
    ($handler:ty) => {
        impl<'a> crate::cli::handlers::traits::HandlerFactory<'a> for $handler {
            type Handler = Self;

            fn create(context: &'a crate::cli::CliContext) -> Self::Handler {
                Self::new(context)
            }
        }
    };
}

pub(crate) use impl_context_handler;

/// Creates handlers sharing one context
pub struct HandlerBuilder<'a> {
    context: &'a CliContext,
}

impl<'a> HandlerBuilder<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub fn create_with_context<F>(&self) -> F::Handler
    where
        F: HandlerFactory<'a>,
    {
        F::create(self.context)
    }
}
