#![warn(missing_docs)]

//! Declarative command routing for game-server plugins.
//!
//! Command types declare their metadata and handlers, either with the [`command`] attribute or
//! by implementing [`CommandType`] by hand. A [`Registrar`] binds them into the host's command
//! map; every invocation is then routed through permission gates, case-insensitive subcommand
//! lookup and a root-handler fallback, and runs inline or on a background [`Scheduler`].
//! Tab-completion is answered from the same declarations.
//!
//! ```
//! use axis_commands::{command, HandlerResult, InvocationContext};
//!
//! #[derive(Default)]
//! struct Give;
//!
//! #[command(name = "give", aliases("g"), permission = "plugin.give", allow_console = false)]
//! impl Give {
//!     #[execute]
//!     fn execute(&self, ctx: &InvocationContext) -> HandlerResult {
//!         ctx.send_usage("/give item <name> [player]");
//!         Ok(())
//!     }
//!
//!     #[subcommand(name = "item", permission = "plugin.give.item")]
//!     #[tab_complete("sword,shield,bow", "@players")]
//!     fn item(&self, ctx: &InvocationContext) -> HandlerResult {
//!         ctx.send(&format!("&aGiving {}", ctx.arg(1).unwrap_or("nothing")));
//!         Ok(())
//!     }
//! }
//! ```

// Lets the attribute macros' `::axis_commands` paths resolve inside this crate's own tests.
extern crate self as axis_commands;

mod arg;
mod command;
mod completion;
mod config;
mod context;
mod descriptor;
mod dispatch;
mod error;
mod host;
mod registrar;
mod registry;
mod scheduler;
mod subcommand;

pub use axis_commands_macros::command;
pub use arg::*;
pub use command::*;
pub use completion::{
    CompletionResolver,
    CompletionSource,
    Enumerator,
    Enumerators,
    CATALOG_VALUES,
    ONLINE_ACTORS,
};
pub use config::*;
pub use context::InvocationContext;
pub use descriptor::*;
pub use dispatch::Dispatcher;
pub use error::{BoxError, DispatchError, HandlerResult, RegistrationError, ScheduleError};
pub use host::*;
pub use registrar::*;
pub use registry::*;
pub use scheduler::*;
pub use subcommand::*;
