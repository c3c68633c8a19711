#![warn(missing_docs)]

//! This crate contains the attribute macro which turns an annotated `impl` block into an
//! `axis_commands::CommandType` implementation.

extern crate proc_macro;

mod gen;
mod parse;

use syn::{parse_macro_input, AttributeArgs, ItemImpl};

/// Declares a command on an inherent `impl` block.
///
/// ```ignore
/// #[command(name = "give", aliases("g", "gv"), permission = "plugin.give",
///           usage = "/give <item>", description = "Hands out items",
///           allow_console = false, run_async = false)]
/// impl Give {
///     #[execute]
///     fn execute(&self, ctx: &InvocationContext) -> HandlerResult { Ok(()) }
///
///     #[subcommand(name = "item", permission = "plugin.give.item")]
///     #[tab_complete("sword,shield", "@players")]
///     fn item(&self, ctx: &InvocationContext) -> HandlerResult { Ok(()) }
/// }
/// ```
///
/// Only `name` is required. `#[execute]`, `#[subcommand]` and `#[tab_complete]` are consumed by
/// this macro and are not attributes in their own right.
#[proc_macro_attribute]
pub fn command(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let item = parse_macro_input!(item as ItemImpl);
    match gen::generate_command(args, item) {
        Ok(output) => output.into(),
        Err(error) => error.to_compile_error().into(),
    }
}
