use crate::parse::{CommandArgs, HandlerAttrs, SubcommandArgs, TabComplete};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{AttributeArgs, Error, Ident, ImplItem, ItemImpl, Result};

// Strips the handler attributes from the impl block and emits it alongside a `CommandType`
// implementation built from them.
pub fn generate_command(args: AttributeArgs, mut item: ItemImpl) -> Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(Error::new_spanned(
            path,
            "#[command] must be placed on an inherent impl block.",
        ));
    }

    let command = CommandArgs::parse(args)?;

    let mut root: Option<Ident> = None;
    let mut routes = Vec::new();
    for impl_item in &mut item.items {
        let method = match impl_item {
            ImplItem::Method(method) => method,
            _ => continue,
        };

        let attrs = HandlerAttrs::take(method)?;
        let ident = &method.sig.ident;

        if let Some(span) = attrs.execute {
            if root.is_some() {
                return Err(Error::new(
                    span,
                    "Only one method per command can be marked #[execute].",
                ));
            }
            root = Some(ident.clone());
        }

        match (attrs.subcommand, attrs.tab_complete) {
            (Some(subcommand), tab_complete) =>
                routes.push(gen_route(ident, &subcommand, tab_complete.as_ref())),
            (None, Some(tab_complete)) =>
                return Err(Error::new(
                    tab_complete.span,
                    "#[tab_complete] only applies to a method also marked #[subcommand].",
                )),
            (None, None) => {}
        }
    }

    let descriptor = gen_descriptor(&command);
    let root = root.map(|ident| quote!(__routes.execute(Self::#ident);));

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics ::axis_commands::CommandType for #self_ty #where_clause {
            fn descriptor() -> ::axis_commands::CommandDescriptor {
                #descriptor
            }

            #[allow(unused_variables)]
            fn routes(__routes: &mut ::axis_commands::Routes<Self>) {
                #root
                #( #routes )*
            }
        }
    })
}

fn gen_descriptor(command: &CommandArgs) -> TokenStream {
    let CommandArgs {
        name,
        aliases,
        permission,
        usage,
        description,
        allow_console,
        run_async,
    } = command;

    let permission = permission.as_ref().map(|lit| quote!(.permission(#lit)));
    let usage = usage.as_ref().map(|lit| quote!(.usage(#lit)));
    let description = description.as_ref().map(|lit| quote!(.description(#lit)));
    let allow_console = allow_console.as_ref().map(|lit| quote!(.allow_console(#lit)));
    let run_async = run_async.as_ref().map(|lit| quote!(.run_async(#lit)));

    quote! {
        ::axis_commands::CommandDescriptor::builder(#name)
            #( .alias(#aliases) )*
            #permission
            #usage
            #description
            #allow_console
            #run_async
            .build()
    }
}

fn gen_route(
    method: &Ident,
    subcommand: &SubcommandArgs,
    tab_complete: Option<&TabComplete>,
) -> TokenStream {
    let name = &subcommand.name;
    let permission = subcommand
        .permission
        .as_ref()
        .map(|lit| quote!(.permission(#lit)));
    // An empty token list would leave the element type of `complete_with` uninferrable.
    let completions = tab_complete
        .filter(|tab_complete| !tab_complete.tokens.is_empty())
        .map(|tab_complete| {
            let tokens = &tab_complete.tokens;
            quote!(.complete_with([#( #tokens ),*]))
        });

    quote! {
        __routes.subcommand(
            ::axis_commands::Route::<Self>::new(#name, Self::#method)
                #permission
                #completions
        );
    }
}
