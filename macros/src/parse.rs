use proc_macro2::Span;
use syn::{
    spanned::Spanned,
    Attribute,
    AttributeArgs,
    Error,
    ImplItemMethod,
    Lit,
    LitBool,
    LitStr,
    Meta,
    NestedMeta,
    Path,
    Result,
};

/// Arguments of `#[command(...)]`.
pub struct CommandArgs {
    pub name: LitStr,
    pub aliases: Vec<LitStr>,
    pub permission: Option<LitStr>,
    pub usage: Option<LitStr>,
    pub description: Option<LitStr>,
    pub allow_console: Option<LitBool>,
    pub run_async: Option<LitBool>,
}

impl CommandArgs {
    pub fn parse(args: AttributeArgs) -> Result<Self> {
        let mut name = None;
        let mut aliases = None;
        let mut permission = None;
        let mut usage = None;
        let mut description = None;
        let mut allow_console = None;
        let mut run_async = None;

        for arg in args {
            match arg {
                NestedMeta::Meta(Meta::NameValue(pair)) => {
                    let key = key_of(&pair.path)?;
                    match key.as_str() {
                        "name" => set(&mut name, command_name(&pair.lit)?, &pair.path)?,
                        "permission" => set(&mut permission, lit_str(&pair.lit)?, &pair.path)?,
                        "usage" => set(&mut usage, lit_str(&pair.lit)?, &pair.path)?,
                        "description" => set(&mut description, lit_str(&pair.lit)?, &pair.path)?,
                        "allow_console" =>
                            set(&mut allow_console, lit_bool(&pair.lit)?, &pair.path)?,
                        "run_async" => set(&mut run_async, lit_bool(&pair.lit)?, &pair.path)?,
                        _ =>
                            return Err(Error::new_spanned(
                                &pair.path,
                                "Unknown command argument. Expected one of `name`, `aliases`, \
                                 `permission`, `usage`, `description`, `allow_console`, \
                                 `run_async`.",
                            )),
                    }
                }
                NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("aliases") => {
                    let mut names = Vec::with_capacity(list.nested.len());
                    for nested in &list.nested {
                        match nested {
                            NestedMeta::Lit(lit) => names.push(command_name(lit)?),
                            other =>
                                return Err(Error::new_spanned(other, "Expected a string literal.")),
                        }
                    }
                    set(&mut aliases, names, &list.path)?;
                }
                other =>
                    return Err(Error::new_spanned(
                        other,
                        "Expected `key = value` or `aliases(\"...\", ...)`.",
                    )),
            }
        }

        let name = name.ok_or_else(|| {
            Error::new(
                Span::call_site(),
                "Commands must be given a name: #[command(name = \"...\")]",
            )
        })?;

        Ok(CommandArgs {
            name,
            aliases: aliases.unwrap_or_default(),
            permission,
            usage,
            description,
            allow_console,
            run_async,
        })
    }
}

/// Arguments of `#[subcommand(...)]`.
pub struct SubcommandArgs {
    pub name: LitStr,
    pub permission: Option<LitStr>,
}

/// The `#[tab_complete(...)]` tokens of one method.
pub struct TabComplete {
    pub span: Span,
    pub tokens: Vec<LitStr>,
}

/// Handler attributes found on one method.
#[derive(Default)]
pub struct HandlerAttrs {
    pub execute: Option<Span>,
    pub subcommand: Option<SubcommandArgs>,
    pub tab_complete: Option<TabComplete>,
}

impl HandlerAttrs {
    /// Removes the handler attributes from `method`, leaving every other attribute in place.
    pub fn take(method: &mut ImplItemMethod) -> Result<Self> {
        let mut found = HandlerAttrs::default();
        let mut kept = Vec::with_capacity(method.attrs.len());

        for attr in std::mem::take(&mut method.attrs) {
            if attr.path.is_ident("execute") {
                if !attr.tokens.is_empty() {
                    return Err(Error::new_spanned(attr, "#[execute] takes no arguments."));
                }
                if found.execute.is_some() {
                    return Err(Error::new_spanned(attr, "Duplicate #[execute]."));
                }
                found.execute = Some(attr.span());
            } else if attr.path.is_ident("subcommand") {
                if found.subcommand.is_some() {
                    return Err(Error::new_spanned(attr, "Duplicate #[subcommand]."));
                }
                found.subcommand = Some(parse_subcommand(&attr)?);
            } else if attr.path.is_ident("tab_complete") {
                if found.tab_complete.is_some() {
                    return Err(Error::new_spanned(
                        attr,
                        "Duplicate #[tab_complete]. List every position in one attribute.",
                    ));
                }
                found.tab_complete = Some(parse_tab_complete(&attr)?);
            } else {
                kept.push(attr);
            }
        }

        method.attrs = kept;
        Ok(found)
    }
}

fn parse_subcommand(attr: &Attribute) -> Result<SubcommandArgs> {
    let list = match attr.parse_meta()? {
        Meta::List(list) => list,
        other =>
            return Err(Error::new_spanned(
                other,
                "Expected #[subcommand(name = \"...\", permission = \"...\")]",
            )),
    };

    let mut name = None;
    let mut permission = None;
    for nested in &list.nested {
        match nested {
            NestedMeta::Lit(lit) => set(&mut name, command_name(lit)?, &list.path)?,
            NestedMeta::Meta(Meta::NameValue(pair)) => match key_of(&pair.path)?.as_str() {
                "name" => set(&mut name, command_name(&pair.lit)?, &pair.path)?,
                "permission" => set(&mut permission, lit_str(&pair.lit)?, &pair.path)?,
                _ =>
                    return Err(Error::new_spanned(
                        &pair.path,
                        "Unknown subcommand argument. Expected `name` or `permission`.",
                    )),
            },
            other => return Err(Error::new_spanned(other, "Expected `key = \"value\"`.")),
        }
    }

    match name {
        Some(name) => Ok(SubcommandArgs { name, permission }),
        None => Err(Error::new_spanned(attr, "Subcommands must be given a name.")),
    }
}

fn parse_tab_complete(attr: &Attribute) -> Result<TabComplete> {
    let list = match attr.parse_meta()? {
        Meta::List(list) => list,
        other =>
            return Err(Error::new_spanned(
                other,
                "Expected #[tab_complete(\"a,b,c\", \"@players\", ...)]",
            )),
    };

    let mut tokens = Vec::with_capacity(list.nested.len());
    for nested in &list.nested {
        let token = match nested {
            NestedMeta::Lit(lit) => lit_str(lit)?,
            other => return Err(Error::new_spanned(other, "Expected a string literal.")),
        };

        let value = token.value();
        if value == "@" {
            return Err(Error::new_spanned(
                token,
                "A completion provider needs a key, such as \"@players\" or \"@items\".",
            ));
        }
        tokens.push(token);
    }

    Ok(TabComplete {
        span: attr.span(),
        tokens,
    })
}

fn key_of(path: &Path) -> Result<String> {
    match path.get_ident() {
        Some(ident) => Ok(ident.to_string()),
        None => Err(Error::new_spanned(path, "Expected an identifier.")),
    }
}

fn set<T>(slot: &mut Option<T>, value: T, path: &Path) -> Result<()> {
    if slot.is_some() {
        return Err(Error::new_spanned(path, "Argument given more than once."));
    }
    *slot = Some(value);
    Ok(())
}

fn lit_str(lit: &Lit) -> Result<LitStr> {
    match lit {
        Lit::Str(lit) => Ok(lit.clone()),
        other => Err(Error::new_spanned(other, "Expected a string literal.")),
    }
}

fn lit_bool(lit: &Lit) -> Result<LitBool> {
    match lit {
        Lit::Bool(lit) => Ok(lit.clone()),
        other => Err(Error::new_spanned(other, "Expected `true` or `false`.")),
    }
}

// Names become command labels, so they must be a single non-empty token.
fn command_name(lit: &Lit) -> Result<LitStr> {
    let name = lit_str(lit)?;
    let value = name.value();
    if value.is_empty() || value.chars().any(|ch| ch.is_whitespace() || ch == '/' || ch == ':') {
        return Err(Error::new_spanned(
            name,
            "Names must be non-empty and cannot contain whitespace, '/' or ':'.",
        ));
    }
    Ok(name)
}
