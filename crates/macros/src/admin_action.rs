//! Admin action attribute macro implementation
//!
//! Provides the `#[admin_action]` attribute for ergonomic action registration.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, Ident, ItemFn, LitInt, LitStr, Token};

/// Arguments to the admin_action attribute
///
/// Usage:
/// - `#[admin_action("kick", "Kick a player")]`
/// - `#[admin_action("fly", "Let a player fly", level = 4)]`
pub struct AdminActionArgs {
    /// Action name as typed after the chat prefix (e.g., "kick")
    pub name: LitStr,
    /// Action description
    pub description: LitStr,
    /// Level required when the level table has no entry for the action
    pub level: Option<LitInt>,
}

impl Parse for AdminActionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name: LitStr = input.parse()?;
        input.parse::<Token![,]>()?;
        let description: LitStr = input.parse()?;

        // Check for optional level parameter
        let level = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            let ident: Ident = input.parse()?;
            if ident != "level" {
                return Err(syn::Error::new(ident.span(), "expected `level`"));
            }
            input.parse::<Token![=]>()?;
            let level: LitInt = input.parse()?;
            level.base10_parse::<i32>()?;
            Some(level)
        } else {
            None
        };

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after admin_action arguments"));
        }

        Ok(Self {
            name,
            description,
            level,
        })
    }
}

/// Generate the admin_action implementation
pub fn generate_admin_action(args: AdminActionArgs, func: ItemFn) -> TokenStream {
    let fn_name = &func.sig.ident;
    let fn_vis = &func.vis;

    if func.sig.inputs.len() != 2 {
        return syn::Error::new_spanned(
            &func.sig,
            "admin actions take `(ctx: &mut ActionContext<'_>, info: &CommandInfo)`",
        )
        .to_compile_error();
    }

    let action_name = &args.name;
    let action_desc = &args.description;

    // Generate the registration function name
    let register_fn_name = Ident::new(&format!("{}_register", fn_name), fn_name.span());

    // Explicit level, else the built-in default for this action name
    let default_level = match &args.level {
        Some(level) => quote! { #level },
        None => quote! {
            ::urtadmin_core::levels::builtin_level(#action_name).unwrap_or(0)
        },
    };

    quote! {
        // The original function, unused arguments allowed
        #[allow(unused_variables)]
        #func

        /// Register this action with a command manager
        #fn_vis fn #register_fn_name(
            manager: &mut ::urtadmin_core::commands::CommandManager,
        ) -> Option<::urtadmin_core::commands::ActionKey> {
            manager.register(#action_name, #action_desc, #default_level, #fn_name)
        }
    }
}
