use clap::{Args, Subcommand};
use selfcheckout::receipt;

use crate::context::Context;

use super::{print_with, report};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart with estimated totals
    Show,

    /// Set the quantity of a line; zero or less removes it
    Set(SetArgs),

    /// Remove a line
    Remove(CodeArgs),

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Product code of the line
    code: String,

    /// New quantity
    #[arg(allow_negative_numbers = true)]
    quantity: i64,
}

#[derive(Debug, Args)]
struct CodeArgs {
    /// Product code of the line
    code: String,
}

pub(crate) fn run(context: &Context, command: CartCommand) -> Result<(), String> {
    let carts = &context.carts;

    let cart = match command.command {
        CartSubcommand::Show => carts.load(),
        CartSubcommand::Set(args) => {
            let (cart, found) = carts
                .update(|cart| cart.set_quantity(&args.code, args.quantity))
                .map_err(|error| report(&error))?;

            if !found {
                return Err(format!("{} is not in the cart", args.code));
            }

            cart
        }
        CartSubcommand::Remove(args) => {
            let (cart, found) = carts
                .update(|cart| cart.remove_item(&args.code))
                .map_err(|error| report(&error))?;

            if !found {
                return Err(format!("{} is not in the cart", args.code));
            }

            cart
        }
        CartSubcommand::Clear => {
            carts.clear().map_err(|error| report(&error))?;

            println!("cart cleared");

            return Ok(());
        }
    };

    print_with(|out| receipt::write_cart(out, &cart))
}
