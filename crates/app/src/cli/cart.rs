use clap::{Args, Subcommand};
use jiff::Zoned;

use pawcart::{Cart, CartItemId, CouponId, QuantityStep};
use pawcart_app::{
    context::AppContext,
    domain::carts::{BatchOutcome, CartSession},
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart
    Show,

    /// Flip one line's selection
    Toggle(ItemArgs),

    /// Select every line, or unselect all when everything is selected
    SelectAll,

    /// Add one unit to a line
    Inc(ItemArgs),

    /// Remove one unit from a line, never below one
    Dec(ItemArgs),

    /// Delete one line
    Remove(ItemArgs),

    /// Delete every selected line
    RemoveSelected,

    /// Delete every line
    Clear,

    /// Hand the selected lines to order creation
    Checkout(CheckoutArgs),
}

#[derive(Debug, Args)]
struct ItemArgs {
    /// Cart line id
    id: CartItemId,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    /// Received coupon to preview against the selected total
    #[arg(long)]
    coupon: Option<String>,
}

pub(crate) async fn run(command: CartCommand, context: &AppContext) -> Result<(), String> {
    let mut session = context.cart_session();
    session.load().await;

    let result = apply(command.command, &mut session, context).await;

    session.settle().await;
    print_cart(session.cart());

    result
}

async fn apply(
    command: CartSubcommand,
    session: &mut CartSession,
    context: &AppContext,
) -> Result<(), String> {
    match command {
        CartSubcommand::Show => Ok(()),
        CartSubcommand::Toggle(ItemArgs { id }) => match session.toggle_select(id) {
            Some(_) => Ok(()),
            None => Err(not_found(id)),
        },
        CartSubcommand::SelectAll => {
            session.select_all();
            Ok(())
        }
        CartSubcommand::Inc(ItemArgs { id }) => change(session, id, QuantityStep::Increase),
        CartSubcommand::Dec(ItemArgs { id }) => change(session, id, QuantityStep::Decrease),
        CartSubcommand::Remove(ItemArgs { id }) => {
            report(session.remove_item(id).await, || not_found(id))
        }
        CartSubcommand::RemoveSelected => report(session.remove_selected().await, || {
            "no cart items are selected".to_string()
        }),
        CartSubcommand::Clear => report(session.clear().await, || "cart is empty".to_string()),
        CartSubcommand::Checkout(args) => checkout(session, context, args).await,
    }
}

fn change(session: &mut CartSession, id: CartItemId, step: QuantityStep) -> Result<(), String> {
    if session.cart().get(id).is_none() {
        return Err(not_found(id));
    }

    if session.change_quantity(id, step).is_none() {
        println!("quantity of {id} is already at its minimum");
    }

    Ok(())
}

fn report(outcome: BatchOutcome, skipped: impl FnOnce() -> String) -> Result<(), String> {
    match outcome {
        BatchOutcome::Confirmed => Ok(()),
        BatchOutcome::Skipped => Err(skipped()),
        BatchOutcome::Failed { failed } => {
            let ids: Vec<_> = failed.iter().map(ToString::to_string).collect();

            Err(format!("failed to delete: {}", ids.join(", ")))
        }
    }
}

async fn checkout(
    session: &CartSession,
    context: &AppContext,
    args: CheckoutArgs,
) -> Result<(), String> {
    let snapshot = session
        .checkout()
        .await
        .map_err(|error| error.to_string())?;

    println!(
        "checked out {} line(s), total {}",
        snapshot.items.len(),
        snapshot.total_display()
    );

    if let Some(id) = args.coupon.map(CouponId::new) {
        let coupon = context
            .coupon_cache()
            .mirrored()
            .await
            .into_iter()
            .find(|coupon| coupon.id == id)
            .ok_or_else(|| format!("coupon {id} has not been received"))?;

        let today = Zoned::now().date();
        let total = Cart::with_items(snapshot.items).total_after(&coupon, today);

        println!(
            "with coupon {id}: {}",
            pawcart::pricing::format_amount(total)
        );
    }

    Ok(())
}

fn not_found(id: CartItemId) -> String {
    format!("cart item {id} not found")
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("cart is empty");
        return;
    }

    for item in cart.items() {
        println!(
            "[{}] {:>6}  {:<24} {} x {} = {}",
            if item.selected { "x" } else { " " },
            item.id,
            item.name.as_deref().unwrap_or("-"),
            pawcart::pricing::format_amount(item.price),
            item.quantity,
            pawcart::pricing::format_amount(item.line_total()),
        );
    }

    println!(
        "selected: {}  all selected: {}  total: {}",
        cart.selected_count(),
        if cart.all_selected() { "yes" } else { "no" },
        cart.total_display()
    );
}
