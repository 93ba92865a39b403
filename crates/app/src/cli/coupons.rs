use clap::{Args, Subcommand};

use pawcart::{Coupon, CouponId, StatusFilter, pricing::format_amount};
use pawcart_app::context::AppContext;

#[derive(Debug, Args)]
pub(crate) struct CouponsCommand {
    #[command(subcommand)]
    command: CouponsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponsSubcommand {
    /// List coupons on offer
    Available,

    /// List received coupons
    Mine(MineArgs),

    /// Receive a coupon on offer
    Receive(CouponArgs),

    /// Mark a received coupon as used
    Use(CouponArgs),
}

#[derive(Debug, Args)]
struct MineArgs {
    /// Status filter (all, available, used, expired)
    #[arg(long, default_value = "all")]
    status: StatusFilter,
}

#[derive(Debug, Args)]
struct CouponArgs {
    /// Coupon id
    id: String,
}

pub(crate) async fn run(command: CouponsCommand, context: &AppContext) -> Result<(), String> {
    let cache = context.coupon_cache();

    match command.command {
        CouponsSubcommand::Available => {
            let offers = cache.offers().await;

            if offers.is_empty() {
                println!("no coupons on offer");
            }

            for offer in offers {
                let marker = if offer.received { "received" } else { "" };

                println!("{:<8}  {}", marker, describe(&offer.coupon));
            }

            Ok(())
        }
        CouponsSubcommand::Mine(MineArgs { status }) => {
            let coupons = cache.fetch_mine(status).await;

            if coupons.is_empty() {
                println!("no {} coupons", status.as_str());
            }

            for coupon in coupons {
                println!("{:<9}  {}", coupon.status, describe(&coupon));
            }

            Ok(())
        }
        CouponsSubcommand::Receive(CouponArgs { id }) => {
            let coupon = cache
                .receive_by_id(&CouponId::new(id), context.authenticated())
                .await
                .map_err(|error| error.to_string())?;

            println!("received {}", describe(&coupon));

            Ok(())
        }
        CouponsSubcommand::Use(CouponArgs { id }) => {
            let id = CouponId::new(id);

            if !cache.mark_used(&id).await {
                return Err(format!("coupon {id} is not available to use"));
            }

            println!("coupon {id} marked as used");

            Ok(())
        }
    }
}

fn describe(coupon: &Coupon) -> String {
    format!(
        "{}  {}: {} off orders from {}, expires {}",
        coupon.id,
        coupon.name,
        format_amount(coupon.amount),
        format_amount(coupon.min_amount),
        coupon
            .expire_time
            .map_or_else(|| "never".to_string(), |date| date.to_string())
    )
}
