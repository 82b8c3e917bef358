//! Console presentation layer
//!
//! Toasts and views are written to stdout. Platform notifications are only
//! delivered when enabled; otherwise they fail so the dispatcher falls back
//! to a toast.

use std::time::Duration;

use async_trait::async_trait;
use shared::logging::Component;
use shared::market_debug;

use crate::error::{MarketError, MarketResult};
use crate::traits::{Notifier, View};

#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    platform_enabled: bool,
}

impl ConsoleNotifier {
    pub fn new(platform_enabled: bool) -> Self {
        Self { platform_enabled }
    }

    /// Text form of a view, one entry per line
    pub fn format_view(view: &View) -> String {
        let mut out = String::new();
        match view {
            View::Vendors(listings) => {
                out.push_str(&format!("── Vendors ({}) ──\n", listings.len()));
                for listing in listings {
                    let vendor = &listing.vendor;
                    let distance = listing
                        .distance_km
                        .map(|d| format!(" · {d:.2} km"))
                        .unwrap_or_default();
                    let status = if vendor.active { "open" } else { "closed" };
                    out.push_str(&format!(
                        "  [{}] {} ({}, {}){}\n",
                        vendor.id.short(),
                        vendor.name,
                        vendor.category,
                        status,
                        distance
                    ));
                }
            }
            View::Cart { lines, summary } => {
                out.push_str(&format!("── Cart ({} item(s)) ──\n", summary.count));
                for line in lines {
                    out.push_str(&format!("  {} x{}\n", line.product_id.short(), line.quantity));
                }
                out.push_str(&format!("  subtotal: {}\n", summary.subtotal));
            }
            View::Orders(orders) => {
                out.push_str(&format!("── Orders ({}) ──\n", orders.len()));
                for order in orders {
                    let when = order
                        .scheduled_for
                        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "asap".to_string());
                    out.push_str(&format!(
                        "  [{}] {} · {} item(s) · {}\n",
                        order.id.short(),
                        order.status,
                        order.items.len(),
                        when
                    ));
                }
            }
            View::Activity(entries) => {
                out.push_str("── Recent activity ──\n");
                for entry in entries {
                    out.push_str(&format!("  {} {}\n", entry.at.format("%H:%M:%S"), entry.message));
                }
            }
        }
        out
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn toast(&self, text: &str, duration: Duration) -> MarketResult<()> {
        market_debug!(Component::Presentation, "Toast for {:?}", duration);
        println!("💬 {text}");
        Ok(())
    }

    async fn platform_notify(&self, title: &str, body: &str) -> MarketResult<()> {
        if !self.platform_enabled {
            return Err(MarketError::not_permitted("platform notifications are disabled"));
        }
        println!("🔔 {title}\n   {body}");
        Ok(())
    }

    async fn render(&self, view: View) -> MarketResult<()> {
        print!("{}", Self::format_view(&view));
        Ok(())
    }
}
