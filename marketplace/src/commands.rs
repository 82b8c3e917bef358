//! User intents and their text form
//!
//! The engine receives [`MarketCommand`]s on a channel. The console binary
//! builds them from lines such as `login Asha | 555 0101 | customer` with
//! [`parse_command`]; fields that may contain spaces are separated by `|`.
//! Entities are referred to by full id or any unique id prefix.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use shared::{Coordinate, NotificationMode, Role};

use crate::error::{MarketError, MarketResult};

/// Requested fulfilment time at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleRequest {
    At(DateTime<Utc>),
    In(Duration),
}

impl ScheduleRequest {
    /// Absolute time for the request. Fails when the delay runs past the calendar.
    pub fn resolve(self, now: DateTime<Utc>) -> MarketResult<DateTime<Utc>> {
        match self {
            ScheduleRequest::At(at) => Ok(at),
            ScheduleRequest::In(delay) => now
                .checked_add_signed(delay)
                .ok_or_else(|| MarketError::invalid_input("schedule", "requested time is too far in the future")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarketCommand {
    Login { name: String, phone: String, role: Role },
    Logout,
    CreateVendor { name: String, category: String, location: Option<Coordinate>, phone: Option<String> },
    /// Move the logged-in vendor operator's stall
    SetVendorLocation { location: Coordinate },
    SetVendorActive { vendor: String, active: bool },
    RemoveVendor { vendor: String },
    /// Add to the logged-in operator's catalog, or to `vendor` when given
    AddProduct { vendor: Option<String>, name: String, price: Option<Decimal>, description: Option<String> },
    RemoveProduct { product: String },
    Browse { category: Option<String>, radius_km: Option<f64> },
    AddToCart { product: String, quantity: u32 },
    RemoveFromCart { product: String },
    ClearCart,
    ShowCart,
    Checkout { schedule: Option<ScheduleRequest> },
    AcceptOrder { order: String },
    CompleteOrder { order: String },
    CancelOrder { order: String },
    ShowOrders,
    ToggleFavorite { vendor: String },
    ShowFavorites,
    ShowActivity,
    UpdateSettings { radius_km: Option<f64>, notification_mode: Option<NotificationMode> },
}

pub const HELP: &str = "\
login <name> | <phone> | customer|vendor    log in, registering on first use
logout
vendor <name> | <category> [| lat,lng]      open a new vendor stall
here <lat,lng>                              move your stall (vendor accounts)
open <vendor> / close <vendor>              toggle a stall
drop-vendor <vendor>                        remove a vendor and its products
product <name> | <price> [| description]    add to your catalog
unlist <product>                            remove a product
browse [category] [| radius km]             list vendors
add <product> [qty] / remove <product>      edit the cart
cart / clear                                show or empty the cart
checkout [in <minutes> | at <rfc3339>]      place orders, optionally scheduled
accept|complete|cancel <order>              move an order along
orders                                      list your orders
fav <vendor> / favs                         toggle and list favorites
activity                                    recent activity
radius <km> / notify popup|browser          settings
locate <lat,lng> / locate off               set or clear your device location
help / quit";

/// Parse one line of console input
pub fn parse_command(line: &str) -> MarketResult<MarketCommand> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let fields: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split('|').map(str::trim).collect()
    };

    let command = match verb.to_lowercase().as_str() {
        "login" => {
            let [name, phone, role] = exact::<3>(&fields, "login <name> | <phone> | <role>")?;
            MarketCommand::Login {
                name: name.to_string(),
                phone: phone.to_string(),
                role: role.parse()?,
            }
        }
        "logout" => MarketCommand::Logout,
        "vendor" => {
            if fields.len() < 2 || fields.len() > 3 {
                return Err(usage("vendor <name> | <category> [| lat,lng]"));
            }
            let location = fields.get(2).map(|raw| Coordinate::from_str(raw)).transpose()?;
            MarketCommand::CreateVendor {
                name: fields[0].to_string(),
                category: fields[1].to_string(),
                location,
                phone: None,
            }
        }
        "here" => MarketCommand::SetVendorLocation {
            location: Coordinate::from_str(required(rest, "here <lat,lng>")?)?,
        },
        "open" | "close" => MarketCommand::SetVendorActive {
            vendor: required(rest, "open|close <vendor>")?.to_string(),
            active: verb.eq_ignore_ascii_case("open"),
        },
        "drop-vendor" => MarketCommand::RemoveVendor {
            vendor: required(rest, "drop-vendor <vendor>")?.to_string(),
        },
        "product" => {
            if fields.len() < 2 || fields.len() > 3 {
                return Err(usage("product <name> | <price> [| description]"));
            }
            MarketCommand::AddProduct {
                vendor: None,
                name: fields[0].to_string(),
                price: parse_price(fields[1])?,
                description: fields.get(2).filter(|d| !d.is_empty()).map(|d| d.to_string()),
            }
        }
        "unlist" => MarketCommand::RemoveProduct {
            product: required(rest, "unlist <product>")?.to_string(),
        },
        "browse" => {
            let category = fields.first().filter(|c| !c.is_empty()).map(|c| c.to_string());
            let radius_km = fields.get(1).map(|raw| parse_km(raw)).transpose()?;
            MarketCommand::Browse { category, radius_km }
        }
        "add" => {
            let mut words = rest.split_whitespace();
            let product = words.next().ok_or_else(|| usage("add <product> [qty]"))?;
            let quantity = match words.next() {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| MarketError::invalid_input("quantity", format!("'{raw}' is not a whole number")))?,
                None => 1,
            };
            MarketCommand::AddToCart {
                product: product.to_string(),
                quantity,
            }
        }
        "remove" => MarketCommand::RemoveFromCart {
            product: required(rest, "remove <product>")?.to_string(),
        },
        "clear" => MarketCommand::ClearCart,
        "cart" => MarketCommand::ShowCart,
        "checkout" => MarketCommand::Checkout {
            schedule: parse_schedule(rest)?,
        },
        "accept" => MarketCommand::AcceptOrder {
            order: required(rest, "accept <order>")?.to_string(),
        },
        "complete" => MarketCommand::CompleteOrder {
            order: required(rest, "complete <order>")?.to_string(),
        },
        "cancel" => MarketCommand::CancelOrder {
            order: required(rest, "cancel <order>")?.to_string(),
        },
        "orders" => MarketCommand::ShowOrders,
        "fav" => MarketCommand::ToggleFavorite {
            vendor: required(rest, "fav <vendor>")?.to_string(),
        },
        "favs" => MarketCommand::ShowFavorites,
        "activity" => MarketCommand::ShowActivity,
        "radius" => MarketCommand::UpdateSettings {
            radius_km: Some(parse_km(required(rest, "radius <km>")?)?),
            notification_mode: None,
        },
        "notify" => MarketCommand::UpdateSettings {
            radius_km: None,
            notification_mode: Some(required(rest, "notify popup|browser")?.parse()?),
        },
        other => {
            return Err(MarketError::invalid_input("command", format!("unknown command '{other}', try 'help'")));
        }
    };
    Ok(command)
}

fn usage(form: &str) -> MarketError {
    MarketError::invalid_input("usage", form)
}

fn required<'a>(rest: &'a str, form: &str) -> MarketResult<&'a str> {
    if rest.is_empty() { Err(usage(form)) } else { Ok(rest) }
}

fn exact<'a, const N: usize>(fields: &[&'a str], form: &str) -> MarketResult<[&'a str; N]> {
    <[&str; N]>::try_from(fields).map_err(|_| usage(form))
}

fn parse_price(raw: &str) -> MarketResult<Option<Decimal>> {
    if raw.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(raw)
        .map(Some)
        .map_err(|_| MarketError::invalid_input("price", format!("'{raw}' is not a price")))
}

fn parse_km(raw: &str) -> MarketResult<f64> {
    raw.trim_end_matches("km")
        .trim()
        .parse()
        .map_err(|_| MarketError::invalid_input("radius", format!("'{raw}' is not a distance")))
}

fn parse_schedule(rest: &str) -> MarketResult<Option<ScheduleRequest>> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => Ok(None),
        (Some("in"), Some(minutes)) => {
            let minutes: i64 = minutes
                .trim_end_matches('m')
                .parse()
                .map_err(|_| MarketError::invalid_input("schedule", format!("'{minutes}' is not a number of minutes")))?;
            let delay = Duration::try_minutes(minutes)
                .ok_or_else(|| MarketError::invalid_input("schedule", format!("{minutes} minutes is out of range")))?;
            Ok(Some(ScheduleRequest::In(delay)))
        }
        (Some("at"), Some(when)) => DateTime::parse_from_rfc3339(when)
            .map(|at| Some(ScheduleRequest::At(at.with_timezone(&Utc))))
            .map_err(|_| MarketError::invalid_input("schedule", format!("'{when}' is not an RFC 3339 time"))),
        _ => Err(usage("checkout [in <minutes> | at <rfc3339>]")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_splits_on_pipes() {
        let command = parse_command("login Asha Rao | 555 0101 | Customer").unwrap();
        assert_eq!(
            command,
            MarketCommand::Login {
                name: "Asha Rao".into(),
                phone: "555 0101".into(),
                role: Role::Customer,
            }
        );
        assert!(parse_command("login Asha | 555").is_err());
    }

    #[test]
    fn vendor_with_location() {
        match parse_command("vendor Dosa Corner | food | 12.307,76.652").unwrap() {
            MarketCommand::CreateVendor { name, category, location, .. } => {
                assert_eq!(name, "Dosa Corner");
                assert_eq!(category, "food");
                assert_eq!(location, Some(Coordinate::new(12.307, 76.652).unwrap()));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_command("vendor Dosa | food | north").is_err());
    }

    #[test]
    fn product_price_is_optional_but_must_parse() {
        match parse_command("product Masala Dosa | 60.50 | crispy").unwrap() {
            MarketCommand::AddProduct { price, description, .. } => {
                assert_eq!(price, Some(Decimal::new(6050, 2)));
                assert_eq!(description.as_deref(), Some("crispy"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_command("product Water | ").unwrap(),
            MarketCommand::AddProduct { price: None, .. }
        ));
        assert!(parse_command("product Water | free").is_err());
    }

    #[test]
    fn cart_commands() {
        assert_eq!(
            parse_command("add 3fa2 4").unwrap(),
            MarketCommand::AddToCart { product: "3fa2".into(), quantity: 4 }
        );
        assert_eq!(
            parse_command("add 3fa2").unwrap(),
            MarketCommand::AddToCart { product: "3fa2".into(), quantity: 1 }
        );
        assert!(parse_command("add 3fa2 -1").is_err());
        assert_eq!(parse_command("CART").unwrap(), MarketCommand::ShowCart);
    }

    #[test]
    fn checkout_schedules() {
        assert_eq!(parse_command("checkout").unwrap(), MarketCommand::Checkout { schedule: None });
        assert_eq!(
            parse_command("checkout in 10m").unwrap(),
            MarketCommand::Checkout { schedule: Some(ScheduleRequest::In(Duration::minutes(10))) }
        );
        let at = "2026-10-19T18:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            parse_command("checkout at 2026-10-19T18:30:00Z").unwrap(),
            MarketCommand::Checkout { schedule: Some(ScheduleRequest::At(at)) }
        );
        assert!(parse_command("checkout tomorrow").is_err());
    }

    #[test]
    fn schedule_request_resolves_against_now() {
        let now = Utc::now();
        assert_eq!(ScheduleRequest::In(Duration::minutes(5)).resolve(now).unwrap(), now + Duration::minutes(5));
    }

    #[test]
    fn oversized_delays_are_rejected() {
        assert!(matches!(
            parse_command("checkout in 200000000000000"),
            Err(MarketError::InvalidInput { .. })
        ));

        let command = parse_command("checkout in 10000000000000").unwrap();
        let MarketCommand::Checkout { schedule: Some(request) } = command else {
            panic!("expected a scheduled checkout, got {command:?}");
        };
        assert!(matches!(request.resolve(Utc::now()), Err(MarketError::InvalidInput { .. })));
    }

    #[test]
    fn settings_commands() {
        assert_eq!(
            parse_command("radius 2.5km").unwrap(),
            MarketCommand::UpdateSettings { radius_km: Some(2.5), notification_mode: None }
        );
        assert_eq!(
            parse_command("notify browser").unwrap(),
            MarketCommand::UpdateSettings { radius_km: None, notification_mode: Some(NotificationMode::Browser) }
        );
    }

    #[test]
    fn browse_filters() {
        assert_eq!(
            parse_command("browse food | 2").unwrap(),
            MarketCommand::Browse { category: Some("food".into()), radius_km: Some(2.0) }
        );
        assert_eq!(parse_command("browse").unwrap(), MarketCommand::Browse { category: None, radius_km: None });
    }

    #[test]
    fn unknown_and_incomplete_commands_fail() {
        assert!(matches!(parse_command("dance"), Err(MarketError::InvalidInput { .. })));
        assert!(parse_command("accept").is_err());
    }
}
