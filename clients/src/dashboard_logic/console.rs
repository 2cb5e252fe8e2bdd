//! Interactive console: prints notifications and view changes, reads user
//! commands from stdin.

use std::sync::Arc;

use lib_dashboard::core::{CommandGateway, Connector, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::dashboard_logic::catalog;
use crate::dashboard_logic::render;

const HELP: &str = "\
Commands:
  order <product> <price> <quantity>   submit an order
  random                               submit a random catalogue order
  reset                                reset the pipeline statistics
  stats                                show the full dashboard
  help                                 show this help
  quit                                 exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Order {
        product_name: String,
        price: f64,
        quantity: u32,
    },
    Random,
    Reset,
    Stats,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_lowercase().as_str() {
            "order" => {
                // Product names may contain spaces; price and quantity are the last two words.
                let [name @ .., price, quantity] = args.as_slice() else {
                    return Err("usage: order <product> <price> <quantity>".to_string());
                };
                if name.is_empty() {
                    return Err("usage: order <product> <price> <quantity>".to_string());
                }
                Command::Order {
                    product_name: name.join(" "),
                    price: price.parse().map_err(|_| format!("not a price: {price}"))?,
                    quantity: quantity.parse().map_err(|_| format!("not a quantity: {quantity}"))?,
                }
            }
            "random" => Command::Random,
            "reset" => Command::Reset,
            "stats" | "view" => Command::Stats,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(Some(command))
    }
}

/// Runs until `quit`, end of stdin, or a shutdown signal.
pub async fn run<C: Connector, G: CommandGateway>(
    session: Arc<SessionController<C, G>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut notes = session.notifications().subscribe();
    let mut revisions = session.watch_view();
    let mut connection = session.watch_connection();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    println!("{}", render::dashboard(&session.view()));

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            note = notes.recv() => match note {
                Ok(note) => println!("{}", render::notification(&note)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Console skipped {} notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render::summary(&session.view()));
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                println!("{}", render::connection(state));
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !execute(&session, &line).await {
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("stdin closed");
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            },
        }
    }
}

/// Returns false when the user asked to quit.
async fn execute<C: Connector, G: CommandGateway>(session: &SessionController<C, G>, line: &str) -> bool {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(usage) => {
            println!("{usage}");
            return true;
        }
    };

    // Outcomes are reported through the notification hub.
    match command {
        Command::Order {
            product_name,
            price,
            quantity,
        } => {
            let _ = session.submit_order(&product_name, price, quantity).await;
        }
        Command::Random => {
            let draft = catalog::random_order();
            println!("{} x{} at ${:.2}", draft.product_name, draft.quantity, draft.price);
            let _ = session.submit_order(&draft.product_name, draft.price, draft.quantity).await;
        }
        Command::Reset => {
            let _ = session.reset_statistics().await;
        }
        Command::Stats => println!("{}", render::dashboard(&session.view())),
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}
