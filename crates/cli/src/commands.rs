//! Subcommand implementations.

use anyhow::Result;
use chrono::Local;
use std::path::Path;
use traccia_core::{Order, OrderFilter, OrderSignal, Status, StoreDb, reconcile};
use traccia_parse::{HtmlOrderParser, PageKind};

/// Build a fresh order row from an import signal.
fn order_from_signal(signal: &OrderSignal) -> Order {
    let today = Local::now().date_naive();
    let mut order = Order {
        order_date: signal.order_date.unwrap_or(today).format("%Y-%m-%d").to_string(),
        platform: signal.platform.clone(),
        seller: signal.seller.clone(),
        description: signal.description.clone(),
        quantity: signal.quantity.max(1),
        estimated_delivery: signal
            .estimated_delivery
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        alarm_enabled: true,
        tracking_number: signal.tracking_number.clone(),
        carrier: signal.carrier.clone(),
        last_mile_carrier: signal.last_mile_carrier.clone(),
        site_order_id: signal.site_order_id.clone(),
        notes: signal.note.clone(),
        ..Default::default()
    };
    order.set_status(signal.status.unwrap_or(Status::Pending));
    order
}

/// Parse an HTML file and fold its orders into the store.
pub async fn import(store: &StoreDb, path: &Path) -> Result<()> {
    let html = std::fs::read_to_string(path)?;
    let outcome = HtmlOrderParser::new().parse_with_meta(&html);
    tracing::info!(
        platform = outcome.platform.as_label(),
        page_kind = ?outcome.page_kind,
        orders = outcome.orders.len(),
        "page parsed"
    );

    println!("Piattaforma: {}", outcome.platform.as_label());

    if outcome.page_kind == PageKind::List {
        if let Some(warning) = outcome.warning {
            println!("\n{warning}");
        }
        return Ok(());
    }
    if outcome.orders.is_empty() {
        println!("Nessun ordine trovato nella pagina.");
        return Ok(());
    }

    let existing = store.list_orders(OrderFilter::all()).await?;
    let mut inserted = 0usize;
    let mut merged = 0usize;
    let mut unchanged = 0usize;

    for signal in &outcome.orders {
        match reconcile::find_duplicate(signal, &existing) {
            Some(duplicate) => match reconcile::merge_import(duplicate, signal) {
                Some(updated) => {
                    store.update_order(duplicate.id, &updated).await?;
                    merged += 1;
                    println!("~ aggiornato #{}: {}", duplicate.id, updated.description);
                }
                None => {
                    unchanged += 1;
                    println!("= invariato #{}: {}", duplicate.id, duplicate.description);
                }
            },
            None => {
                let order = order_from_signal(signal);
                let id = store.insert_order(&order).await?;
                inserted += 1;
                println!("+ nuovo #{id}: {}", order.description);
            }
        }
    }

    println!("\nImportazione completata: {inserted} nuovi, {merged} aggiornati, {unchanged} invariati.");
    Ok(())
}

/// Print tracked orders as a table.
pub async fn list(store: &StoreDb, all: bool, search: Option<String>, platform: Option<String>) -> Result<()> {
    let filter = OrderFilter { include_delivered: all, search, platform, ..Default::default() };
    let orders = store.list_orders(filter).await?;

    if orders.is_empty() {
        println!("Nessun ordine.");
        return Ok(());
    }

    println!("{:>4}  {:<12} {:<40} {:<18} {:<10} {}", "ID", "Piattaforma", "Descrizione", "Stato", "Consegna", "Tracking");
    for order in &orders {
        let description: String = if order.description.chars().count() > 40 {
            let truncated: String = order.description.chars().take(37).collect();
            format!("{truncated}...")
        } else {
            order.description.clone()
        };
        println!(
            "{:>4}  {:<12} {:<40} {:<18} {:<10} {}",
            order.id,
            order.platform,
            description,
            order.status.as_label(),
            order.estimated_delivery,
            order.tracking_number,
        );
    }
    println!("\n{} ordini.", orders.len());
    Ok(())
}

/// Print aggregate statistics.
pub async fn stats(store: &StoreDb) -> Result<()> {
    let stats = store.order_stats(Local::now().date_naive()).await?;

    println!("Totale ordini:    {}", stats.total);
    println!("Consegnati:       {} ({:.0}%)", stats.delivered, stats.delivery_rate());
    println!("In corso:         {}", stats.pending);
    println!("In ritardo:       {}", stats.overdue);
    println!("In arrivo oggi:   {}", stats.due_today);
    println!("In arrivo a breve: {}", stats.upcoming);

    if !stats.per_platform.is_empty() {
        println!("\nPer piattaforma:");
        for (platform, count) in &stats.per_platform {
            println!("  {platform:<16} {count}");
        }
    }
    Ok(())
}
