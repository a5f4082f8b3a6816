//! Cart commands.
//!
//! Each command binds a mini cart to an in-memory page, runs one operation,
//! and prints the resulting snapshot. Notices go to the log.

use cruzy_cart::page::{MemoryPage, MemoryRegion};
use cruzy_cart::{CartApi, CartConfig, CartError, CartSync, HttpCartApi};
use cruzy_core::{CartSnapshot, LineKey, ProductId};

type MiniCart = CartSync<HttpCartApi, MemoryRegion>;

/// Bind a mini cart to a page holding the configured regions.
pub fn mini_cart(config: &CartConfig) -> Result<(MiniCart, MemoryPage), CartError> {
    let api = HttpCartApi::new(config)?;
    let page = MemoryPage::new()
        .with_region(&config.regions.badge)
        .with_region(&config.regions.panel);
    let cart = CartSync::attach(api, &page, cruzy_cart::notify::LogNotifier, &config.regions);
    Ok((cart, page))
}

/// Show the cart.
#[allow(clippy::print_stdout)]
pub async fn show(config: &CartConfig, html: bool) -> Result<(), CartError> {
    let (cart, page) = mini_cart(config)?;
    let snapshot = cart.refresh().await?;

    if html {
        println!("{}", page.html(&config.regions.panel).unwrap_or_default());
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

/// Print the item count.
#[allow(clippy::print_stdout)]
pub async fn count(config: &CartConfig) -> Result<(), CartError> {
    let count = HttpCartApi::new(config)?.count().await?;
    println!("{count}");
    Ok(())
}

pub async fn add(config: &CartConfig, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
    let (cart, _page) = mini_cart(config)?;
    print_snapshot(&cart.add(product_id, quantity).await?);
    Ok(())
}

pub async fn update(config: &CartConfig, line_key: &str, quantity: u32) -> Result<(), CartError> {
    let line_key = LineKey::parse(line_key)?;
    let (cart, _page) = mini_cart(config)?;
    print_snapshot(&cart.update(&line_key, quantity).await?);
    Ok(())
}

pub async fn remove(config: &CartConfig, line_key: &str) -> Result<(), CartError> {
    let line_key = LineKey::parse(line_key)?;
    let (cart, _page) = mini_cart(config)?;
    print_snapshot(&cart.remove(&line_key).await?);
    Ok(())
}

pub async fn clear(config: &CartConfig) -> Result<(), CartError> {
    let (cart, _page) = mini_cart(config)?;
    print_snapshot(&cart.clear().await?);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn print_snapshot(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in snapshot.items() {
        println!(
            "{:<12} {:<36} {:>3} x {:>10} {:>10}",
            line.line_key.as_str(),
            line.name,
            line.quantity,
            line.unit_price.display(),
            line.line_subtotal.display(),
        );
    }
    let label = if snapshot.item_count() == 1 { "item" } else { "items" };
    println!(
        "Total ({} {label}): {}",
        snapshot.item_count(),
        snapshot.total().display()
    );
}
