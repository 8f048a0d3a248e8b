//! Load every listing, narrow it down and page through the result.
//!
//! Reads `RENTIFY_*` variables (or a `.env` file). Optional filters:
//! `browse_listings <property type> <bedrooms> <price range>`, for example
//! `browse_listings Apartment 2 "1000-2000"`.

use std::env;

use rentify::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let rentify = Rentify::from_env()?;
    let mut query = match rentify.listings().query().await {
        Ok(query) => query,
        Err(err) => {
            println!("{}", err.notice());
            return Err(err.into());
        }
    };
    println!("Loaded {} listings", query.records().len());

    let args: Vec<String> = env::args().skip(1).collect();
    let fields = [FilterField::PropertyType, FilterField::Bedrooms, FilterField::Price];
    for (field, value) in fields.iter().zip(args.iter()) {
        if let Err(err) = query.select(*field, value) {
            println!("Ignoring {:?} filter: {}", field, err);
        }
    }

    for page in 1..=query.total_pages().max(1) {
        query.go_to_page(page);
        println!("\n--- Page {} of {} ({}) ---", page, query.total_pages(), query.summary());
        for record in query.visible() {
            let card = ListingCard::from(record.clone());
            println!(
                "{:<32} {:>12}  {} bd  {}",
                card.address,
                card.price_label(),
                card.bedrooms,
                card.details_route()
            );
        }
    }

    if query.filtered_count() == 0 {
        println!("No properties match the current filters.");
    }
    Ok(())
}
